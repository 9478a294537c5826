//! Material, texture and node-attribute payloads.

use crate::tree::{Element, Token};
use crate::util::math::DVec3;

use super::properties::vec3_property;

/// Surface material. FBX materials carry a large property bag; only the
/// diffuse color is lifted out, the rest stays reachable through the
/// element.
#[derive(Debug, Clone)]
pub struct MaterialData {
    pub diffuse_color: DVec3,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            diffuse_color: DVec3::ONE,
        }
    }
}

pub(crate) fn parse_material(element: &Element) -> MaterialData {
    MaterialData {
        diffuse_color: vec3_property(element, "DiffuseColor", DVec3::ONE),
    }
}

/// File reference of a texture.
#[derive(Debug, Clone, Default)]
pub struct TextureData {
    pub filename: Token,
    pub relative_filename: Token,
}

pub(crate) fn parse_texture(element: &Element) -> TextureData {
    let token_of = |id: &str| {
        element
            .child(id)
            .and_then(|el| el.property(0))
            .and_then(|p| p.as_token())
            .cloned()
            .unwrap_or_default()
    };
    TextureData {
        filename: token_of("FileName"),
        relative_filename: token_of("RelativeFilename"),
    }
}

/// Attribute payload of a `NodeAttribute` element; the `TypeFlags` token
/// says what the owning node is (`Skeleton`, `Camera`, `Light`, ...).
#[derive(Debug, Clone, Default)]
pub struct NodeAttributeData {
    pub type_flags: Token,
}

pub(crate) fn parse_node_attribute(element: &Element) -> NodeAttributeData {
    NodeAttributeData {
        type_flags: element
            .child("TypeFlags")
            .and_then(|el| el.property(0))
            .and_then(|p| p.as_token())
            .cloned()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Property;

    #[test]
    fn test_texture_filenames() {
        let element = Element {
            id: Token::new(b"Texture"),
            properties: Vec::new(),
            children: vec![Element {
                id: Token::new(b"FileName"),
                properties: vec![Property::String(Token::new(b"/tmp/checker.png"))],
                children: Vec::new(),
            }],
        };
        let data = parse_texture(&element);
        assert!(data.filename == "/tmp/checker.png");
        assert!(data.relative_filename.is_empty());
    }

    #[test]
    fn test_material_default_is_white() {
        let element = Element {
            id: Token::new(b"Material"),
            properties: Vec::new(),
            children: Vec::new(),
        };
        assert_eq!(parse_material(&element).diffuse_color, DVec3::ONE);
    }
}
