//! The typed object graph.
//!
//! Objects are semantic overlays over `Objects/*` elements, identified
//! by 64-bit UID and stored in one arena in file order. Links between
//! objects are UIDs, resolved lazily through the scene's connection
//! list, which eliminates cyclic ownership (Skin-Geometry-Cluster forms
//! a cycle at the graph level).
//!
//! - [`geometry`] - triangulation, attribute layers, partitions
//! - [`skin`] - deformer clusters and re-indexing
//! - [`animation`] - curves and curve nodes
//! - [`transform`] - the Maya transform chain
//! - [`material`] - materials, textures, node attributes

pub mod animation;
pub mod geometry;
pub mod material;
pub(crate) mod properties;
pub mod skin;
pub mod transform;

pub use animation::{CurveData, CurveNodeData};
pub use geometry::{GeometryData, Partition, PartitionSpan, VertexMapping};
pub use material::{MaterialData, NodeAttributeData, TextureData};
pub use skin::ClusterData;
pub use transform::{NodeTransform, RotationOrder};

use crate::tree::Token;

/// Variant tag of an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Root,
    Geometry,
    Material,
    Mesh,
    Texture,
    LimbNode,
    NullNode,
    NodeAttribute,
    Cluster,
    Skin,
    AnimationStack,
    AnimationLayer,
    AnimationCurve,
    AnimationCurveNode,
}

impl ObjectKind {
    /// Whether objects of this kind participate in the transform
    /// hierarchy.
    pub fn is_node(self) -> bool {
        matches!(
            self,
            ObjectKind::Root | ObjectKind::Mesh | ObjectKind::LimbNode | ObjectKind::NullNode
        )
    }
}

/// Per-variant payload of an object.
#[derive(Debug, Clone)]
pub enum Payload {
    Root,
    Geometry(GeometryData),
    Material(MaterialData),
    Mesh,
    Texture(TextureData),
    LimbNode,
    NullNode,
    NodeAttribute(NodeAttributeData),
    Cluster(ClusterData),
    Skin,
    AnimationStack,
    AnimationLayer,
    AnimationCurve(CurveData),
    AnimationCurveNode(CurveNodeData),
}

/// One object of the scene graph: shared header plus variant payload.
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) uid: u64,
    pub(crate) name: Token,
    /// Index of the overlaid element among `Objects/*` children;
    /// `None` for the synthetic root.
    pub(crate) element_slot: Option<usize>,
    pub(crate) payload: Payload,
}

impl Object {
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn kind(&self) -> ObjectKind {
        match self.payload {
            Payload::Root => ObjectKind::Root,
            Payload::Geometry(_) => ObjectKind::Geometry,
            Payload::Material(_) => ObjectKind::Material,
            Payload::Mesh => ObjectKind::Mesh,
            Payload::Texture(_) => ObjectKind::Texture,
            Payload::LimbNode => ObjectKind::LimbNode,
            Payload::NullNode => ObjectKind::NullNode,
            Payload::NodeAttribute(_) => ObjectKind::NodeAttribute,
            Payload::Cluster(_) => ObjectKind::Cluster,
            Payload::Skin => ObjectKind::Skin,
            Payload::AnimationStack => ObjectKind::AnimationStack,
            Payload::AnimationLayer => ObjectKind::AnimationLayer,
            Payload::AnimationCurve(_) => ObjectKind::AnimationCurve,
            Payload::AnimationCurveNode(_) => ObjectKind::AnimationCurveNode,
        }
    }

    pub fn is_node(&self) -> bool {
        self.kind().is_node()
    }
}
