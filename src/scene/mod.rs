//! The scene facade.
//!
//! [`load`] is the single entry point: bytes in, [`Scene`] out. The
//! scene owns the element tree, the object arena and the connection
//! list; everything is built during `load` and immutable afterwards, so
//! a loaded scene can be shared across threads read-only.

mod connections;
mod factory;
mod settings;
mod views;

pub use connections::{Connection, ConnectionKind};
pub use settings::{GlobalSettings, TakeInfo};
pub use views::{
    AnimationCurve, AnimationCurveNode, AnimationLayer, AnimationStack, Cluster, Geometry,
    Material, Mesh, Node, Skin, Texture,
};

use std::collections::HashMap;

use bitflags::bitflags;
use tracing::warn;

use crate::object::{Object, ObjectKind};
use crate::tree::{ascii, binary, Decompress, Element, ZlibInflater};
use crate::util::{Error, Result};

bitflags! {
    /// Load-time switches. `IGNORE_*` flags elide construction of the
    /// matching objects but leave their elements in the raw tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoadFlags: u32 {
        const TRIANGULATE = 1 << 0;
        const IGNORE_GEOMETRY = 1 << 1;
        const IGNORE_BLEND_SHAPES = 1 << 2;
        const IGNORE_CAMERAS = 1 << 3;
        const IGNORE_LIGHTS = 1 << 4;
        const IGNORE_TEXTURES = 1 << 5;
        const IGNORE_SKIN = 1 << 6;
        const IGNORE_BONES = 1 << 7;
        const IGNORE_PIVOTS = 1 << 8;
        const IGNORE_MATERIALS = 1 << 9;
        const IGNORE_POSES = 1 << 10;
        const IGNORE_VIDEOS = 1 << 11;
        const IGNORE_LIMBS = 1 << 12;
        const IGNORE_MESHES = 1 << 13;
        const IGNORE_ANIMATIONS = 1 << 14;
    }
}

impl Default for LoadFlags {
    fn default() -> Self {
        Self::TRIANGULATE
    }
}

/// Which tokenizer produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Binary,
    Ascii,
}

/// A fully loaded FBX document.
#[derive(Debug)]
pub struct Scene {
    version: u32,
    format: SourceFormat,
    flags: LoadFlags,
    root_element: Element,
    objects: Vec<Object>,
    by_uid: HashMap<u64, usize>,
    connections: Vec<Connection>,
    meshes: Vec<usize>,
    stacks: Vec<usize>,
    settings: GlobalSettings,
    takes: Vec<TakeInfo>,
}

/// Load a scene from a byte buffer with the default zlib decompressor.
pub fn load(data: &[u8], flags: LoadFlags) -> Result<Scene> {
    load_with(data, flags, &ZlibInflater)
}

/// Load a scene from a byte buffer with an injected decompressor.
///
/// The format is sniffed: buffers starting with the binary magic go to
/// the binary tokenizer, plausible text goes to the ASCII recognizer,
/// anything else fails with [`Error::InvalidMagic`]. Loading performs
/// no I/O and allocates everything up front; queries on the returned
/// scene allocate nothing.
pub fn load_with(data: &[u8], flags: LoadFlags, inflater: &dyn Decompress) -> Result<Scene> {
    let (root_element, version, format) = if binary::is_binary(data) {
        let (root, version) = binary::tokenize(data, inflater)?;
        (root, version, SourceFormat::Binary)
    } else if ascii::looks_like_text(data) {
        let (root, version) = ascii::tokenize(data)?;
        (root, version, SourceFormat::Ascii)
    } else {
        return Err(Error::InvalidMagic);
    };

    let connections = connections::parse_connections(&root_element)?;
    let arena = factory::build_objects(&root_element, &connections, flags);
    let settings = settings::parse_global_settings(&root_element);
    let takes = settings::parse_takes(&root_element);

    let scene = Scene {
        version,
        format,
        flags,
        root_element,
        objects: arena.objects,
        by_uid: arena.by_uid,
        connections,
        meshes: arena.meshes,
        stacks: arena.stacks,
        settings,
        takes,
    };
    scene.warn_on_multiple_parents();
    Ok(scene)
}

impl Scene {
    /// Root of the raw element tree.
    pub fn root_element(&self) -> &Element {
        &self.root_element
    }

    /// Header version (7400, 7500, ...).
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn source_format(&self) -> SourceFormat {
        self.format
    }

    pub fn flags(&self) -> LoadFlags {
        self.flags
    }

    /// All objects, file order, synthetic root last.
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Objects of one kind, file order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |o| o.kind() == kind)
    }

    pub fn object_by_uid(&self, uid: u64) -> Option<&Object> {
        self.by_uid.get(&uid).map(|&slot| &self.objects[slot])
    }

    /// The synthetic root object (uid 0).
    pub fn root(&self) -> Node<'_> {
        let object = self.object_by_uid(0).expect("scene always has a root");
        Node::new(self, object)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Mesh by index, file order.
    pub fn mesh(&self, index: usize) -> Option<Mesh<'_>> {
        self.meshes
            .get(index)
            .map(|&slot| Mesh::new(self, &self.objects[slot]))
    }

    pub fn meshes(&self) -> impl Iterator<Item = Mesh<'_>> {
        self.meshes
            .iter()
            .map(move |&slot| Mesh::new(self, &self.objects[slot]))
    }

    pub fn animation_stack_count(&self) -> usize {
        self.stacks.len()
    }

    /// Animation stack by index, file order.
    pub fn animation_stack(&self, index: usize) -> Option<AnimationStack<'_>> {
        self.stacks
            .get(index)
            .map(|&slot| AnimationStack::new(self, &self.objects[slot]))
    }

    pub fn animation_stacks(&self) -> impl Iterator<Item = AnimationStack<'_>> {
        self.stacks
            .iter()
            .map(move |&slot| AnimationStack::new(self, &self.objects[slot]))
    }

    /// Scene frame rate from `GlobalSettings.TimeMode`.
    pub fn frame_rate(&self) -> f32 {
        self.settings.frame_rate
    }

    pub fn global_settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn takes(&self) -> &[TakeInfo] {
        &self.takes
    }

    /// Take info by name.
    pub fn take_info(&self, name: &str) -> Option<&TakeInfo> {
        self.takes.iter().find(|t| t.name == *name)
    }

    /// All connections, file order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Objects linked *to* `uid`, file order.
    pub fn sources(&self, uid: u64) -> impl Iterator<Item = &Object> {
        self.connections.iter().filter_map(move |c| {
            if c.to != uid || c.from == 0 {
                return None;
            }
            self.object_by_uid(c.from)
        })
    }

    /// Objects linked *from* `uid`, file order.
    pub fn destinations(&self, uid: u64) -> impl Iterator<Item = &Object> {
        self.connections.iter().filter_map(move |c| {
            if c.from != uid {
                return None;
            }
            self.object_by_uid(c.to)
        })
    }

    /// `index`-th source of the given kind linked to `uid`, file order.
    pub fn source_of_kind(&self, uid: u64, kind: ObjectKind, index: usize) -> Option<&Object> {
        self.sources(uid).filter(|o| o.kind() == kind).nth(index)
    }

    /// First source of the given kind linked to `uid` under an OP
    /// connection naming `property`.
    pub fn source_by_property(&self, uid: u64, kind: ObjectKind, property: &str) -> Option<&Object> {
        self.connections.iter().find_map(|c| {
            if c.to != uid {
                return None;
            }
            if !c.property.as_ref().map_or(false, |p| p == &property) {
                return None;
            }
            let object = self.object_by_uid(c.from)?;
            (object.kind() == kind).then_some(object)
        })
    }

    /// The parent node of an object: the first connected destination
    /// participating in the transform hierarchy.
    pub fn parent_of(&self, uid: u64) -> Option<&Object> {
        if uid == 0 {
            return None;
        }
        self.connections.iter().find_map(|c| {
            if c.from != uid {
                return None;
            }
            let object = self.object_by_uid(c.to)?;
            object.is_node().then_some(object)
        })
    }

    /// The element an object overlays, for late property lookup.
    pub fn element_of(&self, object: &Object) -> Option<&Element> {
        let slot = object.element_slot?;
        self.root_element.child("Objects")?.children().get(slot)
    }

    /// Several nodes claiming the same child is a format violation; the
    /// first in file order wins, but it deserves a diagnostic.
    fn warn_on_multiple_parents(&self) {
        for object in &self.objects {
            if object.uid == 0 {
                continue;
            }
            let parents = self
                .connections
                .iter()
                .filter(|c| {
                    c.from == object.uid
                        && self.object_by_uid(c.to).is_some_and(|o| o.is_node())
                })
                .count();
            if parents > 1 {
                warn!(uid = object.uid, parents, "object has multiple node parents");
            }
        }
    }
}
