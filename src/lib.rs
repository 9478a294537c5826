//! # FBX
//!
//! In-memory loader for the FBX 3D interchange format: bytes in,
//! queryable scene out.
//!
//! The format is a hierarchical container of typed properties. Loading
//! tokenizes the buffer (binary or ASCII) into a raw element tree,
//! overlays typed objects keyed by 64-bit UID, resolves the directed
//! connections between them, assembles geometry (triangulation,
//! attribute layers, material partitions), re-indexes skin clusters onto
//! the emitted vertex stream, and exposes transform and animation
//! evaluation on demand.
//!
//! ## Modules
//!
//! - [`util`] - errors, math re-exports, FBX time
//! - [`tree`] - tokenizers and the raw element tree
//! - [`object`] - typed object payloads (geometry, skin, animation, ...)
//! - [`scene`] - the scene facade, object factory and navigation views
//!
//! ## Example
//!
//! ```ignore
//! use fbx::{load, LoadFlags};
//!
//! let data = std::fs::read("character.fbx")?;
//! let scene = load(&data, LoadFlags::TRIANGULATE)?;
//!
//! for mesh in scene.meshes() {
//!     let geometry = mesh.geometry().unwrap();
//!     println!("{}: {} vertices", mesh.name(), geometry.data().vertex_count());
//! }
//! ```
//!
//! Loading performs no I/O and is single-threaded and synchronous; a
//! loaded [`Scene`] has no interior mutability and may be shared across
//! threads read-only.

pub mod object;
pub mod scene;
pub mod tree;
pub mod util;

// Re-export the surface consumers hold.
pub use scene::{load, load_with, LoadFlags, Scene, SourceFormat};
pub use tree::{Decompress, Element, Property, Token, ZlibInflater};
pub use util::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::object::{Object, ObjectKind, RotationOrder};
    pub use crate::scene::{
        load, load_with, AnimationCurve, AnimationCurveNode, AnimationLayer, AnimationStack,
        Cluster, Connection, ConnectionKind, Geometry, GlobalSettings, LoadFlags, Material, Mesh,
        Node, Scene, Skin, SourceFormat, TakeInfo, Texture,
    };
    pub use crate::tree::{Decompress, Element, Property, PropertyKind, Token, ZlibInflater};
    pub use crate::util::{Error, Result};
}
