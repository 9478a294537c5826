//! Math type re-exports.
//!
//! FBX stores positions, matrices and angles in double precision, so the
//! crate works in `glam`'s `D*` types throughout and leaves narrowing to
//! the consumer.

pub use glam::{
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Double precision matrices
    DMat3, DMat4,
    // Quaternions
    DQuat,
    // Single precision, for consumers that downconvert
    Mat4, Vec2, Vec3, Vec4,
};
