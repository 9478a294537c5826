//! Basic shared types: errors, math re-exports, FBX time.

pub mod error;
pub mod math;
pub mod time;

pub use error::{Error, Result};
