//! Error types for the FBX library.

use thiserror::Error;

/// Main error type for FBX operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer is neither binary FBX nor plausible ASCII text
    #[error("Invalid FBX file: bad magic and no ASCII fallback")]
    InvalidMagic,

    /// Buffer ended inside a structure
    #[error("Unexpected end of buffer at offset {0}")]
    UnexpectedEof(usize),

    /// Property tag byte is not one of the known variants
    #[error("Unknown property tag 0x{tag:02x} at offset {offset}")]
    UnknownPropertyTag { tag: u8, offset: usize },

    /// Offsets or counts inside the file contradict each other
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// ASCII recognizer could not make sense of the text
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Feature is recognised but not handled
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// DEFLATE stream was malformed or produced the wrong byte count
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// A post-tokenise consistency check failed
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// A narrowing conversion refused a value
    #[error("Numeric overflow: {0}")]
    Overflow(String),

    /// Property has the wrong type for the requested read
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invariant-violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Create a numeric overflow error.
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }
}

/// Result type alias for FBX operations.
pub type Result<T> = std::result::Result<T, Error>;
