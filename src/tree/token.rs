//! Short byte strings from the tokenizers.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A byte string read out of an FBX document.
///
/// Tokens are not necessarily UTF-8 and may contain NUL bytes used as
/// internal separators (binary object names look like `Name\0\x01Class`).
/// The origin flag records whether the token came from the ASCII
/// recognizer, whose tokens may legally contain significant whitespace.
/// All comparisons are byte-wise.
#[derive(Clone, Default)]
pub struct Token {
    bytes: SmallVec<[u8; 24]>,
    from_ascii: bool,
}

impl Token {
    /// Token from binary-tokenizer bytes.
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
            from_ascii: false,
        }
    }

    /// Token from ASCII-recognizer bytes.
    pub fn ascii(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
            from_ascii: true,
        }
    }

    /// The empty token (the document root's id).
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the token came from the ASCII recognizer.
    #[inline]
    pub fn is_from_ascii(&self) -> bool {
        self.from_ascii
    }

    /// Lossy UTF-8 view.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// The object-name part of a name/class token.
    ///
    /// Binary files separate name and class with `\0\x01`
    /// (`"Cube\0\x01Model"`); ASCII files prefix the class
    /// (`"Model::Cube"`). Either way the name part is returned, with the
    /// origin flag preserved.
    pub fn name_part(&self) -> Token {
        let part = if self.from_ascii {
            match self
                .bytes
                .windows(2)
                .rposition(|w| w == b"::")
            {
                Some(pos) => &self.bytes[pos + 2..],
                None => &self.bytes[..],
            }
        } else {
            match self.bytes.windows(2).position(|w| w == b"\x00\x01") {
                Some(pos) => &self.bytes[..pos],
                None => &self.bytes[..],
            }
        };
        Token {
            bytes: SmallVec::from_slice(part),
            from_ascii: self.from_ascii,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialEq<[u8]> for Token {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for Token {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
