//! The raw element tree.
//!
//! Both tokenizers lift a byte buffer into the same shape: a tree of
//! [`Element`]s, each carrying an id, an ordered list of typed
//! [`Property`] values and an ordered list of children. Sibling order and
//! property order are significant throughout the format.
//!
//! - [`binary`] - binary tokenizer (both 32-bit and 64-bit framings)
//! - [`ascii`] - text recognizer producing the same element type
//! - [`decompress`] - zlib capability used for encoded arrays

pub mod ascii;
pub mod binary;
pub mod decompress;
mod token;

pub use decompress::{Decompress, ZlibInflater};
pub use token::Token;

use crate::util::{Error, Result};

/// Discriminant of a [`Property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    I16,
    Bool,
    I32,
    F32,
    F64,
    I64,
    String,
    Binary,
    BoolArray,
    I32Array,
    I64Array,
    F32Array,
    F64Array,
}

/// Coarse property classes for shape checks.
///
/// Element kinds promise property shapes (a connection row is
/// `string, int, int`); the class deliberately ignores width so that
/// ASCII files, which tokenize every integer as `i64`, pass the same
/// checks as binary ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropClass {
    Int,
    Real,
    Str,
    Bytes,
    Bool,
    IntArray,
    RealArray,
    BoolArray,
}

/// One typed value attached to an element.
///
/// Scalars are decoded eagerly; arrays are decoded (and inflated) at
/// tokenize time into natively typed vectors, so queries after `load`
/// never allocate.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    String(Token),
    Binary(Vec<u8>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::I16(_) => PropertyKind::I16,
            Property::Bool(_) => PropertyKind::Bool,
            Property::I32(_) => PropertyKind::I32,
            Property::F32(_) => PropertyKind::F32,
            Property::F64(_) => PropertyKind::F64,
            Property::I64(_) => PropertyKind::I64,
            Property::String(_) => PropertyKind::String,
            Property::Binary(_) => PropertyKind::Binary,
            Property::BoolArray(_) => PropertyKind::BoolArray,
            Property::I32Array(_) => PropertyKind::I32Array,
            Property::I64Array(_) => PropertyKind::I64Array,
            Property::F32Array(_) => PropertyKind::F32Array,
            Property::F64Array(_) => PropertyKind::F64Array,
        }
    }

    pub fn class(&self) -> PropClass {
        match self {
            Property::I16(_) | Property::I32(_) | Property::I64(_) => PropClass::Int,
            Property::F32(_) | Property::F64(_) => PropClass::Real,
            Property::Bool(_) => PropClass::Bool,
            Property::String(_) => PropClass::Str,
            Property::Binary(_) => PropClass::Bytes,
            Property::I32Array(_) | Property::I64Array(_) => PropClass::IntArray,
            Property::F32Array(_) | Property::F64Array(_) => PropClass::RealArray,
            Property::BoolArray(_) => PropClass::BoolArray,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind() {
            PropertyKind::I16 => "i16",
            PropertyKind::Bool => "bool",
            PropertyKind::I32 => "i32",
            PropertyKind::F32 => "f32",
            PropertyKind::F64 => "f64",
            PropertyKind::I64 => "i64",
            PropertyKind::String => "string",
            PropertyKind::Binary => "bytes",
            PropertyKind::BoolArray => "bool array",
            PropertyKind::I32Array => "i32 array",
            PropertyKind::I64Array => "i64 array",
            PropertyKind::F32Array => "f32 array",
            PropertyKind::F64Array => "f64 array",
        }
    }

    /// String token, if this is an `S` property.
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Property::String(t) => Some(t),
            _ => None,
        }
    }

    /// Element count of an array property.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Property::BoolArray(v) => Some(v.len()),
            Property::I32Array(v) => Some(v.len()),
            Property::I64Array(v) => Some(v.len()),
            Property::F32Array(v) => Some(v.len()),
            Property::F64Array(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Scalar as bool.
    pub fn to_bool(&self) -> Result<bool> {
        match *self {
            Property::Bool(v) => Ok(v),
            Property::I16(v) => Ok(v != 0),
            Property::I32(v) => Ok(v != 0),
            Property::I64(v) => Ok(v != 0),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Scalar as `i32`, with the permitted conversions (`i64` range-checked,
    /// floats truncated).
    pub fn to_i32(&self) -> Result<i32> {
        match *self {
            Property::I16(v) => Ok(i32::from(v)),
            Property::I32(v) => Ok(v),
            Property::I64(v) => i32::try_from(v)
                .map_err(|_| Error::overflow(format!("{v} does not fit in i32"))),
            Property::F32(v) => Ok(v as i32),
            Property::F64(v) => Ok(v as i32),
            _ => Err(self.mismatch("i32")),
        }
    }

    /// Scalar as `i64`.
    pub fn to_i64(&self) -> Result<i64> {
        match *self {
            Property::I16(v) => Ok(i64::from(v)),
            Property::I32(v) => Ok(i64::from(v)),
            Property::I64(v) => Ok(v),
            Property::F32(v) => Ok(v as i64),
            Property::F64(v) => Ok(v as i64),
            _ => Err(self.mismatch("i64")),
        }
    }

    /// Scalar as `f64`. Integers widen: ASCII files tokenize unmarked
    /// integral literals as integers even for double-valued fields.
    pub fn to_f64(&self) -> Result<f64> {
        match *self {
            Property::F32(v) => Ok(f64::from(v)),
            Property::F64(v) => Ok(v),
            Property::I16(v) => Ok(f64::from(v)),
            Property::I32(v) => Ok(f64::from(v)),
            Property::I64(v) => Ok(v as f64),
            _ => Err(self.mismatch("f64")),
        }
    }

    /// Array as `Vec<i32>`; `i64` elements are range-checked, float
    /// elements truncated.
    pub fn to_i32_array(&self) -> Result<Vec<i32>> {
        match self {
            Property::I32Array(v) => Ok(v.clone()),
            Property::I64Array(v) => v
                .iter()
                .map(|&x| {
                    i32::try_from(x)
                        .map_err(|_| Error::overflow(format!("{x} does not fit in i32")))
                })
                .collect(),
            Property::F32Array(v) => Ok(v.iter().map(|&x| x as i32).collect()),
            Property::F64Array(v) => Ok(v.iter().map(|&x| x as i32).collect()),
            _ => Err(self.mismatch("i32 array")),
        }
    }

    /// Array as `Vec<i64>`.
    pub fn to_i64_array(&self) -> Result<Vec<i64>> {
        match self {
            Property::I32Array(v) => Ok(v.iter().map(|&x| i64::from(x)).collect()),
            Property::I64Array(v) => Ok(v.clone()),
            Property::F32Array(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            Property::F64Array(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            _ => Err(self.mismatch("i64 array")),
        }
    }

    /// Array as `Vec<f64>`; `f32` and integer elements widen.
    pub fn to_f64_array(&self) -> Result<Vec<f64>> {
        match self {
            Property::F32Array(v) => Ok(v.iter().map(|&x| f64::from(x)).collect()),
            Property::F64Array(v) => Ok(v.clone()),
            Property::I32Array(v) => Ok(v.iter().map(|&x| f64::from(x)).collect()),
            Property::I64Array(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            _ => Err(self.mismatch("f64 array")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            actual: self.kind_name(),
        }
    }
}

/// One entry in the hierarchical document tree.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub(crate) id: Token,
    pub(crate) properties: Vec<Property>,
    pub(crate) children: Vec<Element>,
}

impl Element {
    pub fn id(&self) -> &Token {
        &self.id
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, idx: usize) -> Option<&Property> {
        self.properties.get(idx)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with the given id, linear over siblings.
    pub fn child(&self, id: &str) -> Option<&Element> {
        self.children.iter().find(|c| &c.id == id)
    }

    /// Nested child by dotted path (`"GlobalSettings.Properties70"`).
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut current = self;
        for part in path.split('.') {
            current = current.child(part)?;
        }
        Some(current)
    }

    /// Check the leading properties against an expected class sequence.
    pub fn has_shape(&self, shape: &[PropClass]) -> bool {
        self.properties.len() >= shape.len()
            && self
                .properties
                .iter()
                .zip(shape)
                .all(|(p, &class)| p.class() == class)
    }
}
