//! Binary FBX tokenizer.
//!
//! Lifts the byte buffer into the element tree. Two framings exist,
//! selected by the header version: below 7500 the per-element
//! `end_offset / prop_count / prop_length` triplet is 32-bit and the
//! child-block sentinel is 13 zero bytes; from 7500 on the triplet is
//! 64-bit and the sentinel is 25 bytes. Every read of the triplet must
//! use the selected width, or a v7500+ file dereferences garbage offsets
//! immediately.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use super::decompress::Decompress;
use super::{Element, Property, Token};
use crate::util::{Error, Result};

/// Magic bytes at the start of every binary FBX file, NUL included.
pub const MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \x00";

/// Magic, two reserved bytes, little-endian u32 version.
pub const HEADER_LEN: usize = 27;

/// First version that uses 64-bit element framing.
const WIDE_FRAMING_VERSION: u32 = 7500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Narrow,
    Wide,
}

impl Framing {
    fn sentinel_len(self) -> usize {
        match self {
            // end_offset + prop_count + prop_length + id_len, all zero
            Framing::Narrow => 3 * 4 + 1,
            Framing::Wide => 3 * 8 + 1,
        }
    }

    fn other(self) -> Framing {
        match self {
            Framing::Narrow => Framing::Wide,
            Framing::Wide => Framing::Narrow,
        }
    }
}

/// Whether the buffer starts with the binary magic.
pub fn is_binary(data: &[u8]) -> bool {
    data.len() >= HEADER_LEN && &data[..MAGIC.len()] == MAGIC
}

/// Tokenize a binary buffer into the element tree, returning the root
/// element and the header version.
///
/// Some exporters stamp a 7500+ version while still writing 32-bit
/// frames. If the version-selected framing fails to parse, the other
/// framing is tried once; a success there is accepted with a warning.
pub fn tokenize(data: &[u8], inflater: &dyn Decompress) -> Result<(Element, u32)> {
    if !is_binary(data) {
        return Err(Error::InvalidMagic);
    }
    let version = LittleEndian::read_u32(&data[MAGIC.len() + 2..HEADER_LEN]);
    let primary = if version >= WIDE_FRAMING_VERSION {
        Framing::Wide
    } else {
        Framing::Narrow
    };

    match tokenize_with(data, primary, inflater) {
        Ok(root) => Ok((root, version)),
        Err(primary_err) => match tokenize_with(data, primary.other(), inflater) {
            Ok(root) => {
                warn!(
                    version,
                    "element framing disagrees with header version, accepting trial parse"
                );
                Ok((root, version))
            }
            Err(_) => Err(primary_err),
        },
    }
}

fn tokenize_with(data: &[u8], framing: Framing, inflater: &dyn Decompress) -> Result<Element> {
    let mut cursor = Cursor {
        data,
        pos: HEADER_LEN,
    };

    let mut root = Element::default();
    loop {
        if cursor.pos >= data.len() {
            break;
        }
        match read_element(&mut cursor, framing, inflater)? {
            Some(element) => root.children.push(element),
            // Null frame: top level ends here, footer bytes are ignored.
            None => break,
        }
    }
    Ok(root)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof(self.data.len()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// One field of the element frame triplet, at the framing's width.
    fn read_frame_field(&mut self, framing: Framing) -> Result<u64> {
        match framing {
            Framing::Narrow => Ok(u64::from(self.read_u32()?)),
            Framing::Wide => Ok(LittleEndian::read_u64(self.take(8)?)),
        }
    }
}

/// Read one element frame. `Ok(None)` is the null frame that terminates
/// a child list.
fn read_element(
    cursor: &mut Cursor<'_>,
    framing: Framing,
    inflater: &dyn Decompress,
) -> Result<Option<Element>> {
    let frame_start = cursor.pos;
    let end_offset = cursor.read_frame_field(framing)? as usize;
    if end_offset == 0 {
        return Ok(None);
    }
    let prop_count = cursor.read_frame_field(framing)? as usize;
    let prop_length = cursor.read_frame_field(framing)? as usize;

    if end_offset <= frame_start || end_offset > cursor.data.len() {
        return Err(Error::invalid(format!(
            "element at offset {frame_start} declares end offset {end_offset}"
        )));
    }

    let id_len = cursor.read_u8()? as usize;
    let id = Token::new(cursor.take(id_len)?);

    let props_start = cursor.pos;
    let mut properties = Vec::with_capacity(prop_count.min(64));
    for _ in 0..prop_count {
        properties.push(read_property(cursor, inflater)?);
    }
    if cursor.pos - props_start != prop_length {
        return Err(Error::invalid(format!(
            "element '{id}' declares {prop_length} property bytes but {} were parsed",
            cursor.pos - props_start
        )));
    }

    let mut children = Vec::new();
    if cursor.pos < end_offset {
        let limit = end_offset
            .checked_sub(framing.sentinel_len())
            .ok_or_else(|| Error::invalid(format!("element '{id}' too short for sentinel")))?;
        while cursor.pos < limit {
            match read_element(cursor, framing, inflater)? {
                Some(child) => children.push(child),
                None => break,
            }
        }
        if cursor.pos > end_offset {
            return Err(Error::invalid(format!(
                "children of '{id}' overran the element end offset"
            )));
        }
        // Consume the sentinel (or trailing pad) in one step.
        cursor.pos = end_offset;
    }

    Ok(Some(Element {
        id,
        properties,
        children,
    }))
}

fn read_property(cursor: &mut Cursor<'_>, inflater: &dyn Decompress) -> Result<Property> {
    let offset = cursor.pos;
    let tag = cursor.read_u8()?;
    match tag {
        b'Y' => Ok(Property::I16(cursor.read_i16()?)),
        b'C' => Ok(Property::Bool(cursor.read_u8()? & 1 != 0)),
        b'I' => Ok(Property::I32(cursor.read_i32()?)),
        b'F' => Ok(Property::F32(cursor.read_f32()?)),
        b'D' => Ok(Property::F64(cursor.read_f64()?)),
        b'L' => Ok(Property::I64(cursor.read_i64()?)),
        b'S' => {
            let len = cursor.read_u32()? as usize;
            Ok(Property::String(Token::new(cursor.take(len)?)))
        }
        b'R' => {
            let len = cursor.read_u32()? as usize;
            Ok(Property::Binary(cursor.take(len)?.to_vec()))
        }
        b'b' | b'i' | b'l' | b'f' | b'd' => read_array(tag, cursor, inflater),
        _ => Err(Error::UnknownPropertyTag { tag, offset }),
    }
}

fn read_array(tag: u8, cursor: &mut Cursor<'_>, inflater: &dyn Decompress) -> Result<Property> {
    let count = cursor.read_u32()? as usize;
    let encoding = cursor.read_u32()?;
    let packed_len = cursor.read_u32()? as usize;

    let elem_size = match tag {
        b'b' => 1,
        b'i' | b'f' => 4,
        b'l' | b'd' => 8,
        _ => unreachable!(),
    };
    let expected = count
        .checked_mul(elem_size)
        .ok_or_else(|| Error::invalid(format!("array count {count} overflows")))?;

    let payload = cursor.take(packed_len)?;
    let inflated;
    let bytes: &[u8] = match encoding {
        0 => {
            if packed_len != expected {
                return Err(Error::invalid(format!(
                    "raw array of {count} elements carries {packed_len} bytes, expected {expected}"
                )));
            }
            payload
        }
        1 => {
            let mut out = vec![0u8; expected];
            inflater.inflate(payload, &mut out)?;
            inflated = out;
            &inflated
        }
        other => return Err(Error::unsupported(format!("array encoding {other}"))),
    };

    Ok(match tag {
        b'b' => Property::BoolArray(bytes.iter().map(|&b| b != 0).collect()),
        b'i' => Property::I32Array(
            bytes
                .chunks_exact(4)
                .map(LittleEndian::read_i32)
                .collect(),
        ),
        b'l' => Property::I64Array(
            bytes
                .chunks_exact(8)
                .map(LittleEndian::read_i64)
                .collect(),
        ),
        b'f' => Property::F32Array(
            bytes
                .chunks_exact(4)
                .map(LittleEndian::read_f32)
                .collect(),
        ),
        b'd' => Property::F64Array(
            bytes
                .chunks_exact(8)
                .map(LittleEndian::read_f64)
                .collect(),
        ),
        _ => unreachable!(),
    })
}
