//! Decompression capability for encoded array properties.
//!
//! Compressed FBX arrays are zlib streams that must expand to an exact,
//! known byte count. The trait is the injection seam; [`ZlibInflater`]
//! is the default implementation.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::util::{Error, Result};

/// Expands a DEFLATE/zlib block into a caller-provided buffer.
///
/// Implementations must fill `output` exactly: a stream that ends early
/// or carries trailing data is an error.
pub trait Decompress {
    fn inflate(&self, input: &[u8], output: &mut [u8]) -> Result<()>;
}

/// Default decompressor backed by `flate2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibInflater;

impl Decompress for ZlibInflater {
    fn inflate(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let mut decoder = ZlibDecoder::new(input);

        let mut written = 0;
        while written < output.len() {
            match decoder.read(&mut output[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) => return Err(Error::Decompress(e.to_string())),
            }
        }
        if written < output.len() {
            return Err(Error::Decompress(format!(
                "stream ended after {written} of {} bytes",
                output.len()
            )));
        }

        // The stream must be exhausted once the buffer is full.
        let mut probe = [0u8; 1];
        match decoder.read(&mut probe) {
            Ok(0) => Ok(()),
            Ok(_) => Err(Error::Decompress(
                "stream produced more bytes than declared".into(),
            )),
            Err(e) => Err(Error::Decompress(e.to_string())),
        }
    }
}
