//! Fixed-width big-endian integer codec.
//!
//! Every value in a `.bin` file is a 32-bit signed integer stored most significant byte
//! first, bit-for-bit identical to `java.io.DataOutput::writeInt`.  The helpers here are the
//! only place the byte order is decided.

use std::io::{ErrorKind, Read, Write};

use crate::error::{FeatbinError, Result};

/// Width in bytes of every encoded integer.
pub const INT_WIDTH: usize = 4;

/// Encodes `value` as four big-endian bytes.
#[must_use]
pub const fn encode_int(value: i32) -> [u8; INT_WIDTH] {
    value.to_be_bytes()
}

/// Decodes four big-endian bytes produced by [`encode_int`].
#[must_use]
pub const fn decode_int(bytes: [u8; INT_WIDTH]) -> i32 {
    i32::from_be_bytes(bytes)
}

/// Writes a single encoded integer to `writer`.
pub fn write_int<W: Write>(writer: &mut W, value: i32) -> std::io::Result<()> {
    writer.write_all(&encode_int(value))
}

/// Reads the next integer from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly on an integer boundary.  A stream that ends
/// part-way through an integer yields [`FeatbinError::Format`].
pub fn read_int<R: Read>(reader: &mut R) -> Result<Option<i32>> {
    let mut buf = [0u8; INT_WIDTH];
    let mut filled = 0;
    while filled < INT_WIDTH {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FeatbinError::io(err, None)),
        }
    }
    match filled {
        0 => Ok(None),
        INT_WIDTH => Ok(Some(decode_int(buf))),
        partial => Err(FeatbinError::Format(format!(
            "stream ended after {partial} of {INT_WIDTH} bytes of an integer"
        ))),
    }
}
