use bytes::{Buf, BufMut};

use crate::encoding::varint::{decode_varint, encode_varint, encoded_len_varint};
use crate::error::{overflow, DecodeError};

/// Encodes the length delimiter that precedes a length-delimited value.
pub fn encode_length_delimiter(length: usize, buf: &mut impl BufMut) {
    encode_varint(length as u64, buf)
}

/// Returns the width in bytes of the encoded length delimiter for `length`.
pub fn length_delimiter_len(length: usize) -> usize {
    encoded_len_varint(length as u64)
}

/// Decodes a length delimiter from the buffer, advancing it past the
/// delimiter. Fails with `Overflow` if the varint-encoded length does not
/// fit in a `usize` on this target.
pub fn decode_length_delimiter(mut buf: impl Buf) -> Result<usize, DecodeError> {
    let length = decode_varint(&mut buf)?;
    if length > usize::MAX as u64 {
        return Err(overflow());
    }
    Ok(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for len in [0usize, 1, 127, 128, 16384, 1_000_000] {
            let mut buf = Vec::new();
            encode_length_delimiter(len, &mut buf);
            assert_eq!(buf.len(), length_delimiter_len(len));
            assert_eq!(decode_length_delimiter(&buf[..]).unwrap(), len);
        }
    }
}
