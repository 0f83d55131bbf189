use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes};

use crate::encoding::{self, DecodeContext, WireType};
use crate::error::DecodeErrorKind;
use crate::message::Message;
use crate::DecodeError;

/// Raw wire bytes for every field number a schema doesn't define, preserved
/// verbatim so encode(decode(bytes)) round-trips them bit-for-bit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnknownFieldSet {
    fields: BTreeMap<u32, Vec<UnknownField>>,
}

/// One occurrence of an unknown field, tagged by the wire type it arrived
/// with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownField {
    Varint(u64),
    SixtyFourBit(u64),
    LengthDelimited(Bytes),
    Group(UnknownFieldSet),
    ThirtyTwoBit(u32),
}

impl UnknownFieldSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &UnknownField)> {
        self.fields
            .iter()
            .flat_map(|(tag, values)| std::iter::repeat(*tag).zip(values))
    }

    /// Records one raw field occurrence, preserving the order fields of the
    /// same number arrived in.
    pub fn push(&mut self, tag: u32, field: UnknownField) {
        self.fields.entry(tag).or_default().push(field);
    }
}

impl Message for UnknownFieldSet {
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized,
    {
        for (tag, field) in self.iter() {
            match field {
                UnknownField::Varint(value) => {
                    encoding::encode_key(tag, WireType::Varint, buf);
                    encoding::encode_varint(*value, buf);
                }
                UnknownField::SixtyFourBit(value) => {
                    encoding::encode_key(tag, WireType::SixtyFourBit, buf);
                    buf.put_u64_le(*value);
                }
                UnknownField::LengthDelimited(value) => {
                    encoding::bytes::encode(tag, value, buf);
                }
                UnknownField::Group(value) => {
                    encoding::group::encode(tag, value, buf);
                }
                UnknownField::ThirtyTwoBit(value) => {
                    encoding::encode_key(tag, WireType::ThirtyTwoBit, buf);
                    buf.put_u32_le(*value);
                }
            }
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        let field = match wire_type {
            WireType::Varint => UnknownField::Varint(encoding::decode_varint(buf)?),
            WireType::SixtyFourBit => {
                if buf.remaining() < 8 {
                    return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
                }
                UnknownField::SixtyFourBit(buf.get_u64_le())
            }
            WireType::LengthDelimited => {
                let mut value = Bytes::new();
                encoding::bytes::merge(wire_type, &mut value, buf, ctx)?;
                UnknownField::LengthDelimited(value)
            }
            WireType::StartGroup => {
                let mut value = UnknownFieldSet::default();
                encoding::group::merge(tag, wire_type, &mut value, buf, ctx)?;
                UnknownField::Group(value)
            }
            WireType::EndGroup => {
                return Err(DecodeError::other("unexpected end group tag"));
            }
            WireType::ThirtyTwoBit => {
                if buf.remaining() < 4 {
                    return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
                }
                UnknownField::ThirtyTwoBit(buf.get_u32_le())
            }
        };

        self.push(tag, field);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.iter()
            .map(|(tag, field)| match field {
                UnknownField::Varint(value) => {
                    encoding::key_len(tag) + encoding::encoded_len_varint(*value)
                }
                UnknownField::SixtyFourBit(_) => encoding::key_len(tag) + 8,
                UnknownField::LengthDelimited(value) => encoding::bytes::encoded_len(tag, value),
                UnknownField::Group(value) => encoding::group::encoded_len(tag, value),
                UnknownField::ThirtyTwoBit(_) => encoding::key_len(tag) + 4,
            })
            .sum()
    }

    fn clear(&mut self) {
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unknown_fields() {
        let mut set = UnknownFieldSet::new();
        set.push(7, UnknownField::Varint(42));
        set.push(8, UnknownField::LengthDelimited(Bytes::from_static(b"hi")));

        let bytes = set.encode_to_vec();
        let mut decoded = UnknownFieldSet::new();
        decoded.merge(&bytes[..]).unwrap();
        assert_eq!(set, decoded);
    }
}
