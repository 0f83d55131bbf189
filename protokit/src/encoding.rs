//! Per-wire-type encode/decode primitives.
//!
//! Every generated `encode_raw`/`merge_field`/`encoded_len` routine is built
//! entirely out of the functions in this module; nothing here is aware of
//! any particular schema.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes};

use crate::error::{overflow, DecodeError, DecodeErrorKind};
use crate::message::Message;

pub mod varint;
pub use varint::{
    decode_varint, encode_varint, encoded_len_varint, zigzag_decode32, zigzag_decode64,
    zigzag_encode32, zigzag_encode64,
};

pub mod length_delimiter;
pub use length_delimiter::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};

pub mod wire_type;
pub use wire_type::{check_wire_type, WireType};

/// Default recursion limit applied to nested message and group decoding.
pub const RECURSION_LIMIT: u32 = 100;

pub const MIN_TAG: u32 = 1;
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Carried through a decode call tree to enforce the recursion limit from
/// §4.2: group and nested-message skipping must be bounded by a configurable
/// depth.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext {
    recurse_count: u32,
}

impl Default for DecodeContext {
    fn default() -> Self {
        DecodeContext {
            recurse_count: RECURSION_LIMIT,
        }
    }
}

impl DecodeContext {
    pub fn with_recursion_limit(limit: u32) -> Self {
        DecodeContext {
            recurse_count: limit,
        }
    }

    /// Enter one more level of nesting, producing a context to be used by
    /// the callee. The caller continues to use its own (un-decremented)
    /// context at its own level.
    #[inline]
    pub fn enter_recursion(&self) -> DecodeContext {
        DecodeContext {
            recurse_count: self.recurse_count.saturating_sub(1),
        }
    }

    #[inline]
    pub fn limit_reached(&self) -> Result<(), DecodeError> {
        if self.recurse_count == 0 {
            Err(DecodeError::new(DecodeErrorKind::RecursionLimitExceeded))
        } else {
            Ok(())
        }
    }
}

/// Encodes a field key (tag + wire type) as a varint.
#[inline]
pub fn encode_key(tag: u32, wire_type: WireType, buf: &mut impl BufMut) {
    debug_assert!((MIN_TAG..=MAX_TAG).contains(&tag));
    let key = (tag << 3) | wire_type as u32;
    encode_varint(u64::from(key), buf);
}

/// Decodes a field key, validating that the field number is nonzero and
/// that the low three bits name a defined wire type.
#[inline]
pub fn decode_key(buf: &mut impl Buf) -> Result<(u32, WireType), DecodeError> {
    let key = decode_varint(buf)?;
    if key > u64::from(u32::MAX) {
        return Err(overflow());
    }
    let wire_type = WireType::try_from(key & 0x07)?;
    let tag = key as u32 >> 3;

    if tag < MIN_TAG || tag > MAX_TAG {
        return Err(DecodeError::new(DecodeErrorKind::InvalidFieldNumber));
    }

    Ok((tag, wire_type))
}

/// Returns the encoded width of a field key with the given tag.
#[inline]
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag << 3))
}

/// Reads a length-delimited run of values until the declared length is
/// exhausted, used to decode both packed repeated scalars and maps.
pub fn merge_loop<T, M, B>(
    value: &mut T,
    buf: &mut B,
    ctx: DecodeContext,
    mut merge: M,
) -> Result<(), DecodeError>
where
    M: FnMut(&mut T, &mut B, DecodeContext) -> Result<(), DecodeError>,
    B: Buf,
{
    let len = decode_varint(buf)?;
    let remaining = buf.remaining();
    if len > remaining as u64 {
        return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
    }

    let limit = remaining - len as usize;
    while buf.remaining() > limit {
        merge(value, buf, ctx)?;
    }

    if buf.remaining() != limit {
        return Err(DecodeError::other("delimited length exceeded"));
    }
    Ok(())
}

/// Skips a field's value without interpreting it, recursively consuming
/// nested groups so that the matching end-group tag is found.
pub fn skip_field(
    wire_type: WireType,
    tag: u32,
    buf: &mut impl Buf,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    ctx.limit_reached()?;
    let len = match wire_type {
        WireType::Varint => decode_varint(buf).map(|_| 0)?,
        WireType::ThirtyTwoBit => 4,
        WireType::SixtyFourBit => 8,
        WireType::LengthDelimited => decode_varint(buf)?,
        WireType::StartGroup => loop {
            let (inner_tag, inner_wire_type) = decode_key(buf)?;
            match inner_wire_type {
                WireType::EndGroup => {
                    if inner_tag != tag {
                        return Err(DecodeError::other("unexpected end group tag"));
                    }
                    break 0;
                }
                _ => skip_field(inner_wire_type, inner_tag, buf, ctx.enter_recursion())?,
            }
        },
        WireType::EndGroup => return Err(DecodeError::other("unexpected end group tag")),
    };

    if len > buf.remaining() as u64 {
        return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
    }

    buf.advance(len as usize);
    Ok(())
}

macro_rules! encode_repeated {
    ($ty:ty) => {
        pub fn encode_repeated(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
            for value in values {
                encode(tag, value, buf);
            }
        }
    };
}

macro_rules! merge_repeated_numeric {
    ($ty:ty, $wire_type:expr, $merge:ident, $merge_repeated:ident) => {
        pub fn $merge_repeated(
            wire_type: WireType,
            values: &mut Vec<$ty>,
            buf: &mut impl Buf,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            if wire_type == WireType::LengthDelimited {
                // Packed: readers accept packed encodings regardless of the
                // field's declared packing, and concatenate multiple packed
                // chunks for the same field number.
                merge_loop(values, buf, ctx, |values, buf, ctx| {
                    let mut value = Default::default();
                    $merge($wire_type, &mut value, buf, ctx)?;
                    values.push(value);
                    Ok(())
                })
            } else {
                // Unpacked: one tagged record per element.
                check_wire_type($wire_type, wire_type)?;
                let mut value = Default::default();
                $merge(wire_type, &mut value, buf, ctx)?;
                values.push(value);
                Ok(())
            }
        }
    };
}

/// Emits a module of encode/merge/encoded_len functions for a variable-width
/// numeric scalar (the varint-framed proto types).
macro_rules! varint {
    ($ty:ty, $proto_ty:ident) => (
        varint!($ty, $proto_ty,
                to_uint64(value) { *value as u64 },
                from_uint64(value) { value as $ty });
    );

    ($ty:ty, $proto_ty:ident,
     to_uint64($to_uint64_value:ident) $to_uint64:expr,
     from_uint64($from_uint64_value:ident) $from_uint64:expr) => (
        pub mod $proto_ty {
            use super::*;

            pub fn encode(tag: u32, $to_uint64_value: &$ty, buf: &mut impl BufMut) {
                encode_key(tag, WireType::Varint, buf);
                encode_varint($to_uint64, buf);
            }

            pub fn merge(wire_type: WireType, value: &mut $ty, buf: &mut impl Buf, _ctx: DecodeContext) -> Result<(), DecodeError> {
                check_wire_type(WireType::Varint, wire_type)?;
                let $from_uint64_value = decode_varint(buf)?;
                *value = $from_uint64;
                Ok(())
            }

            encode_repeated!($ty);

            pub fn encode_packed(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
                if values.is_empty() { return; }
                encode_key(tag, WireType::LengthDelimited, buf);
                let len: usize = values.iter().map(|$to_uint64_value| encoded_len_varint($to_uint64)).sum();
                encode_varint(len as u64, buf);
                for $to_uint64_value in values {
                    encode_varint($to_uint64, buf);
                }
            }

            merge_repeated_numeric!($ty, WireType::Varint, merge, merge_repeated);

            #[inline]
            pub fn encoded_len(tag: u32, $to_uint64_value: &$ty) -> usize {
                key_len(tag) + encoded_len_varint($to_uint64)
            }

            #[inline]
            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> usize {
                key_len(tag) * values.len() + values.iter().map(|$to_uint64_value| encoded_len_varint($to_uint64)).sum::<usize>()
            }

            #[inline]
            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> usize {
                if values.is_empty() {
                    0
                } else {
                    let len = values.iter().map(|$to_uint64_value| encoded_len_varint($to_uint64)).sum::<usize>();
                    key_len(tag) + encoded_len_varint(len as u64) + len
                }
            }
        }
    );
}

varint!(bool, bool,
        to_uint64(value) u64::from(*value),
        from_uint64(value) value != 0);
varint!(i32, int32);
varint!(i64, int64);
varint!(u32, uint32);
varint!(u64, uint64);
varint!(i32, enumeration,
        to_uint64(value) *value as u64,
        from_uint64(value) value as i32);
varint!(i32, sint32,
        to_uint64(value) u64::from(zigzag_encode32(*value)),
        from_uint64(value) zigzag_decode32(value as u32));
varint!(i64, sint64,
        to_uint64(value) zigzag_encode64(*value),
        from_uint64(value) zigzag_decode64(value));

/// Emits a module of encode/merge/encoded_len functions for a fixed-width
/// numeric scalar.
macro_rules! fixed_width {
    ($ty:ty, $width:expr, $wire_type:expr, $proto_ty:ident, $put:ident, $get:ident) => (
        pub mod $proto_ty {
            use super::*;

            pub fn encode(tag: u32, value: &$ty, buf: &mut impl BufMut) {
                encode_key(tag, $wire_type, buf);
                buf.$put(*value);
            }

            pub fn merge(wire_type: WireType, value: &mut $ty, buf: &mut impl Buf, _ctx: DecodeContext) -> Result<(), DecodeError> {
                check_wire_type($wire_type, wire_type)?;
                if buf.remaining() < $width {
                    return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
                }
                *value = buf.$get();
                Ok(())
            }

            encode_repeated!($ty);

            pub fn encode_packed(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
                if values.is_empty() { return; }
                encode_key(tag, WireType::LengthDelimited, buf);
                encode_varint(($width * values.len()) as u64, buf);
                for value in values {
                    buf.$put(*value);
                }
            }

            pub fn merge_repeated(wire_type: WireType, values: &mut Vec<$ty>, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
                if wire_type == WireType::LengthDelimited {
                    merge_loop(values, buf, ctx, |values, buf, ctx| {
                        let mut value = Default::default();
                        merge($wire_type, &mut value, buf, ctx)?;
                        values.push(value);
                        Ok(())
                    })
                } else {
                    check_wire_type($wire_type, wire_type)?;
                    let mut value = Default::default();
                    merge(wire_type, &mut value, buf, ctx)?;
                    values.push(value);
                    Ok(())
                }
            }

            #[inline]
            pub fn encoded_len(tag: u32, _value: &$ty) -> usize {
                key_len(tag) + $width
            }

            #[inline]
            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> usize {
                (key_len(tag) + $width) * values.len()
            }

            #[inline]
            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> usize {
                if values.is_empty() {
                    0
                } else {
                    let len = $width * values.len();
                    key_len(tag) + encoded_len_varint(len as u64) + len
                }
            }
        }
    );
}

fixed_width!(f32, 4, WireType::ThirtyTwoBit, float, put_f32_le, get_f32_le);
fixed_width!(f64, 8, WireType::SixtyFourBit, double, put_f64_le, get_f64_le);
fixed_width!(u32, 4, WireType::ThirtyTwoBit, fixed32, put_u32_le, get_u32_le);
fixed_width!(u64, 8, WireType::SixtyFourBit, fixed64, put_u64_le, get_u64_le);
fixed_width!(i32, 4, WireType::ThirtyTwoBit, sfixed32, put_i32_le, get_i32_le);
fixed_width!(i64, 8, WireType::SixtyFourBit, sfixed64, put_i64_le, get_i64_le);

/// `string` and `bytes` share length-delimited framing; `string` additionally
/// validates UTF-8 on decode.
pub mod string {
    use super::*;

    pub fn encode(tag: u32, value: &str, buf: &mut impl BufMut) {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(value.len() as u64, buf);
        buf.put_slice(value.as_bytes());
    }

    pub fn merge(
        wire_type: WireType,
        value: &mut String,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut bytes = Vec::new();
        super::bytes::merge_vec(wire_type, &mut bytes, buf, ctx)?;
        *value = String::from_utf8(bytes).map_err(|_| DecodeError::new(DecodeErrorKind::InvalidUtf8))?;
        Ok(())
    }

    pub fn encode_repeated(tag: u32, values: &[String], buf: &mut impl BufMut) {
        for value in values {
            encode(tag, value, buf);
        }
    }

    pub fn merge_repeated(
        wire_type: WireType,
        values: &mut Vec<String>,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut value = String::new();
        merge(wire_type, &mut value, buf, ctx)?;
        values.push(value);
        Ok(())
    }

    #[inline]
    pub fn encoded_len(tag: u32, value: &str) -> usize {
        key_len(tag) + encoded_len_varint(value.len() as u64) + value.len()
    }

    #[inline]
    pub fn encoded_len_repeated(tag: u32, values: &[String]) -> usize {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

pub mod bytes {
    use super::*;

    pub fn encode(tag: u32, value: &[u8], buf: &mut impl BufMut) {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(value.len() as u64, buf);
        buf.put_slice(value);
    }

    pub(super) fn merge_vec(
        wire_type: WireType,
        value: &mut Vec<u8>,
        buf: &mut impl Buf,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        let len = decode_varint(buf)?;
        if len > buf.remaining() as u64 {
            return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
        }
        value.clear();
        value.extend_from_slice(&buf.copy_to_bytes(len as usize));
        Ok(())
    }

    pub fn merge(
        wire_type: WireType,
        value: &mut Bytes,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut vec = Vec::new();
        merge_vec(wire_type, &mut vec, buf, ctx)?;
        *value = Bytes::from(vec);
        Ok(())
    }

    pub fn encode_repeated(tag: u32, values: &[Vec<u8>], buf: &mut impl BufMut) {
        for value in values {
            encode(tag, value, buf);
        }
    }

    pub fn merge_repeated(
        wire_type: WireType,
        values: &mut Vec<Vec<u8>>,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut value = Vec::new();
        merge_vec(wire_type, &mut value, buf, ctx)?;
        values.push(value);
        Ok(())
    }

    #[inline]
    pub fn encoded_len(tag: u32, value: &[u8]) -> usize {
        key_len(tag) + encoded_len_varint(value.len() as u64) + value.len()
    }

    #[inline]
    pub fn encoded_len_repeated(tag: u32, values: &[Vec<u8>]) -> usize {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

/// Nested-message framing. Encoding a submessage is a strict two-pass
/// protocol: compute `size()` first, write the length prefix, then write the
/// body — the body must be exactly `size()` bytes or the prefix lies.
pub mod message {
    use super::*;

    pub fn encode<M>(tag: u32, msg: &M, buf: &mut impl BufMut)
    where
        M: Message,
    {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(msg.encoded_len() as u64, buf);
        msg.encode_raw(buf);
    }

    pub fn merge<M, B>(
        wire_type: WireType,
        msg: &mut M,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        M: Message,
        B: Buf,
    {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        ctx.limit_reached()?;
        let len = decode_varint(buf)?;
        if len > buf.remaining() as u64 {
            return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
        }
        let remaining = buf.remaining() - len as usize;
        let inner_ctx = ctx.enter_recursion();
        while buf.remaining() > remaining {
            let (tag, wire_type) = decode_key(buf)?;
            msg.merge_field(tag, wire_type, buf, inner_ctx)?;
        }
        if buf.remaining() != remaining {
            return Err(DecodeError::other("delimited length exceeded"));
        }
        Ok(())
    }

    pub fn encode_repeated<M>(tag: u32, messages: &[M], buf: &mut impl BufMut)
    where
        M: Message,
    {
        for msg in messages {
            encode(tag, msg, buf);
        }
    }

    pub fn merge_repeated<M, B>(
        wire_type: WireType,
        messages: &mut Vec<M>,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        M: Message + Default,
        B: Buf,
    {
        let mut msg = M::default();
        merge(wire_type, &mut msg, buf, ctx)?;
        messages.push(msg);
        Ok(())
    }

    #[inline]
    pub fn encoded_len<M>(tag: u32, msg: &M) -> usize
    where
        M: Message,
    {
        let len = msg.encoded_len();
        key_len(tag) + encoded_len_varint(len as u64) + len
    }

    #[inline]
    pub fn encoded_len_repeated<M>(tag: u32, messages: &[M]) -> usize
    where
        M: Message,
    {
        messages.iter().map(|m| encoded_len(tag, m)).sum()
    }
}

/// Deprecated proto2 group framing (wire types 3/4). Decoders must still
/// recognize and skip groups for round-tripping unknown fields.
pub mod group {
    use super::*;

    pub fn encode<M>(tag: u32, msg: &M, buf: &mut impl BufMut)
    where
        M: Message,
    {
        encode_key(tag, WireType::StartGroup, buf);
        msg.encode_raw(buf);
        encode_key(tag, WireType::EndGroup, buf);
    }

    pub fn merge<M>(
        tag: u32,
        wire_type: WireType,
        msg: &mut M,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        M: Message,
    {
        check_wire_type(WireType::StartGroup, wire_type)?;
        ctx.limit_reached()?;
        let inner_ctx = ctx.enter_recursion();
        loop {
            let (inner_tag, inner_wire_type) = decode_key(buf)?;
            if inner_wire_type == WireType::EndGroup {
                if inner_tag != tag {
                    return Err(DecodeError::other("unexpected end group tag"));
                }
                return Ok(());
            }
            msg.merge_field(inner_tag, inner_wire_type, buf, inner_ctx)?;
        }
    }

    pub fn encode_repeated<M>(tag: u32, messages: &[M], buf: &mut impl BufMut)
    where
        M: Message,
    {
        for msg in messages {
            encode(tag, msg, buf);
        }
    }

    #[inline]
    pub fn encoded_len<M>(tag: u32, msg: &M) -> usize
    where
        M: Message,
    {
        2 * key_len(tag) + msg.encoded_len()
    }
}

/// Map fields are sugar for a repeated two-field submessage `(key, value)`.
pub mod map {
    use super::*;

    pub fn encode<K, V, B, KE, KL, VE, VL>(
        key_encode: KE,
        key_encoded_len: KL,
        val_encode: VE,
        val_encoded_len: VL,
        tag: u32,
        values: &BTreeMap<K, V>,
        buf: &mut B,
    ) where
        K: Default + Eq + Ord,
        B: BufMut,
        KE: Fn(u32, &K, &mut B),
        KL: Fn(u32, &K) -> usize,
        VE: Fn(u32, &V, &mut B),
        VL: Fn(u32, &V) -> usize,
    {
        for (key, val) in values.iter() {
            let skip_key = key_encoded_len(1, key);
            let skip_val = val_encoded_len(2, val);
            encode_key(tag, WireType::LengthDelimited, buf);
            encode_varint((skip_key + skip_val) as u64, buf);
            key_encode(1, key, buf);
            val_encode(2, val, buf);
        }
    }

    pub fn merge<K, V, B, KM, VM>(
        key_merge: KM,
        val_merge: VM,
        values: &mut BTreeMap<K, V>,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        K: Default + Eq + Ord,
        V: Default,
        B: Buf,
        KM: Fn(WireType, &mut K, &mut B, DecodeContext) -> Result<(), DecodeError>,
        VM: Fn(WireType, &mut V, &mut B, DecodeContext) -> Result<(), DecodeError>,
    {
        let mut key = K::default();
        let mut val = V::default();
        ctx.limit_reached()?;
        let inner_ctx = ctx.enter_recursion();

        let len = decode_varint(buf)?;
        if len > buf.remaining() as u64 {
            return Err(DecodeError::new(DecodeErrorKind::EndOfStream));
        }
        let remaining = buf.remaining() - len as usize;
        while buf.remaining() > remaining {
            let (entry_tag, wire_type) = decode_key(buf)?;
            match entry_tag {
                1 => key_merge(wire_type, &mut key, buf, inner_ctx)?,
                2 => val_merge(wire_type, &mut val, buf, inner_ctx)?,
                _ => skip_field(wire_type, entry_tag, buf, inner_ctx)?,
            }
        }
        if buf.remaining() != remaining {
            return Err(DecodeError::other("delimited length exceeded"));
        }
        // Last value per key wins.
        values.insert(key, val);
        Ok(())
    }

    pub fn encoded_len<K, V, KL, VL>(
        key_encoded_len: KL,
        val_encoded_len: VL,
        tag: u32,
        values: &BTreeMap<K, V>,
    ) -> usize
    where
        K: Default + Eq + Ord,
        KL: Fn(u32, &K) -> usize,
        VL: Fn(u32, &V) -> usize,
    {
        key_len(tag) * values.len()
            + values
                .iter()
                .map(|(key, val)| {
                    let len = key_encoded_len(1, key) + val_encoded_len(2, val);
                    encoded_len_varint(len as u64) + len
                })
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_plus_varint() {
        let mut buf = Vec::new();
        int32::encode(1, &150, &mut buf);
        assert_eq!(buf, vec![0x08, 0x96, 0x01]);
    }

    #[test]
    fn tag_plus_length_plus_string() {
        let mut buf = Vec::new();
        string::encode(2, "testing", &mut buf);
        assert_eq!(
            buf,
            vec![0x12, 0x07, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6e, 0x67]
        );
    }

    #[test]
    fn negative_int32_is_always_ten_bytes() {
        let mut buf = Vec::new();
        int32::encode(1, &-1, &mut buf);
        // Key (1 byte) + 10-byte sign-extended varint.
        assert_eq!(buf.len(), 11);
    }

    #[test]
    fn fixed32_and_fixed64_examples() {
        let mut buf = Vec::new();
        buf.put_u32_le(0xdeadbeefu32);
        assert_eq!(buf, vec![0xef, 0xbe, 0xad, 0xde]);

        let mut buf = Vec::new();
        buf.put_u64_le(0x0102030405060708u64);
        assert_eq!(buf, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn reserved_wire_types_are_rejected() {
        let mut buf: &[u8] = &[0x0F]; // tag 1, wire type 7
        assert!(decode_key(&mut buf).is_err());
    }

    #[test]
    fn field_number_zero_is_rejected() {
        let mut buf: &[u8] = &[0x00]; // tag 0, wire type 0
        assert!(decode_key(&mut buf).is_err());
    }

    #[test]
    fn max_field_number_round_trips() {
        let tag = MAX_TAG;
        let mut buf = Vec::new();
        encode_key(tag, WireType::Varint, &mut buf);
        let mut slice = buf.as_slice();
        let (decoded_tag, wire_type) = decode_key(&mut slice).unwrap();
        assert_eq!(decoded_tag, tag);
        assert_eq!(wire_type, WireType::Varint);
    }

    #[test]
    fn packed_and_unpacked_repeated_concatenate() {
        // Three unpacked int32 values for field 1, then one packed chunk.
        let mut buf = Vec::new();
        int32::encode(1, &1, &mut buf);
        int32::encode(1, &2, &mut buf);
        int32::encode(1, &3, &mut buf);
        int32::encode_packed(1, &[4, 5], &mut buf);

        let mut values = Vec::new();
        let mut slice = buf.as_slice();
        let ctx = DecodeContext::default();
        while slice.has_remaining() {
            let (tag, wire_type) = decode_key(&mut slice).unwrap();
            assert_eq!(tag, 1);
            int32::merge_repeated(wire_type, &mut values, &mut slice, ctx).unwrap();
        }
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn bool_decode_treats_any_nonzero_varint_as_true() {
        let mut buf: &[u8] = &[0xAC, 0x02]; // varint 300
        let mut value = false;
        bool::merge(WireType::Varint, &mut value, &mut buf, DecodeContext::default()).unwrap();
        assert!(value);
    }

    #[test]
    fn string_field_rejects_invalid_utf8() {
        let mut body = Vec::new();
        body.put_u8(0x80);
        body.put_u8(0xFF);
        let mut buf = Vec::new();
        encode_key(1, WireType::LengthDelimited, &mut buf);
        encode_varint(body.len() as u64, &mut buf);
        buf.extend_from_slice(&body);

        let mut slice = buf.as_slice();
        let (_, wire_type) = decode_key(&mut slice).unwrap();
        let mut value = String::new();
        let err = string::merge(wire_type, &mut value, &mut slice, DecodeContext::default())
            .unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::InvalidUtf8));
    }

    #[test]
    fn bytes_field_accepts_invalid_utf8() {
        let mut buf = Vec::new();
        bytes::encode(1, &[0x80, 0xFF], &mut buf);
        let mut slice = buf.as_slice();
        let (_, wire_type) = decode_key(&mut slice).unwrap();
        let mut value = Bytes::new();
        bytes::merge(wire_type, &mut value, &mut slice, DecodeContext::default()).unwrap();
        assert_eq!(&value[..], &[0x80, 0xFF]);
    }
}
