//! Wire-level encoding and decoding errors.
//!
//! The variant set mirrors the error taxonomy every generated `decode`
//! routine is contractually allowed to return: `InvalidVarint`, `Overflow`,
//! `InvalidWireType`, `InvalidFieldNumber`, `InvalidUtf8`,
//! `RecursionLimitExceeded`, `EndOfStream`, and `OutOfMemory`.

use std::fmt;

/// A Protobuf message decoding error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
}

/// The root cause of a [`DecodeError`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A varint was malformed: either it ran past 10 bytes or its 10th byte
    /// carried continuation bits beyond the single significant bit `u64`
    /// needs.
    InvalidVarint,
    /// A length delimiter or varint-encoded value exceeded the bounds of the
    /// target integer width.
    Overflow,
    /// A tag's low three bits did not name one of the six defined wire
    /// types, or named a wire type the caller did not expect at this field.
    InvalidWireType { actual: u64 },
    /// A tag decoded to field number zero, or a field number exceeded
    /// `2^29 - 1`.
    InvalidFieldNumber,
    /// A `string` field's bytes were not valid UTF-8.
    InvalidUtf8,
    /// Nested message or group decoding exceeded the configured recursion
    /// depth.
    RecursionLimitExceeded,
    /// The buffer was exhausted before a value could be fully read.
    EndOfStream,
    /// Allocation failed while materializing a decoded value.
    OutOfMemory,
    /// A catch-all for malformed input that does not cleanly map onto one
    /// of the other kinds (e.g. an unterminated group, or a `required`
    /// proto2 field missing at end of message).
    Other(String),
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        DecodeError { kind }
    }

    pub fn other(message: impl Into<String>) -> Self {
        DecodeError {
            kind: DecodeErrorKind::Other(message.into()),
        }
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DecodeErrorKind::InvalidVarint => f.write_str("invalid varint"),
            DecodeErrorKind::Overflow => f.write_str("value exceeds target width"),
            DecodeErrorKind::InvalidWireType { actual } => {
                write!(f, "invalid wire type: {}", actual)
            }
            DecodeErrorKind::InvalidFieldNumber => f.write_str("invalid field number"),
            DecodeErrorKind::InvalidUtf8 => f.write_str("invalid UTF-8 in string field"),
            DecodeErrorKind::RecursionLimitExceeded => f.write_str("recursion limit exceeded"),
            DecodeErrorKind::EndOfStream => f.write_str("unexpected end of stream"),
            DecodeErrorKind::OutOfMemory => f.write_str("out of memory"),
            DecodeErrorKind::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError::new(kind)
    }
}

/// A Protobuf message encoding error.
///
/// Encoding a value of known `encoded_len()` into a buffer of insufficient
/// capacity is the only way `encode` fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeError {
    required: usize,
    remaining: usize,
}

impl EncodeError {
    pub fn new(required: usize, remaining: usize) -> EncodeError {
        EncodeError {
            required,
            remaining,
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient buffer capacity to encode message; required {} bytes but {} remain",
            self.required, self.remaining
        )
    }
}

impl std::error::Error for EncodeError {}

pub(crate) fn overflow() -> DecodeError {
    DecodeError::new(DecodeErrorKind::Overflow)
}

pub(crate) fn end_of_stream() -> DecodeError {
    DecodeError::new(DecodeErrorKind::EndOfStream)
}

pub(crate) fn invalid_varint() -> DecodeError {
    DecodeError::new(DecodeErrorKind::InvalidVarint)
}

pub(crate) fn invalid_field_number() -> DecodeError {
    DecodeError::new(DecodeErrorKind::InvalidFieldNumber)
}

pub(crate) fn invalid_wire_type(actual: u64) -> DecodeError {
    DecodeError::new(DecodeErrorKind::InvalidWireType { actual })
}
