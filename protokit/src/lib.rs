//! Stateless wire codec and schema-agnostic message layer for a from-scratch
//! Protocol Buffers toolkit.
//!
//! This crate is the runtime that generated code and the dynamic message
//! layer both depend on: bit-exact varint/ZigZag/fixed-width encoding, tag
//! framing, unknown-field preservation, and the [`Message`] trait that ties
//! them together. It has no knowledge of `.proto` source, schemas, or code
//! generation — see `protokit-front`, `protokit-link`, and `protokit-gen`
//! for those.

pub mod encoding;
mod error;
mod message;
mod unknown;

pub use encoding::{DecodeContext, WireType};
pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use message::Message;
pub use unknown::{UnknownField, UnknownFieldSet};

pub use bytes;
