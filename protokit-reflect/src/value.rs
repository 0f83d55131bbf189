use std::collections::BTreeMap;

use crate::dynamic_message::DynamicMessage;

/// One field's value, shaped to match every scalar and message kind a
/// descriptor can declare. `Enum` values are stored as the raw wire number;
/// the dynamic layer does not validate them against an enum's declared
/// values (§4.8 treats unknown enum numbers the same as generated code
/// treating proto3 enums as open).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Sint32(i32),
    Sint64(i64),
    Fixed32(u32),
    Fixed64(u64),
    Sfixed32(i32),
    Sfixed64(i64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Message(Box<DynamicMessage>),
}

/// A map field's key, canonicalized to one of four storage shapes
/// regardless of the declared int flavor (`int32`, `sint32`, `fixed32`, ...
/// all canonicalize to one of `Int64`/`Uint64`). The descriptor's key field
/// type remains the source of truth for re-encoding; this only needs a
/// total order for `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    Int64(i64),
    Uint64(u64),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn as_map_key(&self) -> Option<MapKey> {
        match self {
            Value::Int32(v) => Some(MapKey::Int64(i64::from(*v))),
            Value::Int64(v) => Some(MapKey::Int64(*v)),
            Value::Sint32(v) => Some(MapKey::Int64(i64::from(*v))),
            Value::Sint64(v) => Some(MapKey::Int64(*v)),
            Value::Sfixed32(v) => Some(MapKey::Int64(i64::from(*v))),
            Value::Sfixed64(v) => Some(MapKey::Int64(*v)),
            Value::Uint32(v) => Some(MapKey::Uint64(u64::from(*v))),
            Value::Uint64(v) => Some(MapKey::Uint64(*v)),
            Value::Fixed32(v) => Some(MapKey::Uint64(u64::from(*v))),
            Value::Fixed64(v) => Some(MapKey::Uint64(*v)),
            Value::Bool(v) => Some(MapKey::Bool(*v)),
            Value::String(v) => Some(MapKey::String(v.clone())),
            _ => None,
        }
    }
}

/// What's stored for one field number: a single value, a repeated list, or
/// a map (§4.8's "one of {singular value, list, string-keyed map,
/// integer-keyed map}" — the string/integer split collapses into one
/// `MapKey`, since Rust's `BTreeMap` doesn't need separate storage per key
/// kind).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Repeated(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
}
