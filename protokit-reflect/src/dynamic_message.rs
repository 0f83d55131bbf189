use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes};
use protokit::encoding::{self, check_wire_type, decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint, key_len, skip_field, DecodeContext, WireType};
use protokit::{DecodeError, DecodeErrorKind};
use protokit_types::descriptor::field_descriptor_proto::{Label, Type};
use protokit_types::descriptor::{DescriptorProto, FieldDescriptorProto};

use crate::error::ReflectError;
use crate::pool::Pool;
use crate::value::{FieldValue, MapKey, Value};

/// A schema-driven message value, addressed by field number or name rather
/// than by a generated Rust struct (§4.8).
///
/// Every operation is validated against the `DescriptorProto` it was built
/// from; a message- or map-typed field additionally resolves its
/// `type_name` through the shared [`Pool`] to find the descriptor of the
/// type it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: Arc<DescriptorProto>,
    pool: Arc<Pool>,
    fields: BTreeMap<i32, FieldValue>,
}

impl DynamicMessage {
    pub fn new(descriptor: Arc<DescriptorProto>, pool: Arc<Pool>) -> Self {
        DynamicMessage { descriptor, pool, fields: BTreeMap::new() }
    }

    pub fn descriptor(&self) -> &DescriptorProto {
        &self.descriptor
    }

    fn field_descriptor(&self, number: i32) -> Option<&FieldDescriptorProto> {
        self.descriptor.field.iter().find(|f| f.number == Some(number))
    }

    pub fn field_descriptor_by_name(&self, name: &str) -> Option<&FieldDescriptorProto> {
        self.descriptor.field.iter().find(|f| f.name.as_deref() == Some(name))
    }

    fn is_map_entry_type(&self, fd: &FieldDescriptorProto) -> bool {
        fd.r#type() == Type::Message
            && fd
                .type_name
                .as_deref()
                .and_then(|name| self.pool.message(name))
                .map(|entry| entry.options.as_ref().map_or(false, |o| o.is_map_entry()))
                .unwrap_or(false)
    }

    pub fn get(&self, number: i32) -> Option<&FieldValue> {
        self.fields.get(&number)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FieldValue> {
        let number = self.field_descriptor_by_name(name)?.number?;
        self.get(number)
    }

    pub fn set(&mut self, number: i32, value: Value) -> Result<(), ReflectError> {
        let fd = self.field_descriptor(number).ok_or(ReflectError::UnknownField(number))?.clone();
        if fd.label() == Label::Repeated || self.is_map_entry_type(&fd) {
            return Err(ReflectError::WrongShape { field: number });
        }
        check_type(&fd, &value)?;
        self.fields.insert(number, FieldValue::Single(value));
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        let number = self
            .field_descriptor_by_name(name)
            .and_then(|f| f.number)
            .ok_or_else(|| ReflectError::UnknownFieldName(name.to_string()))?;
        self.set(number, value)
    }

    pub fn append(&mut self, number: i32, value: Value) -> Result<(), ReflectError> {
        let fd = self.field_descriptor(number).ok_or(ReflectError::UnknownField(number))?.clone();
        if fd.label() != Label::Repeated || self.is_map_entry_type(&fd) {
            return Err(ReflectError::WrongShape { field: number });
        }
        check_type(&fd, &value)?;
        match self.fields.entry(number).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
            FieldValue::Repeated(values) => values.push(value),
            _ => return Err(ReflectError::WrongShape { field: number }),
        }
        Ok(())
    }

    pub fn append_by_name(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        let number = self
            .field_descriptor_by_name(name)
            .and_then(|f| f.number)
            .ok_or_else(|| ReflectError::UnknownFieldName(name.to_string()))?;
        self.append(number, value)
    }

    pub fn map_insert(&mut self, number: i32, key: MapKey, value: Value) -> Result<(), ReflectError> {
        let fd = self.field_descriptor(number).ok_or(ReflectError::UnknownField(number))?.clone();
        if !self.is_map_entry_type(&fd) {
            return Err(ReflectError::WrongShape { field: number });
        }
        let type_name = fd.type_name.clone().unwrap_or_default();
        let entry_descriptor = self.pool.message(&type_name).ok_or(ReflectError::UnresolvedType(type_name))?;
        if let Some(value_fd) = entry_descriptor.field.iter().find(|f| f.number == Some(2)) {
            check_type(value_fd, &value)?;
        }
        match self.fields.entry(number).or_insert_with(|| FieldValue::Map(BTreeMap::new())) {
            FieldValue::Map(map) => {
                map.insert(key, value);
            }
            _ => return Err(ReflectError::WrongShape { field: number }),
        }
        Ok(())
    }

    pub fn map_insert_by_name(&mut self, name: &str, key: MapKey, value: Value) -> Result<(), ReflectError> {
        let number = self
            .field_descriptor_by_name(name)
            .and_then(|f| f.number)
            .ok_or_else(|| ReflectError::UnknownFieldName(name.to_string()))?;
        self.map_insert(number, key, value)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    fn sorted_fields(&self) -> Vec<&FieldDescriptorProto> {
        let mut fields: Vec<&FieldDescriptorProto> = self.descriptor.field.iter().collect();
        fields.sort_by_key(|f| f.number.unwrap_or(0));
        fields
    }

    pub fn encoded_len(&self) -> usize {
        self.sorted_fields()
            .into_iter()
            .filter_map(|fd| {
                let number = fd.number.unwrap_or(0);
                self.fields.get(&number).map(|value| self.field_encoded_len(fd, number, value))
            })
            .sum()
    }

    fn field_encoded_len(&self, fd: &FieldDescriptorProto, number: i32, value: &FieldValue) -> usize {
        let ty = fd.r#type();
        let tag = number as u32;
        match value {
            FieldValue::Single(v) => match v {
                Value::Message(msg) => message_field_encoded_len(tag, msg),
                _ => encoded_len_singular_scalar(ty, tag, v),
            },
            FieldValue::Repeated(values) => {
                if ty == Type::Message {
                    values
                        .iter()
                        .filter_map(|v| match v {
                            Value::Message(msg) => Some(message_field_encoded_len(tag, msg)),
                            _ => None,
                        })
                        .sum()
                } else {
                    let packed = is_packable(ty) && fd.options.as_ref().and_then(|o| o.packed).unwrap_or(false);
                    encoded_len_repeated_scalar(ty, tag, values, packed)
                }
            }
            FieldValue::Map(map) => self.map_encoded_len(fd, tag, map),
        }
    }

    fn map_entry_value_fds<'a>(&'a self, fd: &'a FieldDescriptorProto) -> Option<(&'a FieldDescriptorProto, &'a FieldDescriptorProto)> {
        let entry = fd.type_name.as_deref().and_then(|name| self.pool.message(name))?;
        let key_fd = entry.field.iter().find(|f| f.number == Some(1))?;
        let value_fd = entry.field.iter().find(|f| f.number == Some(2))?;
        Some((key_fd, value_fd))
    }

    fn map_encoded_len(&self, fd: &FieldDescriptorProto, tag: u32, map: &BTreeMap<MapKey, Value>) -> usize {
        let Some((key_fd, value_fd)) = self.map_entry_value_fds(fd) else {
            return 0;
        };
        let key_ty = key_fd.r#type();
        let value_ty = value_fd.r#type();
        map.iter()
            .map(|(key, value)| {
                let key_value = map_key_to_value(key, key_ty);
                let key_bytes = encoded_len_singular_scalar(key_ty, 1, &key_value);
                let value_bytes = match value {
                    Value::Message(msg) => message_field_encoded_len(2, msg),
                    _ => encoded_len_singular_scalar(value_ty, 2, value),
                };
                key_len(tag) + encoded_len_varint((key_bytes + value_bytes) as u64) + key_bytes + value_bytes
            })
            .sum()
    }

    pub fn encode_raw(&self, buf: &mut impl BufMut) {
        for fd in self.sorted_fields() {
            let number = fd.number.unwrap_or(0);
            let Some(value) = self.fields.get(&number) else { continue };
            self.encode_field(fd, number as u32, value, buf);
        }
    }

    fn encode_field(&self, fd: &FieldDescriptorProto, tag: u32, value: &FieldValue, buf: &mut impl BufMut) {
        let ty = fd.r#type();
        match value {
            FieldValue::Single(v) => match v {
                Value::Message(msg) => write_message_field(tag, msg, buf),
                _ => encode_singular_scalar(ty, tag, v, buf),
            },
            FieldValue::Repeated(values) => {
                if ty == Type::Message {
                    for v in values {
                        if let Value::Message(msg) = v {
                            write_message_field(tag, msg, buf);
                        }
                    }
                } else {
                    let packed = is_packable(ty) && fd.options.as_ref().and_then(|o| o.packed).unwrap_or(false);
                    encode_repeated_scalar(ty, tag, values, packed, buf);
                }
            }
            FieldValue::Map(map) => self.encode_map(fd, tag, map, buf),
        }
    }

    fn encode_map(&self, fd: &FieldDescriptorProto, tag: u32, map: &BTreeMap<MapKey, Value>, buf: &mut impl BufMut) {
        let Some((key_fd, value_fd)) = self.map_entry_value_fds(fd) else {
            return;
        };
        let key_ty = key_fd.r#type();
        let value_ty = value_fd.r#type();
        for (key, value) in map {
            let key_value = map_key_to_value(key, key_ty);
            let key_bytes = encoded_len_singular_scalar(key_ty, 1, &key_value);
            let value_bytes = match value {
                Value::Message(msg) => message_field_encoded_len(2, msg),
                _ => encoded_len_singular_scalar(value_ty, 2, value),
            };
            encode_key(tag, WireType::LengthDelimited, buf);
            encode_varint((key_bytes + value_bytes) as u64, buf);
            encode_singular_scalar(key_ty, 1, &key_value, buf);
            match value {
                Value::Message(msg) => write_message_field(2, msg, buf),
                _ => encode_singular_scalar(value_ty, 2, value, buf),
            }
        }
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_raw(&mut buf);
        buf
    }

    pub fn decode(descriptor: Arc<DescriptorProto>, pool: Arc<Pool>, buf: impl Buf) -> Result<Self, DecodeError> {
        let mut message = DynamicMessage::new(descriptor, pool);
        message.merge(buf)?;
        Ok(message)
    }

    pub fn merge(&mut self, mut buf: impl Buf) -> Result<(), DecodeError> {
        let ctx = DecodeContext::default();
        while buf.has_remaining() {
            let (tag, wire_type) = decode_key(&mut buf)?;
            self.merge_field(tag, wire_type, &mut buf, ctx)?;
        }
        Ok(())
    }

    /// Dispatches one wire-level field occurrence by number. Numbers with no
    /// matching field are dropped rather than preserved (§4.8 — the one
    /// point the dynamic layer diverges from the generated-code path, which
    /// keeps them in `unknown_fields`).
    pub fn merge_field(&mut self, tag: u32, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
        let number = tag as i32;
        let Some(fd) = self.field_descriptor(number).cloned() else {
            return skip_field(wire_type, tag, buf, ctx);
        };
        let ty = fd.r#type();
        if ty == Type::Group {
            // Deprecated proto2 framing; the dynamic layer doesn't reflect
            // over group-typed fields, so treat them like unknown fields.
            return skip_field(wire_type, tag, buf, ctx);
        }
        if self.is_map_entry_type(&fd) {
            return self.merge_map_entry(&fd, wire_type, buf, ctx);
        }
        if ty == Type::Message {
            return self.merge_message_field(&fd, number, wire_type, buf, ctx);
        }
        if fd.label() == Label::Repeated {
            let decoded = merge_repeated_scalar(ty, wire_type, buf, ctx)?;
            match self.fields.entry(number).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
                FieldValue::Repeated(values) => values.extend(decoded),
                _ => return Err(DecodeError::other("field shape changed mid-decode")),
            }
            Ok(())
        } else {
            let value = merge_singular_scalar(ty, wire_type, buf, ctx)?;
            self.fields.insert(number, FieldValue::Single(value));
            Ok(())
        }
    }

    fn empty_nested(&self, fd: &FieldDescriptorProto) -> Result<DynamicMessage, DecodeError> {
        let type_name = fd.type_name.as_deref().ok_or_else(|| DecodeError::other("message field missing type_name"))?;
        let descriptor = self
            .pool
            .message(type_name)
            .ok_or_else(|| DecodeError::other("message type not registered in pool"))?
            .clone();
        Ok(DynamicMessage::new(descriptor, self.pool.clone()))
    }

    /// Decodes a length-delimited submessage directly into `target`,
    /// preserving true protobuf merge semantics for repeated occurrences of
    /// a singular message field.
    fn merge_into_nested(&self, target: &mut DynamicMessage, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
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
            target.merge_field(tag, wire_type, buf, inner_ctx)?;
        }
        if buf.remaining() != remaining {
            return Err(DecodeError::other("delimited length exceeded"));
        }
        Ok(())
    }

    fn merge_message_field(&mut self, fd: &FieldDescriptorProto, number: i32, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
        if fd.label() == Label::Repeated {
            let mut msg = self.empty_nested(fd)?;
            self.merge_into_nested(&mut msg, wire_type, buf, ctx)?;
            match self.fields.entry(number).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
                FieldValue::Repeated(values) => values.push(Value::Message(Box::new(msg))),
                _ => return Err(DecodeError::other("field shape changed mid-decode")),
            }
            return Ok(());
        }
        if !matches!(self.fields.get(&number), Some(FieldValue::Single(Value::Message(_)))) {
            let empty = self.empty_nested(fd)?;
            self.fields.insert(number, FieldValue::Single(Value::Message(Box::new(empty))));
        }
        if let Some(FieldValue::Single(Value::Message(msg))) = self.fields.get_mut(&number) {
            self.merge_into_nested(msg, wire_type, buf, ctx)?;
        }
        Ok(())
    }

    fn merge_map_entry(&mut self, fd: &FieldDescriptorProto, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
        let mut entry = self.empty_nested(fd)?;
        self.merge_into_nested(&mut entry, wire_type, buf, ctx)?;
        let value_fd = entry.field_descriptor(2).cloned();
        let key = match entry.fields.get(&1) {
            Some(FieldValue::Single(v)) => v.as_map_key().ok_or_else(|| DecodeError::other("unsupported map key type"))?,
            _ => default_map_key(entry.field_descriptor(1).map(|f| f.r#type()).unwrap_or(Type::Int64)),
        };
        let value = match entry.fields.remove(&2) {
            Some(FieldValue::Single(v)) => v,
            _ => match value_fd {
                Some(value_fd) => entry.default_map_value(&value_fd)?,
                None => return Err(DecodeError::other("map entry missing value field descriptor")),
            },
        };
        let number = fd.number.unwrap_or(0);
        match self.fields.entry(number).or_insert_with(|| FieldValue::Map(BTreeMap::new())) {
            FieldValue::Map(map) => {
                map.insert(key, value);
            }
            _ => return Err(DecodeError::other("field shape changed mid-decode")),
        }
        Ok(())
    }

    fn default_map_value(&self, value_fd: &FieldDescriptorProto) -> Result<Value, DecodeError> {
        Ok(match value_fd.r#type() {
            Type::Double => Value::Double(0.0),
            Type::Float => Value::Float(0.0),
            Type::Int32 => Value::Int32(0),
            Type::Int64 => Value::Int64(0),
            Type::Uint32 => Value::Uint32(0),
            Type::Uint64 => Value::Uint64(0),
            Type::Sint32 => Value::Sint32(0),
            Type::Sint64 => Value::Sint64(0),
            Type::Fixed32 => Value::Fixed32(0),
            Type::Fixed64 => Value::Fixed64(0),
            Type::Sfixed32 => Value::Sfixed32(0),
            Type::Sfixed64 => Value::Sfixed64(0),
            Type::Bool => Value::Bool(false),
            Type::String => Value::String(String::new()),
            Type::Bytes => Value::Bytes(Vec::new()),
            Type::Enum => Value::Enum(0),
            Type::Message => Value::Message(Box::new(self.empty_nested(value_fd)?)),
            Type::Group => return Err(DecodeError::other("group-typed map values are not supported")),
        })
    }
}

fn check_type(fd: &FieldDescriptorProto, value: &Value) -> Result<(), ReflectError> {
    let ok = matches!(
        (fd.r#type(), value),
        (Type::Double, Value::Double(_))
            | (Type::Float, Value::Float(_))
            | (Type::Int32, Value::Int32(_))
            | (Type::Int64, Value::Int64(_))
            | (Type::Uint32, Value::Uint32(_))
            | (Type::Uint64, Value::Uint64(_))
            | (Type::Sint32, Value::Sint32(_))
            | (Type::Sint64, Value::Sint64(_))
            | (Type::Fixed32, Value::Fixed32(_))
            | (Type::Fixed64, Value::Fixed64(_))
            | (Type::Sfixed32, Value::Sfixed32(_))
            | (Type::Sfixed64, Value::Sfixed64(_))
            | (Type::Bool, Value::Bool(_))
            | (Type::String, Value::String(_))
            | (Type::Bytes, Value::Bytes(_))
            | (Type::Enum, Value::Enum(_))
            | (Type::Message, Value::Message(_))
    );
    if ok {
        Ok(())
    } else {
        Err(ReflectError::TypeMismatch { field: fd.number.unwrap_or(0) })
    }
}

fn is_packable(ty: Type) -> bool {
    !matches!(ty, Type::String | Type::Bytes | Type::Message | Type::Group)
}

fn default_map_key(ty: Type) -> MapKey {
    match ty {
        Type::Bool => MapKey::Bool(false),
        Type::String => MapKey::String(String::new()),
        Type::Uint32 | Type::Uint64 | Type::Fixed32 | Type::Fixed64 => MapKey::Uint64(0),
        _ => MapKey::Int64(0),
    }
}

fn map_key_to_value(key: &MapKey, ty: Type) -> Value {
    match (ty, key) {
        (Type::Int32, MapKey::Int64(v)) => Value::Int32(*v as i32),
        (Type::Int64, MapKey::Int64(v)) => Value::Int64(*v),
        (Type::Sint32, MapKey::Int64(v)) => Value::Sint32(*v as i32),
        (Type::Sint64, MapKey::Int64(v)) => Value::Sint64(*v),
        (Type::Sfixed32, MapKey::Int64(v)) => Value::Sfixed32(*v as i32),
        (Type::Sfixed64, MapKey::Int64(v)) => Value::Sfixed64(*v),
        (Type::Uint32, MapKey::Uint64(v)) => Value::Uint32(*v as u32),
        (Type::Uint64, MapKey::Uint64(v)) => Value::Uint64(*v),
        (Type::Fixed32, MapKey::Uint64(v)) => Value::Fixed32(*v as u32),
        (Type::Fixed64, MapKey::Uint64(v)) => Value::Fixed64(*v),
        (Type::Bool, MapKey::Bool(v)) => Value::Bool(*v),
        (Type::String, MapKey::String(v)) => Value::String(v.clone()),
        _ => Value::Int64(0),
    }
}

fn message_field_encoded_len(tag: u32, msg: &DynamicMessage) -> usize {
    key_len(tag) + encoded_len_varint(msg.encoded_len() as u64) + msg.encoded_len()
}

fn write_message_field(tag: u32, msg: &DynamicMessage, buf: &mut impl BufMut) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(msg.encoded_len() as u64, buf);
    msg.encode_raw(buf);
}

fn encode_singular_scalar(ty: Type, tag: u32, value: &Value, buf: &mut impl BufMut) {
    match (ty, value) {
        (Type::Int32, Value::Int32(v)) => encoding::int32::encode(tag, v, buf),
        (Type::Int64, Value::Int64(v)) => encoding::int64::encode(tag, v, buf),
        (Type::Uint32, Value::Uint32(v)) => encoding::uint32::encode(tag, v, buf),
        (Type::Uint64, Value::Uint64(v)) => encoding::uint64::encode(tag, v, buf),
        (Type::Sint32, Value::Sint32(v)) => encoding::sint32::encode(tag, v, buf),
        (Type::Sint64, Value::Sint64(v)) => encoding::sint64::encode(tag, v, buf),
        (Type::Fixed32, Value::Fixed32(v)) => encoding::fixed32::encode(tag, v, buf),
        (Type::Fixed64, Value::Fixed64(v)) => encoding::fixed64::encode(tag, v, buf),
        (Type::Sfixed32, Value::Sfixed32(v)) => encoding::sfixed32::encode(tag, v, buf),
        (Type::Sfixed64, Value::Sfixed64(v)) => encoding::sfixed64::encode(tag, v, buf),
        (Type::Bool, Value::Bool(v)) => encoding::bool::encode(tag, v, buf),
        (Type::Double, Value::Double(v)) => encoding::double::encode(tag, v, buf),
        (Type::Float, Value::Float(v)) => encoding::float::encode(tag, v, buf),
        (Type::String, Value::String(v)) => encoding::string::encode(tag, v, buf),
        (Type::Bytes, Value::Bytes(v)) => encoding::bytes::encode(tag, v, buf),
        (Type::Enum, Value::Enum(v)) => encoding::enumeration::encode(tag, v, buf),
        _ => {}
    }
}

fn encoded_len_singular_scalar(ty: Type, tag: u32, value: &Value) -> usize {
    match (ty, value) {
        (Type::Int32, Value::Int32(v)) => encoding::int32::encoded_len(tag, v),
        (Type::Int64, Value::Int64(v)) => encoding::int64::encoded_len(tag, v),
        (Type::Uint32, Value::Uint32(v)) => encoding::uint32::encoded_len(tag, v),
        (Type::Uint64, Value::Uint64(v)) => encoding::uint64::encoded_len(tag, v),
        (Type::Sint32, Value::Sint32(v)) => encoding::sint32::encoded_len(tag, v),
        (Type::Sint64, Value::Sint64(v)) => encoding::sint64::encoded_len(tag, v),
        (Type::Fixed32, Value::Fixed32(v)) => encoding::fixed32::encoded_len(tag, v),
        (Type::Fixed64, Value::Fixed64(v)) => encoding::fixed64::encoded_len(tag, v),
        (Type::Sfixed32, Value::Sfixed32(v)) => encoding::sfixed32::encoded_len(tag, v),
        (Type::Sfixed64, Value::Sfixed64(v)) => encoding::sfixed64::encoded_len(tag, v),
        (Type::Bool, Value::Bool(v)) => encoding::bool::encoded_len(tag, v),
        (Type::Double, Value::Double(v)) => encoding::double::encoded_len(tag, v),
        (Type::Float, Value::Float(v)) => encoding::float::encoded_len(tag, v),
        (Type::String, Value::String(v)) => encoding::string::encoded_len(tag, v),
        (Type::Bytes, Value::Bytes(v)) => encoding::bytes::encoded_len(tag, v),
        (Type::Enum, Value::Enum(v)) => encoding::enumeration::encoded_len(tag, v),
        _ => 0,
    }
}

fn merge_singular_scalar(ty: Type, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<Value, DecodeError> {
    Ok(match ty {
        Type::Int32 => {
            let mut v = 0;
            encoding::int32::merge(wire_type, &mut v, buf, ctx)?;
            Value::Int32(v)
        }
        Type::Int64 => {
            let mut v = 0;
            encoding::int64::merge(wire_type, &mut v, buf, ctx)?;
            Value::Int64(v)
        }
        Type::Uint32 => {
            let mut v = 0;
            encoding::uint32::merge(wire_type, &mut v, buf, ctx)?;
            Value::Uint32(v)
        }
        Type::Uint64 => {
            let mut v = 0;
            encoding::uint64::merge(wire_type, &mut v, buf, ctx)?;
            Value::Uint64(v)
        }
        Type::Sint32 => {
            let mut v = 0;
            encoding::sint32::merge(wire_type, &mut v, buf, ctx)?;
            Value::Sint32(v)
        }
        Type::Sint64 => {
            let mut v = 0;
            encoding::sint64::merge(wire_type, &mut v, buf, ctx)?;
            Value::Sint64(v)
        }
        Type::Fixed32 => {
            let mut v = 0;
            encoding::fixed32::merge(wire_type, &mut v, buf, ctx)?;
            Value::Fixed32(v)
        }
        Type::Fixed64 => {
            let mut v = 0;
            encoding::fixed64::merge(wire_type, &mut v, buf, ctx)?;
            Value::Fixed64(v)
        }
        Type::Sfixed32 => {
            let mut v = 0;
            encoding::sfixed32::merge(wire_type, &mut v, buf, ctx)?;
            Value::Sfixed32(v)
        }
        Type::Sfixed64 => {
            let mut v = 0;
            encoding::sfixed64::merge(wire_type, &mut v, buf, ctx)?;
            Value::Sfixed64(v)
        }
        Type::Bool => {
            let mut v = false;
            encoding::bool::merge(wire_type, &mut v, buf, ctx)?;
            Value::Bool(v)
        }
        Type::Double => {
            let mut v = 0.0;
            encoding::double::merge(wire_type, &mut v, buf, ctx)?;
            Value::Double(v)
        }
        Type::Float => {
            let mut v = 0.0;
            encoding::float::merge(wire_type, &mut v, buf, ctx)?;
            Value::Float(v)
        }
        Type::String => {
            let mut v = String::new();
            encoding::string::merge(wire_type, &mut v, buf, ctx)?;
            Value::String(v)
        }
        Type::Bytes => {
            let mut v = Bytes::new();
            encoding::bytes::merge(wire_type, &mut v, buf, ctx)?;
            Value::Bytes(v.to_vec())
        }
        Type::Enum => {
            let mut v = 0;
            encoding::enumeration::merge(wire_type, &mut v, buf, ctx)?;
            Value::Enum(v)
        }
        Type::Message | Type::Group => return Err(DecodeError::other("scalar decode path given a message or group field")),
    })
}

fn encode_repeated_scalar(ty: Type, tag: u32, values: &[Value], packed: bool, buf: &mut impl BufMut) {
    macro_rules! numeric {
        ($module:ident, $variant:ident) => {{
            let extracted: Vec<_> = values
                .iter()
                .filter_map(|v| if let Value::$variant(n) = v { Some(*n) } else { None })
                .collect();
            if packed {
                encoding::$module::encode_packed(tag, &extracted, buf);
            } else {
                encoding::$module::encode_repeated(tag, &extracted, buf);
            }
        }};
    }
    match ty {
        Type::Int32 => numeric!(int32, Int32),
        Type::Int64 => numeric!(int64, Int64),
        Type::Uint32 => numeric!(uint32, Uint32),
        Type::Uint64 => numeric!(uint64, Uint64),
        Type::Sint32 => numeric!(sint32, Sint32),
        Type::Sint64 => numeric!(sint64, Sint64),
        Type::Fixed32 => numeric!(fixed32, Fixed32),
        Type::Fixed64 => numeric!(fixed64, Fixed64),
        Type::Sfixed32 => numeric!(sfixed32, Sfixed32),
        Type::Sfixed64 => numeric!(sfixed64, Sfixed64),
        Type::Bool => numeric!(bool, Bool),
        Type::Double => numeric!(double, Double),
        Type::Float => numeric!(float, Float),
        Type::Enum => numeric!(enumeration, Enum),
        Type::String => {
            let extracted: Vec<_> = values.iter().filter_map(|v| if let Value::String(s) = v { Some(s.clone()) } else { None }).collect();
            encoding::string::encode_repeated(tag, &extracted, buf);
        }
        Type::Bytes => {
            let extracted: Vec<_> = values.iter().filter_map(|v| if let Value::Bytes(b) = v { Some(b.clone()) } else { None }).collect();
            encoding::bytes::encode_repeated(tag, &extracted, buf);
        }
        Type::Message | Type::Group => {}
    }
}

fn encoded_len_repeated_scalar(ty: Type, tag: u32, values: &[Value], packed: bool) -> usize {
    macro_rules! numeric {
        ($module:ident, $variant:ident) => {{
            let extracted: Vec<_> = values
                .iter()
                .filter_map(|v| if let Value::$variant(n) = v { Some(*n) } else { None })
                .collect();
            if packed {
                encoding::$module::encoded_len_packed(tag, &extracted)
            } else {
                encoding::$module::encoded_len_repeated(tag, &extracted)
            }
        }};
    }
    match ty {
        Type::Int32 => numeric!(int32, Int32),
        Type::Int64 => numeric!(int64, Int64),
        Type::Uint32 => numeric!(uint32, Uint32),
        Type::Uint64 => numeric!(uint64, Uint64),
        Type::Sint32 => numeric!(sint32, Sint32),
        Type::Sint64 => numeric!(sint64, Sint64),
        Type::Fixed32 => numeric!(fixed32, Fixed32),
        Type::Fixed64 => numeric!(fixed64, Fixed64),
        Type::Sfixed32 => numeric!(sfixed32, Sfixed32),
        Type::Sfixed64 => numeric!(sfixed64, Sfixed64),
        Type::Bool => numeric!(bool, Bool),
        Type::Double => numeric!(double, Double),
        Type::Float => numeric!(float, Float),
        Type::Enum => numeric!(enumeration, Enum),
        Type::String => {
            let extracted: Vec<_> = values.iter().filter_map(|v| if let Value::String(s) = v { Some(s.clone()) } else { None }).collect();
            encoding::string::encoded_len_repeated(tag, &extracted)
        }
        Type::Bytes => {
            let extracted: Vec<_> = values.iter().filter_map(|v| if let Value::Bytes(b) = v { Some(b.clone()) } else { None }).collect();
            encoding::bytes::encoded_len_repeated(tag, &extracted)
        }
        Type::Message | Type::Group => 0,
    }
}

fn merge_repeated_scalar(ty: Type, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<Vec<Value>, DecodeError> {
    macro_rules! numeric {
        ($module:ident, $variant:ident) => {{
            let mut v = Vec::new();
            encoding::$module::merge_repeated(wire_type, &mut v, buf, ctx)?;
            v.into_iter().map(Value::$variant).collect()
        }};
    }
    Ok(match ty {
        Type::Int32 => numeric!(int32, Int32),
        Type::Int64 => numeric!(int64, Int64),
        Type::Uint32 => numeric!(uint32, Uint32),
        Type::Uint64 => numeric!(uint64, Uint64),
        Type::Sint32 => numeric!(sint32, Sint32),
        Type::Sint64 => numeric!(sint64, Sint64),
        Type::Fixed32 => numeric!(fixed32, Fixed32),
        Type::Fixed64 => numeric!(fixed64, Fixed64),
        Type::Sfixed32 => numeric!(sfixed32, Sfixed32),
        Type::Sfixed64 => numeric!(sfixed64, Sfixed64),
        Type::Bool => numeric!(bool, Bool),
        Type::Double => numeric!(double, Double),
        Type::Float => numeric!(float, Float),
        Type::Enum => numeric!(enumeration, Enum),
        Type::String => {
            let mut v = Vec::new();
            encoding::string::merge_repeated(wire_type, &mut v, buf, ctx)?;
            v.into_iter().map(Value::String).collect()
        }
        Type::Bytes => {
            let mut v = Vec::new();
            encoding::bytes::merge_repeated(wire_type, &mut v, buf, ctx)?;
            v.into_iter().map(Value::Bytes).collect()
        }
        Type::Message | Type::Group => return Err(DecodeError::other("scalar decode path given a message or group field")),
    })
}

#[cfg(test)]
mod tests {
    use protokit_types::descriptor::field_descriptor_proto::{Label, Type};
    use protokit_types::descriptor::{FileDescriptorProto, FileDescriptorSet, MessageOptions};

    use super::*;

    fn field(number: i32, name: &str, ty: Type, label: Label, type_name: Option<&str>) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(label as i32),
            r#type: Some(ty as i32),
            type_name: type_name.map(str::to_string),
            ..Default::default()
        }
    }

    fn build_pool() -> Arc<Pool> {
        let leaf = DescriptorProto {
            name: Some("Leaf".to_string()),
            field: vec![field(1, "name", Type::String, Label::Optional, None)],
            ..Default::default()
        };
        let counts_entry = DescriptorProto {
            name: Some("CountsEntry".to_string()),
            field: vec![
                field(1, "key", Type::String, Label::Optional, None),
                field(2, "value", Type::Int32, Label::Optional, None),
            ],
            options: Some(MessageOptions { map_entry: Some(true), ..Default::default() }),
            ..Default::default()
        };
        let item = DescriptorProto {
            name: Some("Item".to_string()),
            field: vec![
                field(1, "id", Type::Int32, Label::Optional, None),
                field(2, "tags", Type::String, Label::Repeated, None),
                field(3, "leaf", Type::Message, Label::Optional, Some(".pkg.Leaf")),
                field(4, "counts", Type::Message, Label::Repeated, Some(".pkg.Item.CountsEntry")),
            ],
            nested_type: vec![counts_entry],
            ..Default::default()
        };
        let file = FileDescriptorProto {
            name: Some("a.proto".to_string()),
            package: Some("pkg".to_string()),
            message_type: vec![leaf, item],
            ..Default::default()
        };
        Arc::new(Pool::from_file_set(&FileDescriptorSet { file: vec![file], ..Default::default() }))
    }

    #[test]
    fn round_trips_scalar_repeated_nested_and_map_fields() {
        let pool = build_pool();
        let mut item = pool.new_message("pkg.Item").expect("Item registered");

        item.set(1, Value::Int32(42)).unwrap();
        item.append(2, Value::String("a".to_string())).unwrap();
        item.append(2, Value::String("b".to_string())).unwrap();

        let mut leaf = pool.new_message("pkg.Leaf").expect("Leaf registered");
        leaf.set_by_name("name", Value::String("hello".to_string())).unwrap();
        item.set(3, Value::Message(Box::new(leaf))).unwrap();

        item.map_insert(4, MapKey::String("x".to_string()), Value::Int32(7)).unwrap();
        item.map_insert(4, MapKey::String("y".to_string()), Value::Int32(9)).unwrap();

        let bytes = item.encode_to_vec();
        let item_descriptor = pool.message("pkg.Item").unwrap().clone();
        let decoded = DynamicMessage::decode(item_descriptor, pool.clone(), bytes.as_slice()).unwrap();

        assert_eq!(decoded.get(1), Some(&FieldValue::Single(Value::Int32(42))));
        assert_eq!(
            decoded.get(2),
            Some(&FieldValue::Repeated(vec![Value::String("a".to_string()), Value::String("b".to_string())]))
        );
        match decoded.get(3) {
            Some(FieldValue::Single(Value::Message(leaf))) => {
                assert_eq!(leaf.get_by_name("name"), Some(&FieldValue::Single(Value::String("hello".to_string()))));
            }
            other => panic!("expected a nested message, got {other:?}"),
        }
        match decoded.get(4) {
            Some(FieldValue::Map(map)) => {
                assert_eq!(map.get(&MapKey::String("x".to_string())), Some(&Value::Int32(7)));
                assert_eq!(map.get(&MapKey::String("y".to_string())), Some(&Value::Int32(9)));
            }
            other => panic!("expected a map, got {other:?}"),
        }
    }

    #[test]
    fn decode_drops_unknown_field_numbers() {
        let pool = build_pool();
        let descriptor = pool.message("pkg.Item").unwrap().clone();

        let mut buf = Vec::new();
        encode_key(99, WireType::Varint, &mut buf);
        encode_varint(123, &mut buf);
        encoding::int32::encode(1, &5, &mut buf);

        let decoded = DynamicMessage::decode(descriptor, pool, buf.as_slice()).unwrap();
        assert_eq!(decoded.get(1), Some(&FieldValue::Single(Value::Int32(5))));
        assert_eq!(decoded.get(99), None);
    }

    #[test]
    fn set_rejects_wrong_shape_and_wrong_type() {
        let pool = build_pool();
        let mut item = pool.new_message("pkg.Item").expect("Item registered");

        assert_eq!(item.set(2, Value::String("nope".to_string())), Err(ReflectError::WrongShape { field: 2 }));
        assert_eq!(item.set(1, Value::String("nope".to_string())), Err(ReflectError::TypeMismatch { field: 1 }));
        assert_eq!(item.set(50, Value::Int32(1)), Err(ReflectError::UnknownField(50)));
    }

    #[test]
    fn singular_message_field_merges_rather_than_replaces() {
        let pool = build_pool();
        let descriptor = pool.message("pkg.Item").unwrap().clone();
        let mut item = DynamicMessage::new(descriptor, pool.clone());

        let mut first = pool.new_message("pkg.Leaf").unwrap();
        first.set_by_name("name", Value::String("first".to_string())).unwrap();

        let mut wrapped = Vec::new();
        encoding::message::encode(3, &Wrapper(first.clone()), &mut wrapped);
        item.merge(wrapped.as_slice()).unwrap();
        item.merge(wrapped.as_slice()).unwrap();

        match item.get(3) {
            Some(FieldValue::Single(Value::Message(leaf))) => {
                assert_eq!(leaf.get_by_name("name"), Some(&FieldValue::Single(Value::String("first".to_string()))));
            }
            other => panic!("expected a nested message, got {other:?}"),
        }
    }

    struct Wrapper(DynamicMessage);
    impl protokit::Message for Wrapper {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            self.0.encode_raw(buf)
        }
        fn merge_field(&mut self, tag: u32, wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
            self.0.merge_field(tag, wire_type, buf, ctx)
        }
        fn encoded_len(&self) -> usize {
            self.0.encoded_len()
        }
        fn clear(&mut self) {
            self.0.clear()
        }
    }
}
