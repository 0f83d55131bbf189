//! Hand-written equivalent of `google/protobuf/descriptor.proto`.
//!
//! Every message here implements [`protokit::Message`] directly, the same
//! way a code generator emits message types from a schema — these are the
//! bootstrap types the linker and generator operate on before any schema of
//! their own exists. Options messages carry only the fields the rest of the
//! toolkit interprets; everything else round-trips through `unknown_fields`.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut};

use protokit::encoding::{self, DecodeContext, WireType};
use protokit::{DecodeError, Message, UnknownFieldSet};

/// A parsed set of `.proto` files, in the order `protoc` (or a linker using
/// this crate) resolved them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for FileDescriptorSet {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::message::encode_repeated(1, &self.file, buf);
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::message::merge_repeated(wire_type, &mut self.file, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::message::encoded_len_repeated(1, &self.file) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.file.clear();
        self.unknown_fields.clear();
    }
}

/// One `.proto` file's fully resolved descriptor.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileDescriptorProto {
    pub name: Option<String>,
    pub package: Option<String>,
    pub dependency: Vec<String>,
    pub public_dependency: Vec<i32>,
    pub weak_dependency: Vec<i32>,
    pub message_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub service: Vec<ServiceDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub options: Option<FileOptions>,
    pub source_code_info: Option<SourceCodeInfo>,
    pub syntax: Option<String>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for FileDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.package {
            encoding::string::encode(2, v, buf);
        }
        encoding::string::encode_repeated(3, &self.dependency, buf);
        encoding::message::encode_repeated(4, &self.message_type, buf);
        encoding::message::encode_repeated(5, &self.enum_type, buf);
        encoding::message::encode_repeated(6, &self.service, buf);
        encoding::message::encode_repeated(7, &self.extension, buf);
        if let Some(v) = &self.options {
            encoding::message::encode(8, v, buf);
        }
        if let Some(v) = &self.source_code_info {
            encoding::message::encode(9, v, buf);
        }
        encoding::int32::encode_repeated(10, &self.public_dependency, buf);
        encoding::int32::encode_repeated(11, &self.weak_dependency, buf);
        if let Some(v) = &self.syntax {
            encoding::string::encode(12, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::string::merge(wire_type, self.package.get_or_insert_with(String::new), buf, ctx),
            3 => encoding::string::merge_repeated(wire_type, &mut self.dependency, buf, ctx),
            4 => encoding::message::merge_repeated(wire_type, &mut self.message_type, buf, ctx),
            5 => encoding::message::merge_repeated(wire_type, &mut self.enum_type, buf, ctx),
            6 => encoding::message::merge_repeated(wire_type, &mut self.service, buf, ctx),
            7 => encoding::message::merge_repeated(wire_type, &mut self.extension, buf, ctx),
            8 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            9 => encoding::message::merge(
                wire_type,
                self.source_code_info.get_or_insert_with(Default::default),
                buf,
                ctx,
            ),
            10 => encoding::int32::merge_repeated(wire_type, &mut self.public_dependency, buf, ctx),
            11 => encoding::int32::merge_repeated(wire_type, &mut self.weak_dependency, buf, ctx),
            12 => encoding::string::merge(wire_type, self.syntax.get_or_insert_with(String::new), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self.package.as_ref().map_or(0, |v| encoding::string::encoded_len(2, v))
            + encoding::string::encoded_len_repeated(3, &self.dependency)
            + encoding::message::encoded_len_repeated(4, &self.message_type)
            + encoding::message::encoded_len_repeated(5, &self.enum_type)
            + encoding::message::encoded_len_repeated(6, &self.service)
            + encoding::message::encoded_len_repeated(7, &self.extension)
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(8, v))
            + self
                .source_code_info
                .as_ref()
                .map_or(0, |v| encoding::message::encoded_len(9, v))
            + encoding::int32::encoded_len_repeated(10, &self.public_dependency)
            + encoding::int32::encoded_len_repeated(11, &self.weak_dependency)
            + self.syntax.as_ref().map_or(0, |v| encoding::string::encoded_len(12, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// A `message` declaration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DescriptorProto {
    pub name: Option<String>,
    pub field: Vec<FieldDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub extension_range: Vec<descriptor_proto::ExtensionRange>,
    pub oneof_decl: Vec<OneofDescriptorProto>,
    pub options: Option<MessageOptions>,
    pub reserved_range: Vec<descriptor_proto::ReservedRange>,
    pub reserved_name: Vec<String>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for DescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        encoding::message::encode_repeated(2, &self.field, buf);
        encoding::message::encode_repeated(3, &self.nested_type, buf);
        encoding::message::encode_repeated(4, &self.enum_type, buf);
        encoding::message::encode_repeated(5, &self.extension_range, buf);
        encoding::message::encode_repeated(6, &self.extension, buf);
        if let Some(v) = &self.options {
            encoding::message::encode(7, v, buf);
        }
        encoding::message::encode_repeated(8, &self.oneof_decl, buf);
        encoding::message::encode_repeated(9, &self.reserved_range, buf);
        encoding::string::encode_repeated(10, &self.reserved_name, buf);
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::message::merge_repeated(wire_type, &mut self.field, buf, ctx),
            3 => encoding::message::merge_repeated(wire_type, &mut self.nested_type, buf, ctx),
            4 => encoding::message::merge_repeated(wire_type, &mut self.enum_type, buf, ctx),
            5 => encoding::message::merge_repeated(wire_type, &mut self.extension_range, buf, ctx),
            6 => encoding::message::merge_repeated(wire_type, &mut self.extension, buf, ctx),
            7 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            8 => encoding::message::merge_repeated(wire_type, &mut self.oneof_decl, buf, ctx),
            9 => encoding::message::merge_repeated(wire_type, &mut self.reserved_range, buf, ctx),
            10 => encoding::string::merge_repeated(wire_type, &mut self.reserved_name, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + encoding::message::encoded_len_repeated(2, &self.field)
            + encoding::message::encoded_len_repeated(3, &self.nested_type)
            + encoding::message::encoded_len_repeated(4, &self.enum_type)
            + encoding::message::encoded_len_repeated(5, &self.extension_range)
            + encoding::message::encoded_len_repeated(6, &self.extension)
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(7, v))
            + encoding::message::encoded_len_repeated(8, &self.oneof_decl)
            + encoding::message::encoded_len_repeated(9, &self.reserved_range)
            + encoding::string::encoded_len_repeated(10, &self.reserved_name)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// Nested types declared only inside [`DescriptorProto`].
pub mod descriptor_proto {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct ExtensionRange {
        pub start: Option<i32>,
        pub end: Option<i32>,
        pub options: Option<ExtensionRangeOptions>,
        pub unknown_fields: UnknownFieldSet,
    }

    impl Message for ExtensionRange {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            if let Some(v) = &self.start {
                encoding::int32::encode(1, v, buf);
            }
            if let Some(v) = &self.end {
                encoding::int32::encode(2, v, buf);
            }
            if let Some(v) = &self.options {
                encoding::message::encode(3, v, buf);
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            tag: u32,
            wire_type: WireType,
            buf: &mut impl Buf,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            match tag {
                1 => encoding::int32::merge(wire_type, self.start.get_or_insert(0), buf, ctx),
                2 => encoding::int32::merge(wire_type, self.end.get_or_insert(0), buf, ctx),
                3 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
                _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            self.start.as_ref().map_or(0, |v| encoding::int32::encoded_len(1, v))
                + self.end.as_ref().map_or(0, |v| encoding::int32::encoded_len(2, v))
                + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(3, v))
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            *self = Default::default();
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct ReservedRange {
        pub start: Option<i32>,
        pub end: Option<i32>,
        pub unknown_fields: UnknownFieldSet,
    }

    impl Message for ReservedRange {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            if let Some(v) = &self.start {
                encoding::int32::encode(1, v, buf);
            }
            if let Some(v) = &self.end {
                encoding::int32::encode(2, v, buf);
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            tag: u32,
            wire_type: WireType,
            buf: &mut impl Buf,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            match tag {
                1 => encoding::int32::merge(wire_type, self.start.get_or_insert(0), buf, ctx),
                2 => encoding::int32::merge(wire_type, self.end.get_or_insert(0), buf, ctx),
                _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            self.start.as_ref().map_or(0, |v| encoding::int32::encoded_len(1, v))
                + self.end.as_ref().map_or(0, |v| encoding::int32::encoded_len(2, v))
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            *self = Default::default();
        }
    }
}

/// Placeholder for proto2 extension-range options; the toolkit doesn't
/// interpret extensions, so only round-tripping matters.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtensionRangeOptions {
    pub unknown_fields: UnknownFieldSet,
}

impl Message for ExtensionRangeOptions {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        self.unknown_fields.merge_field(tag, wire_type, buf, ctx)
    }

    fn encoded_len(&self) -> usize {
        self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.unknown_fields.clear();
    }
}

/// A single field of a message, oneof member, or extension.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldDescriptorProto {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub label: Option<i32>,
    pub r#type: Option<i32>,
    pub type_name: Option<String>,
    pub extendee: Option<String>,
    pub default_value: Option<String>,
    pub oneof_index: Option<i32>,
    pub json_name: Option<String>,
    pub options: Option<FieldOptions>,
    pub proto3_optional: Option<bool>,
    pub unknown_fields: UnknownFieldSet,
}

impl FieldDescriptorProto {
    pub fn r#type(&self) -> field_descriptor_proto::Type {
        self.r#type
            .and_then(field_descriptor_proto::Type::from_i32)
            .unwrap_or(field_descriptor_proto::Type::Double)
    }

    pub fn label(&self) -> field_descriptor_proto::Label {
        self.label
            .and_then(field_descriptor_proto::Label::from_i32)
            .unwrap_or(field_descriptor_proto::Label::Optional)
    }
}

impl Message for FieldDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.extendee {
            encoding::string::encode(2, v, buf);
        }
        if let Some(v) = &self.number {
            encoding::int32::encode(3, v, buf);
        }
        if let Some(v) = &self.label {
            encoding::enumeration::encode(4, v, buf);
        }
        if let Some(v) = &self.r#type {
            encoding::enumeration::encode(5, v, buf);
        }
        if let Some(v) = &self.type_name {
            encoding::string::encode(6, v, buf);
        }
        if let Some(v) = &self.default_value {
            encoding::string::encode(7, v, buf);
        }
        if let Some(v) = &self.options {
            encoding::message::encode(8, v, buf);
        }
        if let Some(v) = &self.oneof_index {
            encoding::int32::encode(9, v, buf);
        }
        if let Some(v) = &self.json_name {
            encoding::string::encode(10, v, buf);
        }
        if let Some(v) = &self.proto3_optional {
            encoding::bool::encode(17, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::string::merge(wire_type, self.extendee.get_or_insert_with(String::new), buf, ctx),
            3 => encoding::int32::merge(wire_type, self.number.get_or_insert(0), buf, ctx),
            4 => encoding::enumeration::merge(wire_type, self.label.get_or_insert(0), buf, ctx),
            5 => encoding::enumeration::merge(wire_type, self.r#type.get_or_insert(0), buf, ctx),
            6 => encoding::string::merge(wire_type, self.type_name.get_or_insert_with(String::new), buf, ctx),
            7 => encoding::string::merge(wire_type, self.default_value.get_or_insert_with(String::new), buf, ctx),
            8 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            9 => encoding::int32::merge(wire_type, self.oneof_index.get_or_insert(0), buf, ctx),
            10 => encoding::string::merge(wire_type, self.json_name.get_or_insert_with(String::new), buf, ctx),
            17 => encoding::bool::merge(wire_type, self.proto3_optional.get_or_insert(false), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self.extendee.as_ref().map_or(0, |v| encoding::string::encoded_len(2, v))
            + self.number.as_ref().map_or(0, |v| encoding::int32::encoded_len(3, v))
            + self.label.as_ref().map_or(0, |v| encoding::enumeration::encoded_len(4, v))
            + self.r#type.as_ref().map_or(0, |v| encoding::enumeration::encoded_len(5, v))
            + self.type_name.as_ref().map_or(0, |v| encoding::string::encoded_len(6, v))
            + self
                .default_value
                .as_ref()
                .map_or(0, |v| encoding::string::encoded_len(7, v))
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(8, v))
            + self
                .oneof_index
                .as_ref()
                .map_or(0, |v| encoding::int32::encoded_len(9, v))
            + self
                .json_name
                .as_ref()
                .map_or(0, |v| encoding::string::encoded_len(10, v))
            + self
                .proto3_optional
                .as_ref()
                .map_or(0, |v| encoding::bool::encoded_len(17, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

pub mod field_descriptor_proto {
    /// Wire representation of a field's declared type (§4.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(i32)]
    pub enum Type {
        Double = 1,
        Float = 2,
        Int64 = 3,
        Uint64 = 4,
        Int32 = 5,
        Fixed64 = 6,
        Fixed32 = 7,
        Bool = 8,
        String = 9,
        Group = 10,
        Message = 11,
        Bytes = 12,
        Uint32 = 13,
        Enum = 14,
        Sfixed32 = 15,
        Sfixed64 = 16,
        Sint32 = 17,
        Sint64 = 18,
    }

    impl Type {
        pub fn from_i32(value: i32) -> Option<Self> {
            use Type::*;
            Some(match value {
                1 => Double,
                2 => Float,
                3 => Int64,
                4 => Uint64,
                5 => Int32,
                6 => Fixed64,
                7 => Fixed32,
                8 => Bool,
                9 => String,
                10 => Group,
                11 => Message,
                12 => Bytes,
                13 => Uint32,
                14 => Enum,
                15 => Sfixed32,
                16 => Sfixed64,
                17 => Sint32,
                18 => Sint64,
                _ => return None,
            })
        }

        /// Whether this type is length-delimited on the wire with varint
        /// framing, the one case `packed` cannot apply to.
        pub fn is_length_delimited(self) -> bool {
            matches!(self, Type::String | Type::Bytes | Type::Message)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(i32)]
    pub enum Label {
        Optional = 1,
        Required = 2,
        Repeated = 3,
    }

    impl Label {
        pub fn from_i32(value: i32) -> Option<Self> {
            Some(match value {
                1 => Label::Optional,
                2 => Label::Required,
                3 => Label::Repeated,
                _ => return None,
            })
        }
    }
}

/// A `oneof` declaration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OneofDescriptorProto {
    pub name: Option<String>,
    pub options: Option<OneofOptions>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for OneofDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.options {
            encoding::message::encode(2, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(2, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// An `enum` declaration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnumDescriptorProto {
    pub name: Option<String>,
    pub value: Vec<EnumValueDescriptorProto>,
    pub options: Option<EnumOptions>,
    pub reserved_range: Vec<enum_descriptor_proto::EnumReservedRange>,
    pub reserved_name: Vec<String>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for EnumDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        encoding::message::encode_repeated(2, &self.value, buf);
        if let Some(v) = &self.options {
            encoding::message::encode(3, v, buf);
        }
        encoding::message::encode_repeated(4, &self.reserved_range, buf);
        encoding::string::encode_repeated(5, &self.reserved_name, buf);
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::message::merge_repeated(wire_type, &mut self.value, buf, ctx),
            3 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            4 => encoding::message::merge_repeated(wire_type, &mut self.reserved_range, buf, ctx),
            5 => encoding::string::merge_repeated(wire_type, &mut self.reserved_name, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + encoding::message::encoded_len_repeated(2, &self.value)
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(3, v))
            + encoding::message::encoded_len_repeated(4, &self.reserved_range)
            + encoding::string::encoded_len_repeated(5, &self.reserved_name)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

pub mod enum_descriptor_proto {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct EnumReservedRange {
        pub start: Option<i32>,
        pub end: Option<i32>,
        pub unknown_fields: UnknownFieldSet,
    }

    impl Message for EnumReservedRange {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            if let Some(v) = &self.start {
                encoding::int32::encode(1, v, buf);
            }
            if let Some(v) = &self.end {
                encoding::int32::encode(2, v, buf);
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            tag: u32,
            wire_type: WireType,
            buf: &mut impl Buf,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            match tag {
                1 => encoding::int32::merge(wire_type, self.start.get_or_insert(0), buf, ctx),
                2 => encoding::int32::merge(wire_type, self.end.get_or_insert(0), buf, ctx),
                _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            self.start.as_ref().map_or(0, |v| encoding::int32::encoded_len(1, v))
                + self.end.as_ref().map_or(0, |v| encoding::int32::encoded_len(2, v))
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            *self = Default::default();
        }
    }
}

/// One named value of an `enum`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnumValueDescriptorProto {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub options: Option<EnumValueOptions>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for EnumValueDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.number {
            encoding::int32::encode(2, v, buf);
        }
        if let Some(v) = &self.options {
            encoding::message::encode(3, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::int32::merge(wire_type, self.number.get_or_insert(0), buf, ctx),
            3 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self.number.as_ref().map_or(0, |v| encoding::int32::encoded_len(2, v))
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(3, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// An RPC `service` declaration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ServiceDescriptorProto {
    pub name: Option<String>,
    pub method: Vec<MethodDescriptorProto>,
    pub options: Option<ServiceOptions>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for ServiceDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        encoding::message::encode_repeated(2, &self.method, buf);
        if let Some(v) = &self.options {
            encoding::message::encode(3, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::message::merge_repeated(wire_type, &mut self.method, buf, ctx),
            3 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + encoding::message::encoded_len_repeated(2, &self.method)
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(3, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// One RPC method of a [`ServiceDescriptorProto`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MethodDescriptorProto {
    pub name: Option<String>,
    pub input_type: Option<String>,
    pub output_type: Option<String>,
    pub options: Option<MethodOptions>,
    pub client_streaming: Option<bool>,
    pub server_streaming: Option<bool>,
    pub unknown_fields: UnknownFieldSet,
}

impl MethodDescriptorProto {
    pub fn is_client_streaming(&self) -> bool {
        self.client_streaming.unwrap_or(false)
    }

    pub fn is_server_streaming(&self) -> bool {
        self.server_streaming.unwrap_or(false)
    }
}

impl Message for MethodDescriptorProto {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.name {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.input_type {
            encoding::string::encode(2, v, buf);
        }
        if let Some(v) = &self.output_type {
            encoding::string::encode(3, v, buf);
        }
        if let Some(v) = &self.options {
            encoding::message::encode(4, v, buf);
        }
        if let Some(v) = &self.client_streaming {
            encoding::bool::encode(5, v, buf);
        }
        if let Some(v) = &self.server_streaming {
            encoding::bool::encode(6, v, buf);
        }
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::string::merge(wire_type, self.name.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::string::merge(wire_type, self.input_type.get_or_insert_with(String::new), buf, ctx),
            3 => encoding::string::merge(wire_type, self.output_type.get_or_insert_with(String::new), buf, ctx),
            4 => encoding::message::merge(wire_type, self.options.get_or_insert_with(Default::default), buf, ctx),
            5 => encoding::bool::merge(wire_type, self.client_streaming.get_or_insert(false), buf, ctx),
            6 => encoding::bool::merge(wire_type, self.server_streaming.get_or_insert(false), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self
                .input_type
                .as_ref()
                .map_or(0, |v| encoding::string::encoded_len(2, v))
            + self
                .output_type
                .as_ref()
                .map_or(0, |v| encoding::string::encoded_len(3, v))
            + self.options.as_ref().map_or(0, |v| encoding::message::encoded_len(4, v))
            + self
                .client_streaming
                .as_ref()
                .map_or(0, |v| encoding::bool::encoded_len(5, v))
            + self
                .server_streaming
                .as_ref()
                .map_or(0, |v| encoding::bool::encoded_len(6, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

macro_rules! options_message {
    ($name:ident { $($field:ident : $tag:expr => $kind:ident),* $(,)? }) => {
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct $name {
            $(pub $field: Option<options_message!(@ty $kind)>,)*
            pub unknown_fields: UnknownFieldSet,
        }

        impl Message for $name {
            fn encode_raw(&self, buf: &mut impl BufMut) {
                $(if let Some(v) = &self.$field {
                    encoding::$kind::encode($tag, v, buf);
                })*
                self.unknown_fields.encode_raw(buf);
            }

            fn merge_field(
                &mut self,
                tag: u32,
                wire_type: WireType,
                buf: &mut impl Buf,
                ctx: DecodeContext,
            ) -> Result<(), DecodeError> {
                match tag {
                    $($tag => encoding::$kind::merge(wire_type, self.$field.get_or_insert(Default::default()), buf, ctx),)*
                    _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
                }
            }

            fn encoded_len(&self) -> usize {
                0 $(+ self.$field.as_ref().map_or(0, |v| encoding::$kind::encoded_len($tag, v)))*
                    + self.unknown_fields.encoded_len()
            }

            fn clear(&mut self) {
                *self = Default::default();
            }
        }
    };

    (@ty bool) => { bool };
}

options_message!(FileOptions {
    deprecated: 23 => bool,
});

options_message!(MessageOptions {
    map_entry: 7 => bool,
    deprecated: 3 => bool,
});

options_message!(FieldOptions {
    packed: 2 => bool,
    deprecated: 3 => bool,
});

options_message!(OneofOptions {});

options_message!(EnumOptions {
    allow_alias: 2 => bool,
    deprecated: 3 => bool,
});

options_message!(EnumValueOptions {
    deprecated: 1 => bool,
});

options_message!(ServiceOptions {
    deprecated: 33 => bool,
});

options_message!(MethodOptions {
    deprecated: 33 => bool,
});

impl MessageOptions {
    pub fn is_map_entry(&self) -> bool {
        self.map_entry.unwrap_or(false)
    }
}

/// Comment and span metadata emitted alongside a descriptor, keyed by the
/// path of field-number/index pairs that locates the element it describes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SourceCodeInfo {
    pub location: Vec<source_code_info::Location>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for SourceCodeInfo {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::message::encode_repeated(1, &self.location, buf);
        self.unknown_fields.encode_raw(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::message::merge_repeated(wire_type, &mut self.location, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::message::encoded_len_repeated(1, &self.location) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

pub mod source_code_info {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Location {
        pub path: Vec<i32>,
        pub span: Vec<i32>,
        pub leading_comments: Option<String>,
        pub trailing_comments: Option<String>,
        pub leading_detached_comments: Vec<String>,
        pub unknown_fields: UnknownFieldSet,
    }

    impl Message for Location {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            encoding::int32::encode_packed(1, &self.path, buf);
            encoding::int32::encode_packed(2, &self.span, buf);
            if let Some(v) = &self.leading_comments {
                encoding::string::encode(3, v, buf);
            }
            if let Some(v) = &self.trailing_comments {
                encoding::string::encode(4, v, buf);
            }
            encoding::string::encode_repeated(6, &self.leading_detached_comments, buf);
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            tag: u32,
            wire_type: WireType,
            buf: &mut impl Buf,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            match tag {
                1 => encoding::int32::merge_repeated(wire_type, &mut self.path, buf, ctx),
                2 => encoding::int32::merge_repeated(wire_type, &mut self.span, buf, ctx),
                3 => encoding::string::merge(
                    wire_type,
                    self.leading_comments.get_or_insert_with(String::new),
                    buf,
                    ctx,
                ),
                4 => encoding::string::merge(
                    wire_type,
                    self.trailing_comments.get_or_insert_with(String::new),
                    buf,
                    ctx,
                ),
                6 => encoding::string::merge_repeated(wire_type, &mut self.leading_detached_comments, buf, ctx),
                _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            encoding::int32::encoded_len_packed(1, &self.path)
                + encoding::int32::encoded_len_packed(2, &self.span)
                + self
                    .leading_comments
                    .as_ref()
                    .map_or(0, |v| encoding::string::encoded_len(3, v))
                + self
                    .trailing_comments
                    .as_ref()
                    .map_or(0, |v| encoding::string::encoded_len(4, v))
                + encoding::string::encoded_len_repeated(6, &self.leading_detached_comments)
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            *self = Default::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_message_with_a_repeated_field_and_nested_options() {
        let file = FileDescriptorProto {
            name: Some("widget.proto".to_string()),
            package: Some("widgets.v1".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Widget".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("id".to_string()),
                    number: Some(1),
                    label: Some(field_descriptor_proto::Label::Optional as i32),
                    r#type: Some(field_descriptor_proto::Type::Uint32 as i32),
                    json_name: Some("id".to_string()),
                    ..Default::default()
                }],
                options: Some(MessageOptions {
                    map_entry: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        };

        let bytes = file.encode_to_vec();
        let decoded = FileDescriptorProto::decode(&bytes[..]).unwrap();
        assert_eq!(file, decoded);
        assert_eq!(decoded.message_type[0].field[0].r#type(), field_descriptor_proto::Type::Uint32);
    }

    #[test]
    fn unrecognized_fields_survive_a_round_trip() {
        let mut options = FieldOptions {
            packed: Some(true),
            ..Default::default()
        };
        options.unknown_fields.push(200, protokit::UnknownField::Varint(7));

        let bytes = options.encode_to_vec();
        let decoded = FieldOptions::decode(&bytes[..]).unwrap();
        assert_eq!(options, decoded);
    }
}
