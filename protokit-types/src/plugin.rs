//! Hand-written equivalent of `google/protobuf/compiler/plugin.proto`: the
//! wire contract `protoc` (or the `protokit-link` driver) speaks with a code
//! generator plugin over stdin/stdout (§7.3).

use bytes::{Buf, BufMut};

use protokit::encoding::{self, DecodeContext, WireType};
use protokit::{DecodeError, Message, UnknownFieldSet};

use crate::descriptor::FileDescriptorProto;

/// Everything a generator plugin needs to produce output for one `protoc`
/// invocation: which files to generate, the command-line parameter string,
/// and every file's fully linked descriptor (dependencies included).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CodeGeneratorRequest {
    pub file_to_generate: Vec<String>,
    pub parameter: Option<String>,
    pub proto_file: Vec<FileDescriptorProto>,
    pub compiler_version: Option<Version>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for CodeGeneratorRequest {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encoding::string::encode_repeated(1, &self.file_to_generate, buf);
        if let Some(v) = &self.parameter {
            encoding::string::encode(2, v, buf);
        }
        if let Some(v) = &self.compiler_version {
            encoding::message::encode(3, v, buf);
        }
        encoding::message::encode_repeated(15, &self.proto_file, buf);
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
            1 => encoding::string::merge_repeated(wire_type, &mut self.file_to_generate, buf, ctx),
            2 => encoding::string::merge(wire_type, self.parameter.get_or_insert_with(String::new), buf, ctx),
            3 => encoding::message::merge(
                wire_type,
                self.compiler_version.get_or_insert_with(Default::default),
                buf,
                ctx,
            ),
            15 => encoding::message::merge_repeated(wire_type, &mut self.proto_file, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::string::encoded_len_repeated(1, &self.file_to_generate)
            + self
                .parameter
                .as_ref()
                .map_or(0, |v| encoding::string::encoded_len(2, v))
            + self
                .compiler_version
                .as_ref()
                .map_or(0, |v| encoding::message::encoded_len(3, v))
            + encoding::message::encoded_len_repeated(15, &self.proto_file)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// The `protoc` release a request was generated by; plugins that don't care
/// about version skew can ignore it entirely.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Version {
    pub major: Option<i32>,
    pub minor: Option<i32>,
    pub patch: Option<i32>,
    pub suffix: Option<String>,
    pub unknown_fields: UnknownFieldSet,
}

impl Message for Version {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.major {
            encoding::int32::encode(1, v, buf);
        }
        if let Some(v) = &self.minor {
            encoding::int32::encode(2, v, buf);
        }
        if let Some(v) = &self.patch {
            encoding::int32::encode(3, v, buf);
        }
        if let Some(v) = &self.suffix {
            encoding::string::encode(4, v, buf);
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
            1 => encoding::int32::merge(wire_type, self.major.get_or_insert(0), buf, ctx),
            2 => encoding::int32::merge(wire_type, self.minor.get_or_insert(0), buf, ctx),
            3 => encoding::int32::merge(wire_type, self.patch.get_or_insert(0), buf, ctx),
            4 => encoding::string::merge(wire_type, self.suffix.get_or_insert_with(String::new), buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.major.as_ref().map_or(0, |v| encoding::int32::encoded_len(1, v))
            + self.minor.as_ref().map_or(0, |v| encoding::int32::encoded_len(2, v))
            + self.patch.as_ref().map_or(0, |v| encoding::int32::encoded_len(3, v))
            + self.suffix.as_ref().map_or(0, |v| encoding::string::encoded_len(4, v))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// A generator's reply: either a top-level error that aborts the whole
/// invocation, or the set of files to write.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CodeGeneratorResponse {
    pub error: Option<String>,
    pub supported_features: Option<u64>,
    pub file: Vec<code_generator_response::File>,
    pub unknown_fields: UnknownFieldSet,
}

impl CodeGeneratorResponse {
    /// The one feature this toolkit's generator advertises: proto3-optional
    /// synthetic-oneof support (`FEATURE_PROTO3_OPTIONAL = 1` upstream).
    pub const FEATURE_PROTO3_OPTIONAL: u64 = 1;
}

impl Message for CodeGeneratorResponse {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if let Some(v) = &self.error {
            encoding::string::encode(1, v, buf);
        }
        if let Some(v) = &self.supported_features {
            encoding::uint64::encode(2, v, buf);
        }
        encoding::message::encode_repeated(15, &self.file, buf);
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
            1 => encoding::string::merge(wire_type, self.error.get_or_insert_with(String::new), buf, ctx),
            2 => encoding::uint64::merge(wire_type, self.supported_features.get_or_insert(0), buf, ctx),
            15 => encoding::message::merge_repeated(wire_type, &mut self.file, buf, ctx),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.error.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
            + self
                .supported_features
                .as_ref()
                .map_or(0, |v| encoding::uint64::encoded_len(2, v))
            + encoding::message::encoded_len_repeated(15, &self.file)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

pub mod code_generator_response {
    use super::*;

    /// One output file, or an insertion into a file a prior plugin in the
    /// chain already emitted (the `insertion_point` mechanism).
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct File {
        pub name: Option<String>,
        pub insertion_point: Option<String>,
        pub content: Option<String>,
        pub unknown_fields: UnknownFieldSet,
    }

    impl Message for File {
        fn encode_raw(&self, buf: &mut impl BufMut) {
            if let Some(v) = &self.name {
                encoding::string::encode(1, v, buf);
            }
            if let Some(v) = &self.insertion_point {
                encoding::string::encode(2, v, buf);
            }
            if let Some(v) = &self.content {
                encoding::string::encode(15, v, buf);
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
                2 => encoding::string::merge(
                    wire_type,
                    self.insertion_point.get_or_insert_with(String::new),
                    buf,
                    ctx,
                ),
                15 => encoding::string::merge(wire_type, self.content.get_or_insert_with(String::new), buf, ctx),
                _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            self.name.as_ref().map_or(0, |v| encoding::string::encoded_len(1, v))
                + self
                    .insertion_point
                    .as_ref()
                    .map_or(0, |v| encoding::string::encoded_len(2, v))
                + self
                    .content
                    .as_ref()
                    .map_or(0, |v| encoding::string::encoded_len(15, v))
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
    fn round_trips_a_request_and_response() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["widget.proto".to_string()],
            parameter: Some("experimental_allow_proto3_optional=true".to_string()),
            ..Default::default()
        };
        let bytes = request.encode_to_vec();
        assert_eq!(CodeGeneratorRequest::decode(&bytes[..]).unwrap(), request);

        let response = CodeGeneratorResponse {
            supported_features: Some(CodeGeneratorResponse::FEATURE_PROTO3_OPTIONAL),
            file: vec![code_generator_response::File {
                name: Some("widget.rs".to_string()),
                content: Some("pub struct Widget;".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bytes = response.encode_to_vec();
        assert_eq!(CodeGeneratorResponse::decode(&bytes[..]).unwrap(), response);
    }
}
