//! Turns a [`FileDescriptorProto`] into the same [`protokit_front::File`]
//! AST the parser produces, so `protokit-gen` can drive off a `protoc`
//! plugin's descriptor set instead of lexed `.proto` text (§4.7).
//!
//! Descriptor `type_name` references are always absolute
//! (`.package.Outer.Inner`); the linker expects the same references the
//! parser would have produced from source, so every reference is stripped
//! of its leading dot and, when it shares the file's own package, of that
//! package prefix too. The result still resolves to the identical absolute
//! name through the linker's unmodified scope-chain walk.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use protokit_front::{
    Constant, Enum, EnumValue, Extend, Field, File, Label, Location, MapField, Message, Method,
    NumberRange, OneOf, OptionEntry, OptionName, ScalarType, Service, Syntax, TypeRef,
};
use protokit_types::descriptor::{
    descriptor_proto, enum_descriptor_proto, field_descriptor_proto, DescriptorProto,
    EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    MethodDescriptorProto, ServiceDescriptorProto,
};

const MAX_FIELD_NUMBER: i32 = (1 << 29) - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    MissingName(&'static str),
    UnsupportedType { field: String, reason: String },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::MissingName(what) => write!(f, "descriptor is missing a required {what} name"),
            ConvertError::UnsupportedType { field, reason } => write!(f, "field '{field}': {reason}"),
        }
    }
}

impl std::error::Error for ConvertError {}

fn loc(file_name: &str) -> Location {
    Location::new(Arc::from(file_name), 1, 1)
}

/// Strips the leading dot from an absolute descriptor type name, then the
/// current file's package prefix if the name shares it, mirroring the
/// reference form the parser hands the linker.
fn normalize_type_name(type_name: &str, package: &str) -> String {
    let bare = type_name.trim_start_matches('.');
    if package.is_empty() {
        return bare.to_string();
    }
    let prefix = format!("{package}.");
    match bare.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => format!(".{bare}"),
    }
}

fn convert_range(start: Option<i32>, end: Option<i32>) -> NumberRange {
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(start + 1);
    let end = if end > MAX_FIELD_NUMBER { i32::MAX } else { end - 1 };
    NumberRange { start, end }
}

fn convert_reserved_range(r: &descriptor_proto::ReservedRange) -> NumberRange {
    convert_range(r.start, r.end)
}

fn convert_extension_range(r: &descriptor_proto::ExtensionRange) -> NumberRange {
    convert_range(r.start, r.end)
}

/// Enum reserved ranges are inclusive on both ends in the wire format,
/// unlike message reserved ranges and extension ranges.
fn convert_enum_reserved_range(r: &enum_descriptor_proto::EnumReservedRange) -> NumberRange {
    NumberRange {
        start: r.start.unwrap_or(0),
        end: r.end.unwrap_or(i32::MAX),
    }
}

fn convert_label(fd: &FieldDescriptorProto, syntax: Syntax) -> Label {
    match fd.label() {
        field_descriptor_proto::Label::Repeated => Label::Repeated,
        field_descriptor_proto::Label::Required => Label::Required,
        field_descriptor_proto::Label::Optional => {
            if syntax == Syntax::Proto3 {
                Label::Implicit
            } else {
                Label::Optional
            }
        }
    }
}

fn convert_type_ref(fd: &FieldDescriptorProto, package: &str) -> TypeRef {
    use field_descriptor_proto::Type;
    match fd.r#type() {
        Type::Double => TypeRef::Scalar(ScalarType::Double),
        Type::Float => TypeRef::Scalar(ScalarType::Float),
        Type::Int64 => TypeRef::Scalar(ScalarType::Int64),
        Type::Uint64 => TypeRef::Scalar(ScalarType::Uint64),
        Type::Int32 => TypeRef::Scalar(ScalarType::Int32),
        Type::Fixed64 => TypeRef::Scalar(ScalarType::Fixed64),
        Type::Fixed32 => TypeRef::Scalar(ScalarType::Fixed32),
        Type::Bool => TypeRef::Scalar(ScalarType::Bool),
        Type::String => TypeRef::Scalar(ScalarType::String),
        Type::Bytes => TypeRef::Scalar(ScalarType::Bytes),
        Type::Uint32 => TypeRef::Scalar(ScalarType::Uint32),
        Type::Sfixed32 => TypeRef::Scalar(ScalarType::Sfixed32),
        Type::Sfixed64 => TypeRef::Scalar(ScalarType::Sfixed64),
        Type::Sint32 => TypeRef::Scalar(ScalarType::Sint32),
        Type::Sint64 => TypeRef::Scalar(ScalarType::Sint64),
        Type::Enum | Type::Message | Type::Group => {
            TypeRef::Named(normalize_type_name(fd.type_name.as_deref().unwrap_or_default(), package))
        }
    }
}

fn field_options(fd: &FieldDescriptorProto, location: &Location) -> Vec<OptionEntry> {
    let mut options = Vec::new();
    if let Some(packed) = fd.options.as_ref().and_then(|o| o.packed) {
        options.push(OptionEntry {
            name: OptionName::simple("packed"),
            value: Constant::Bool(packed),
            location: location.clone(),
        });
    }
    options
}

fn convert_field(
    fd: &FieldDescriptorProto,
    package: &str,
    label: Label,
    oneof_index: Option<usize>,
    location: &Location,
) -> Result<Field, ConvertError> {
    let name = fd.name.clone().ok_or(ConvertError::MissingName("field"))?;
    if fd.r#type() == field_descriptor_proto::Type::Group {
        return Err(ConvertError::UnsupportedType {
            field: name,
            reason: "group-typed fields have no source-level representation in this toolkit".to_string(),
        });
    }
    Ok(Field {
        name,
        number: fd.number.unwrap_or(0),
        label,
        ty: convert_type_ref(fd, package),
        options: field_options(fd, location),
        oneof_index,
        location: location.clone(),
    })
}

fn convert_map_field(
    fd: &FieldDescriptorProto,
    entry: &DescriptorProto,
    package: &str,
    location: &Location,
) -> Result<MapField, ConvertError> {
    let name = fd.name.clone().ok_or(ConvertError::MissingName("field"))?;
    let key_field = entry.field.first().ok_or_else(|| ConvertError::UnsupportedType {
        field: name.clone(),
        reason: "map entry type has no key field".to_string(),
    })?;
    let value_field = entry.field.get(1).ok_or_else(|| ConvertError::UnsupportedType {
        field: name.clone(),
        reason: "map entry type has no value field".to_string(),
    })?;
    let key = match convert_type_ref(key_field, package) {
        TypeRef::Scalar(scalar) => scalar,
        TypeRef::Named(_) => {
            return Err(ConvertError::UnsupportedType {
                field: name,
                reason: "map key must be a scalar type".to_string(),
            })
        }
    };
    Ok(MapField {
        name,
        number: fd.number.unwrap_or(0),
        key,
        value: convert_type_ref(value_field, package),
        options: Vec::new(),
        location: location.clone(),
    })
}

/// Groups a flat list of extension fields (as the wire format stores them)
/// by their `extendee`, preserving first-seen order. Extension fields
/// always carry an explicit label, the same as proto2 message fields, so
/// label conversion runs as if the enclosing syntax were proto2 regardless
/// of the file's actual syntax.
fn group_extends(fields: &[FieldDescriptorProto], package: &str, location: &Location) -> Result<Vec<Extend>, ConvertError> {
    let mut order: Vec<String> = Vec::new();
    let mut by_extendee: HashMap<String, Vec<Field>> = HashMap::new();
    for fd in fields {
        let extendee = normalize_type_name(fd.extendee.as_deref().unwrap_or_default(), package);
        let label = convert_label(fd, Syntax::Proto2);
        let field = convert_field(fd, package, label, None, location)?;
        by_extendee.entry(extendee.clone()).or_insert_with(|| {
            order.push(extendee.clone());
            Vec::new()
        }).push(field);
    }
    Ok(order
        .into_iter()
        .map(|extendee| Extend {
            fields: by_extendee.remove(&extendee).unwrap_or_default(),
            extendee: TypeRef::Named(extendee),
            location: location.clone(),
        })
        .collect())
}

fn convert_message(d: &DescriptorProto, package: &str, syntax: Syntax, scope: &str, file_name: &str) -> Result<Message, ConvertError> {
    let location = loc(file_name);
    let name = d.name.clone().ok_or(ConvertError::MissingName("message"))?;
    let own_scope = format!("{scope}.{name}");

    let mut map_entries: HashMap<String, &DescriptorProto> = HashMap::new();
    for nested in &d.nested_type {
        if nested.options.as_ref().map_or(false, |o| o.is_map_entry()) {
            if let Some(nested_name) = &nested.name {
                map_entries.insert(format!("{own_scope}.{nested_name}"), nested);
            }
        }
    }

    let mut fields = Vec::new();
    let mut map_fields = Vec::new();
    let mut oneof_members: Vec<(usize, &FieldDescriptorProto)> = Vec::new();

    for fd in &d.field {
        if fd.r#type() == field_descriptor_proto::Type::Message {
            if let Some(entry) = fd.type_name.as_deref().and_then(|n| map_entries.get(n)) {
                map_fields.push(convert_map_field(fd, entry, package, &location)?);
                continue;
            }
        }
        if fd.proto3_optional.unwrap_or(false) {
            fields.push(convert_field(fd, package, Label::Optional, None, &location)?);
            continue;
        }
        if let Some(idx) = fd.oneof_index {
            oneof_members.push((idx as usize, fd));
            continue;
        }
        let label = convert_label(fd, syntax);
        fields.push(convert_field(fd, package, label, None, &location)?);
    }

    // Oneofs with every member routed to a synthetic proto3-optional field
    // above never show up here, so the surviving oneofs list is already
    // compacted; member `oneof_index` values are remapped to match.
    let mut real_indices: Vec<usize> = Vec::new();
    for (idx, _) in &oneof_members {
        if !real_indices.contains(idx) {
            real_indices.push(*idx);
        }
    }
    real_indices.sort_unstable();
    let remap: HashMap<usize, usize> = real_indices.iter().enumerate().map(|(new, old)| (*old, new)).collect();

    for (old_idx, fd) in &oneof_members {
        let new_idx = remap[old_idx];
        fields.push(convert_field(fd, package, Label::Implicit, Some(new_idx), &location)?);
    }

    let oneofs = real_indices
        .iter()
        .map(|&idx| {
            let decl = &d.oneof_decl[idx];
            OneOf {
                name: decl.name.clone().unwrap_or_default(),
                options: Vec::new(),
                location: location.clone(),
            }
        })
        .collect();

    let nested_messages = d
        .nested_type
        .iter()
        .filter(|nested| !nested.options.as_ref().map_or(false, |o| o.is_map_entry()))
        .map(|nested| convert_message(nested, package, syntax, &own_scope, file_name))
        .collect::<Result<Vec<_>, _>>()?;

    let nested_enums = d.enum_type.iter().map(|e| convert_enum(e, file_name)).collect::<Result<Vec<_>, _>>()?;

    Ok(Message {
        name,
        fields,
        map_fields,
        oneofs,
        nested_messages,
        nested_enums,
        reserved_ranges: d.reserved_range.iter().map(convert_reserved_range).collect(),
        reserved_names: d.reserved_name.clone(),
        extension_ranges: d.extension_range.iter().map(convert_extension_range).collect(),
        extends: group_extends(&d.extension, package, &location)?,
        options: Vec::new(),
        location,
    })
}

fn convert_enum_value(v: &EnumValueDescriptorProto, location: &Location) -> Result<EnumValue, ConvertError> {
    Ok(EnumValue {
        name: v.name.clone().ok_or(ConvertError::MissingName("enum value"))?,
        number: v.number.unwrap_or(0),
        options: Vec::new(),
        location: location.clone(),
    })
}

fn convert_enum(e: &EnumDescriptorProto, file_name: &str) -> Result<Enum, ConvertError> {
    let location = loc(file_name);
    let name = e.name.clone().ok_or(ConvertError::MissingName("enum"))?;
    let values = e.value.iter().map(|v| convert_enum_value(v, &location)).collect::<Result<Vec<_>, _>>()?;

    let mut options = Vec::new();
    if let Some(allow_alias) = e.options.as_ref().and_then(|o| o.allow_alias) {
        options.push(OptionEntry {
            name: OptionName::simple("allow_alias"),
            value: Constant::Bool(allow_alias),
            location: location.clone(),
        });
    }

    Ok(Enum {
        name,
        values,
        options,
        reserved_ranges: e.reserved_range.iter().map(convert_enum_reserved_range).collect(),
        reserved_names: e.reserved_name.clone(),
        location,
    })
}

fn convert_method(m: &MethodDescriptorProto, package: &str, location: &Location) -> Result<Method, ConvertError> {
    Ok(Method {
        name: m.name.clone().ok_or(ConvertError::MissingName("method"))?,
        input_type: TypeRef::Named(normalize_type_name(m.input_type.as_deref().unwrap_or_default(), package)),
        client_streaming: m.is_client_streaming(),
        output_type: TypeRef::Named(normalize_type_name(m.output_type.as_deref().unwrap_or_default(), package)),
        server_streaming: m.is_server_streaming(),
        options: Vec::new(),
        location: location.clone(),
    })
}

fn convert_service(s: &ServiceDescriptorProto, package: &str, location: &Location) -> Result<Service, ConvertError> {
    Ok(Service {
        name: s.name.clone().ok_or(ConvertError::MissingName("service"))?,
        methods: s.method.iter().map(|m| convert_method(m, package, location)).collect::<Result<Vec<_>, _>>()?,
        options: Vec::new(),
        location: location.clone(),
    })
}

/// Converts one `FileDescriptorProto` into the AST the linker expects.
/// `protokit_link::link` is the caller's next step; it re-derives the
/// symbol table, resolves every `TypeRef::Named`, and validates the result
/// exactly as it would for parsed source.
pub fn convert_file(fd: &FileDescriptorProto) -> Result<File, ConvertError> {
    let file_name = fd.name.clone().ok_or(ConvertError::MissingName("file"))?;
    let syntax = match fd.syntax.as_deref() {
        Some("proto3") => Syntax::Proto3,
        _ => Syntax::Proto2,
    };
    let package = fd.package.clone().unwrap_or_default();
    let package_scope = if package.is_empty() { String::new() } else { format!(".{package}") };
    let location = loc(&file_name);

    let messages = fd
        .message_type
        .iter()
        .map(|m| convert_message(m, &package, syntax, &package_scope, &file_name))
        .collect::<Result<Vec<_>, _>>()?;
    let enums = fd.enum_type.iter().map(|e| convert_enum(e, &file_name)).collect::<Result<Vec<_>, _>>()?;
    let services = fd
        .service
        .iter()
        .map(|s| convert_service(s, &package, &location))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(File {
        name: file_name,
        syntax,
        package: fd.package.clone(),
        imports: Vec::new(),
        options: Vec::new(),
        messages,
        enums,
        services,
        extends: group_extends(&fd.extension, &package, &location)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_types::descriptor::{FieldOptions, MessageOptions, OneofDescriptorProto};

    fn field(name: &str, number: i32, ty: field_descriptor_proto::Type, label: field_descriptor_proto::Label) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(ty as i32),
            label: Some(label as i32),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_same_package_and_cross_package_names() {
        assert_eq!(normalize_type_name(".a.b.Outer.Inner", "a.b"), "Outer.Inner");
        assert_eq!(normalize_type_name(".a.b.Outer.Inner", "other"), ".a.b.Outer.Inner");
        assert_eq!(normalize_type_name(".Top", ""), "Top");
    }

    #[test]
    fn converts_plain_proto3_field_to_implicit_label() {
        let fd = field("name", 1, field_descriptor_proto::Type::String, field_descriptor_proto::Label::Optional);
        let field = convert_field(&fd, "", convert_label(&fd, Syntax::Proto3), None, &loc("a.proto")).unwrap();
        assert_eq!(field.label, Label::Implicit);
    }

    #[test]
    fn converts_proto2_optional_field_to_explicit_optional_label() {
        let fd = field("name", 1, field_descriptor_proto::Type::String, field_descriptor_proto::Label::Optional);
        let field = convert_field(&fd, "", convert_label(&fd, Syntax::Proto2), None, &loc("a.proto")).unwrap();
        assert_eq!(field.label, Label::Optional);
    }

    #[test]
    fn recognizes_map_entry_nested_types_as_map_fields() {
        let entry = DescriptorProto {
            name: Some("CountsEntry".to_string()),
            field: vec![
                field("key", 1, field_descriptor_proto::Type::String, field_descriptor_proto::Label::Optional),
                field("value", 2, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional),
            ],
            options: Some(MessageOptions {
                map_entry: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut map_field_descriptor = field("counts", 3, field_descriptor_proto::Type::Message, field_descriptor_proto::Label::Repeated);
        map_field_descriptor.type_name = Some(".pkg.Item.CountsEntry".to_string());

        let item = DescriptorProto {
            name: Some("Item".to_string()),
            field: vec![map_field_descriptor],
            nested_type: vec![entry],
            ..Default::default()
        };

        let message = convert_message(&item, "pkg", Syntax::Proto3, ".pkg", "a.proto").unwrap();
        assert!(message.fields.is_empty());
        assert_eq!(message.map_fields.len(), 1);
        assert_eq!(message.map_fields[0].key, ScalarType::String);
        assert_eq!(message.map_fields[0].value, TypeRef::Scalar(ScalarType::Int32));
        assert!(message.nested_messages.is_empty(), "map entry type must not also appear as a nested message");
    }

    #[test]
    fn proto3_optional_fields_are_flattened_and_skip_the_oneof_list() {
        let mut explicit_optional = field("maybe", 1, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        explicit_optional.proto3_optional = Some(true);
        explicit_optional.oneof_index = Some(0);

        let message = DescriptorProto {
            name: Some("M".to_string()),
            field: vec![explicit_optional],
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("_maybe".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let converted = convert_message(&message, "", Syntax::Proto3, "", "a.proto").unwrap();
        assert_eq!(converted.fields.len(), 1);
        assert_eq!(converted.fields[0].label, Label::Optional);
        assert_eq!(converted.fields[0].oneof_index, None);
        assert!(converted.oneofs.is_empty());
    }

    #[test]
    fn real_oneofs_keep_members_and_get_compacted_indices() {
        let mut a = field("a", 1, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        a.oneof_index = Some(1);
        let mut b = field("b", 2, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        b.oneof_index = Some(1);
        let mut synthetic = field("c", 3, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        synthetic.proto3_optional = Some(true);
        synthetic.oneof_index = Some(0);

        let message = DescriptorProto {
            name: Some("M".to_string()),
            field: vec![synthetic, a, b],
            oneof_decl: vec![
                OneofDescriptorProto {
                    name: Some("_c".to_string()),
                    ..Default::default()
                },
                OneofDescriptorProto {
                    name: Some("choice".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let converted = convert_message(&message, "", Syntax::Proto3, "", "a.proto").unwrap();
        assert_eq!(converted.oneofs.len(), 1);
        assert_eq!(converted.oneofs[0].name, "choice");
        let members: Vec<_> = converted.fields.iter().filter(|f| f.oneof_index == Some(0)).collect();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|f| f.label == Label::Implicit));
    }

    #[test]
    fn packed_option_only_emitted_when_explicitly_set() {
        let mut explicit = field("xs", 1, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Repeated);
        explicit.options = Some(FieldOptions {
            packed: Some(false),
            ..Default::default()
        });
        let implicit = field("ys", 2, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Repeated);

        let location = loc("a.proto");
        let explicit_field = convert_field(&explicit, "", Label::Repeated, None, &location).unwrap();
        let implicit_field = convert_field(&implicit, "", Label::Repeated, None, &location).unwrap();
        assert_eq!(explicit_field.options, vec![OptionEntry {
            name: OptionName::simple("packed"),
            value: Constant::Bool(false),
            location: location.clone(),
        }]);
        assert!(implicit_field.options.is_empty());
    }

    #[test]
    fn group_typed_fields_are_rejected() {
        let fd = field("g", 1, field_descriptor_proto::Type::Group, field_descriptor_proto::Label::Optional);
        let result = convert_field(&fd, "", Label::Optional, None, &loc("a.proto"));
        assert!(result.is_err());
    }

    #[test]
    fn extension_fields_are_grouped_by_extendee_in_first_seen_order() {
        let mut a = field("a", 100, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        a.extendee = Some(".pkg.Target".to_string());
        let mut b = field("b", 101, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        b.extendee = Some(".pkg.Other".to_string());
        let mut c = field("c", 102, field_descriptor_proto::Type::Int32, field_descriptor_proto::Label::Optional);
        c.extendee = Some(".pkg.Target".to_string());

        let extends = group_extends(&[a, b, c], "pkg", &loc("a.proto")).unwrap();
        assert_eq!(extends.len(), 2);
        assert_eq!(extends[0].extendee, TypeRef::Named("Target".to_string()));
        assert_eq!(extends[0].fields.len(), 2);
        assert_eq!(extends[1].extendee, TypeRef::Named("Other".to_string()));
        assert_eq!(extends[1].fields.len(), 1);
    }

    #[test]
    fn enum_allow_alias_propagates_and_reserved_ranges_convert() {
        use protokit_types::descriptor::EnumOptions;

        let e = EnumDescriptorProto {
            name: Some("E".to_string()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("A".to_string()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("B".to_string()),
                    number: Some(0),
                    ..Default::default()
                },
            ],
            options: Some(EnumOptions {
                allow_alias: Some(true),
                ..Default::default()
            }),
            reserved_range: vec![enum_descriptor_proto::EnumReservedRange {
                start: Some(5),
                end: Some(10),
            }],
            ..Default::default()
        };

        let converted = convert_enum(&e, "a.proto").unwrap();
        assert!(converted.allow_alias());
        assert_eq!(converted.reserved_ranges, vec![NumberRange { start: 5, end: 10 }]);
    }

    #[test]
    fn reserved_and_extension_ranges_convert_exclusive_end_to_inclusive() {
        let r = descriptor_proto::ReservedRange {
            start: Some(5),
            end: Some(11),
        };
        assert_eq!(convert_reserved_range(&r), NumberRange { start: 5, end: 10 });

        let to_max = descriptor_proto::ExtensionRange {
            start: Some(1000),
            end: Some(536_870_912),
            ..Default::default()
        };
        assert_eq!(convert_extension_range(&to_max), NumberRange { start: 1000, end: i32::MAX });
    }
}
