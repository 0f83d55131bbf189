use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// The fifteen scalar types named directly in the language grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "double" => ScalarType::Double,
            "float" => ScalarType::Float,
            "int32" => ScalarType::Int32,
            "int64" => ScalarType::Int64,
            "uint32" => ScalarType::Uint32,
            "uint64" => ScalarType::Uint64,
            "sint32" => ScalarType::Sint32,
            "sint64" => ScalarType::Sint64,
            "fixed32" => ScalarType::Fixed32,
            "fixed64" => ScalarType::Fixed64,
            "sfixed32" => ScalarType::Sfixed32,
            "sfixed64" => ScalarType::Sfixed64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        })
    }

    /// Legal map key scalars (§4.5): any integral scalar, bool, or string.
    pub fn is_legal_map_key(self) -> bool {
        !matches!(self, ScalarType::Float | ScalarType::Double | ScalarType::Bytes)
    }
}

/// A field type reference as written in source: a named scalar, or a
/// dotted (possibly leading-dotted) name resolved later by the linker.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Scalar(ScalarType),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Required,
    Optional,
    Repeated,
    /// No label written; proto3 implicit presence.
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionNamePart {
    pub name: String,
    pub is_extension: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionName {
    pub parts: Vec<OptionNamePart>,
}

impl OptionName {
    pub fn simple(name: impl Into<String>) -> Self {
        OptionName {
            parts: vec![OptionNamePart {
                name: name.into(),
                is_extension: false,
            }],
        }
    }

    pub fn as_simple(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [part] if !part.is_extension => Some(&part.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Ident(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// A brace-delimited aggregate literal, captured as raw text (§4.4).
    Aggregate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub name: OptionName,
    pub value: Constant,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub number: i32,
    pub label: Label,
    pub ty: TypeRef,
    pub options: Vec<OptionEntry>,
    /// Set while flattening a `oneof` block; index into the owning
    /// message's `oneofs`.
    pub oneof_index: Option<usize>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapField {
    pub name: String,
    pub number: i32,
    pub key: ScalarType,
    pub value: TypeRef,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneOf {
    pub name: String,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRange {
    pub start: i32,
    /// Inclusive; `i32::MAX` represents `to max`.
    pub end: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extend {
    pub extendee: TypeRef,
    pub fields: Vec<Field>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub fields: Vec<Field>,
    pub map_fields: Vec<MapField>,
    pub oneofs: Vec<OneOf>,
    pub nested_messages: Vec<Message>,
    pub nested_enums: Vec<Enum>,
    pub reserved_ranges: Vec<NumberRange>,
    pub reserved_names: Vec<String>,
    pub extension_ranges: Vec<NumberRange>,
    pub extends: Vec<Extend>,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub options: Vec<OptionEntry>,
    pub reserved_ranges: Vec<NumberRange>,
    pub reserved_names: Vec<String>,
    pub location: Location,
}

impl Enum {
    pub fn allow_alias(&self) -> bool {
        self.options.iter().any(|o| {
            o.name.as_simple() == Some("allow_alias") && matches!(o.value, Constant::Bool(true))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub input_type: TypeRef,
    pub client_streaming: bool,
    pub output_type: TypeRef,
    pub server_streaming: bool,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
    pub options: Vec<OptionEntry>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: String,
    pub public: bool,
    pub weak: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub name: String,
    pub syntax: Syntax,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub options: Vec<OptionEntry>,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
    pub extends: Vec<Extend>,
}
