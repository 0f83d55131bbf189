use std::fmt;

/// Everything a reflective field access or mutation can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectError {
    /// No field with this number is declared on the message's descriptor.
    UnknownField(i32),
    /// No field with this name is declared on the message's descriptor.
    UnknownFieldName(String),
    /// The field's declared shape (singular / repeated / map) doesn't match
    /// the operation attempted on it.
    WrongShape { field: i32 },
    /// The value's variant doesn't match the field's declared scalar type.
    TypeMismatch { field: i32 },
    /// A message- or map-typed field's `type_name` doesn't resolve in the
    /// pool it was constructed against.
    UnresolvedType(String),
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectError::UnknownField(number) => write!(f, "no field numbered {number} on this message"),
            ReflectError::UnknownFieldName(name) => write!(f, "no field named {name:?} on this message"),
            ReflectError::WrongShape { field } => write!(f, "field {field} does not support this operation"),
            ReflectError::TypeMismatch { field } => write!(f, "value does not match the declared type of field {field}"),
            ReflectError::UnresolvedType(name) => write!(f, "type {name:?} is not registered in this pool"),
        }
    }
}

impl std::error::Error for ReflectError {}
