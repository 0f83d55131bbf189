//! Schema-agnostic message layer (§4.8): a message addressed by field
//! number or name against a `DescriptorProto` loaded at runtime, rather
//! than a generated Rust struct.
//!
//! This is the one layer that deliberately diverges from the generated-code
//! path: unknown field numbers are dropped on decode instead of preserved,
//! since there is no static field list to fall back to and no
//! `unknown_fields` slot a dynamic caller could inspect meaningfully.

mod dynamic_message;
mod error;
mod pool;
mod value;

pub use dynamic_message::DynamicMessage;
pub use error::ReflectError;
pub use pool::Pool;
pub use value::{FieldValue, MapKey, Value};
