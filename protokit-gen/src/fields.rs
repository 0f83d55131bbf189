use proc_macro2::{Ident, Span, TokenStream};
use protokit_front::ScalarType;
use quote::quote;

/// The protokit-runtime module name each scalar type's codec lives under —
/// these match `protokit::encoding` one-for-one.
pub fn scalar_module(s: ScalarType) -> Ident {
    let name = match s {
        ScalarType::Double => "double",
        ScalarType::Float => "float",
        ScalarType::Int32 => "int32",
        ScalarType::Int64 => "int64",
        ScalarType::Uint32 => "uint32",
        ScalarType::Uint64 => "uint64",
        ScalarType::Sint32 => "sint32",
        ScalarType::Sint64 => "sint64",
        ScalarType::Fixed32 => "fixed32",
        ScalarType::Fixed64 => "fixed64",
        ScalarType::Sfixed32 => "sfixed32",
        ScalarType::Sfixed64 => "sfixed64",
        ScalarType::Bool => "bool",
        ScalarType::String => "string",
        ScalarType::Bytes => "bytes",
    };
    Ident::new(name, Span::call_site())
}

/// The Rust type of one element of this scalar (used for repeated/map
/// storage, where bytes are always `Vec<u8>`).
pub fn scalar_element_type(s: ScalarType) -> TokenStream {
    match s {
        ScalarType::Double => quote!(f64),
        ScalarType::Float => quote!(f32),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => quote!(i32),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => quote!(i64),
        ScalarType::Uint32 | ScalarType::Fixed32 => quote!(u32),
        ScalarType::Uint64 | ScalarType::Fixed64 => quote!(u64),
        ScalarType::Bool => quote!(bool),
        ScalarType::String => quote!(::std::string::String),
        ScalarType::Bytes => quote!(::std::vec::Vec<u8>),
    }
}

/// The Rust type of a *singular* scalar field — identical to the element
/// type except `bytes`, which uses `protokit::bytes::Bytes` so a single
/// occurrence can be cheaply cloned/sliced (§4.6's per-language mapping).
pub fn scalar_singular_type(s: ScalarType) -> TokenStream {
    match s {
        ScalarType::Bytes => quote!(::protokit::bytes::Bytes),
        other => scalar_element_type(other),
    }
}

pub fn is_packable(s: ScalarType) -> bool {
    !matches!(s, ScalarType::String | ScalarType::Bytes)
}

/// The zero/default value a proto3 implicit-presence field of this scalar
/// is skipped on encode when equal to.
pub fn is_zero_expr(value: &TokenStream) -> TokenStream {
    quote!(*#value == Default::default())
}
