use std::collections::HashSet;

use proc_macro2::{Ident, Span, TokenStream};
use protokit_front::{Constant, Field, Label, MapField, Message, ScalarType, Syntax, TypeRef};
use quote::quote;

use crate::context::{Context, Def};
use crate::fields;
use crate::ident;
use crate::module::Module;

#[derive(Clone)]
enum Kind {
    Scalar(ScalarType),
    Message(String),
    Enum(String),
}

fn classify(ty: &TypeRef, ctx: &Context) -> Kind {
    match ty {
        TypeRef::Scalar(s) => Kind::Scalar(*s),
        TypeRef::Named(name) => match ctx.types.get(name).map(|t| &t.def) {
            Some(Def::Enum(_)) => Kind::Enum(name.clone()),
            _ => Kind::Message(name.clone()),
        },
    }
}

fn codec_module(kind: &Kind) -> Ident {
    match kind {
        Kind::Scalar(s) => fields::scalar_module(*s),
        Kind::Message(_) => Ident::new("message", Span::call_site()),
        Kind::Enum(_) => Ident::new("enumeration", Span::call_site()),
    }
}

fn is_numeric(kind: &Kind) -> bool {
    matches!(kind, Kind::Enum(_)) || matches!(kind, Kind::Scalar(s) if fields::is_packable(*s))
}

fn bare_value_type(kind: &Kind, ctx: &Context, module: &Module, container: &str, boxed: &HashSet<(String, String)>) -> TokenStream {
    match kind {
        Kind::Scalar(s) => fields::scalar_singular_type(*s),
        Kind::Enum(_) => quote!(i32),
        Kind::Message(target) => {
            let path = ctx
                .rust_type_path(module, target)
                .unwrap_or_else(|| quote!(::protokit::UnknownFieldSet));
            if boxed.contains(&(container.to_string(), target.clone())) {
                quote!(::std::boxed::Box<#path>)
            } else {
                path
            }
        }
    }
}

fn element_value_type(kind: &Kind, ctx: &Context, module: &Module) -> TokenStream {
    match kind {
        Kind::Scalar(s) => fields::scalar_element_type(*s),
        Kind::Enum(_) => quote!(i32),
        Kind::Message(target) => ctx.rust_type_path(module, target).unwrap_or_else(|| quote!(::protokit::UnknownFieldSet)),
    }
}

fn packed_option(field: &Field) -> Option<bool> {
    field.options.iter().find(|o| o.name.as_simple() == Some("packed")).map(|o| matches!(o.value, Constant::Bool(true)))
}

fn is_effectively_packed(field: &Field, kind: &Kind, syntax: Syntax) -> bool {
    is_numeric(kind) && packed_option(field).unwrap_or(syntax == Syntax::Proto3)
}

fn singular_encode(kind: &Kind, number: i32, value: &TokenStream) -> TokenStream {
    let m = codec_module(kind);
    quote!(::protokit::encoding::#m::encode(#number, #value, buf))
}

fn singular_merge(kind: &Kind, value: &TokenStream) -> TokenStream {
    let m = codec_module(kind);
    quote!(::protokit::encoding::#m::merge(wire_type, #value, buf, ctx))
}

fn singular_len(kind: &Kind, number: i32, value: &TokenStream) -> TokenStream {
    let m = codec_module(kind);
    quote!(::protokit::encoding::#m::encoded_len(#number, #value))
}

/// proto2 enums are a closed set (§4.6): an integer decoded for an enum
/// field that no declared value names is dropped out of the enum slot and
/// preserved in `unknown_fields` instead, rather than stored as-is the way
/// proto3's open enums are.
fn closed_enum(kind: &Kind, syntax: Syntax) -> Option<&str> {
    match kind {
        Kind::Enum(target) if syntax == Syntax::Proto2 => Some(target),
        _ => None,
    }
}

fn enum_rust_path(target: &str, ctx: &Context, module: &Module) -> TokenStream {
    ctx.rust_type_path(module, target).unwrap_or_else(|| quote!(::protokit::UnknownFieldSet))
}

/// `(struct field type, encode stmt, merge arm, len term, clear stmt)` for
/// one ordinary (non-map, non-oneof) field.
fn plain_field(
    field: &Field,
    ctx: &Context,
    module: &Module,
    container: &str,
    boxed: &HashSet<(String, String)>,
    syntax: Syntax,
) -> (TokenStream, TokenStream, TokenStream, TokenStream, TokenStream) {
    let kind = classify(&field.ty, ctx);
    let rust_ident = ident::field_ident(&field.name);
    let number = field.number;
    let field_expr = quote!(self.#rust_ident);

    if field.label == Label::Repeated {
        let element = element_value_type(&kind, ctx, module);
        let ty = quote!(::std::vec::Vec<#element>);
        let m = codec_module(&kind);
        let packed = is_effectively_packed(field, &kind, syntax);
        let encode = if packed {
            quote!(::protokit::encoding::#m::encode_packed(#number, &#field_expr, buf);)
        } else {
            quote!(::protokit::encoding::#m::encode_repeated(#number, &#field_expr, buf);)
        };
        let merge = if let Some(target) = closed_enum(&kind, syntax) {
            let enum_path = enum_rust_path(target, ctx, module);
            quote! {
                #number => {
                    let mut unknown: ::std::vec::Vec<i32> = ::std::vec::Vec::new();
                    ::protokit::encoding::#m::merge_repeated(wire_type, &mut unknown, buf, ctx)?;
                    for value in unknown {
                        if #enum_path::from_i32(value).is_some() {
                            #field_expr.push(value);
                        } else {
                            self.unknown_fields.push(#number as u32, ::protokit::UnknownField::Varint(value as u64));
                        }
                    }
                    Ok(())
                },
            }
        } else {
            quote!(#number => ::protokit::encoding::#m::merge_repeated(wire_type, &mut #field_expr, buf, ctx),)
        };
        let len = if packed {
            quote!(::protokit::encoding::#m::encoded_len_packed(#number, &#field_expr))
        } else {
            quote!(::protokit::encoding::#m::encoded_len_repeated(#number, &#field_expr))
        };
        let clear = quote!(#field_expr.clear(););
        return (ty, encode, merge, len, clear);
    }

    let option_wrapped = matches!(kind, Kind::Message(_)) || field.label == Label::Optional;

    if option_wrapped {
        let bare = bare_value_type(&kind, ctx, module, container, boxed);
        let ty = quote!(::core::option::Option<#bare>);
        let encode_call = singular_encode(&kind, number, &quote!(v));
        let len_call = singular_len(&kind, number, &quote!(v));
        let encode = quote!(if let Some(v) = &#field_expr { #encode_call; });
        let merge = if let Some(target) = closed_enum(&kind, syntax) {
            let enum_path = enum_rust_path(target, ctx, module);
            quote! {
                #number => {
                    let mut value: i32 = 0;
                    ::protokit::encoding::enumeration::merge(wire_type, &mut value, buf, ctx)?;
                    if #enum_path::from_i32(value).is_some() {
                        #field_expr = ::core::option::Option::Some(value);
                    } else {
                        self.unknown_fields.push(#number as u32, ::protokit::UnknownField::Varint(value as u64));
                    }
                    Ok(())
                },
            }
        } else {
            let merge_call = singular_merge(&kind, &quote!(slot));
            quote! {
                #number => {
                    let slot = #field_expr.get_or_insert_with(Default::default);
                    #merge_call
                },
            }
        };
        let len = quote!(#field_expr.as_ref().map_or(0, |v| #len_call));
        let clear = quote!(#field_expr = None;);
        return (ty, encode, merge, len, clear);
    }

    if field.label == Label::Required {
        let ty = bare_value_type(&kind, ctx, module, container, boxed);
        let encode_call = singular_encode(&kind, number, &quote!(&#field_expr));
        let len_call = singular_len(&kind, number, &quote!(&#field_expr));
        let encode = quote!(#encode_call;);
        let merge = if let Some(target) = closed_enum(&kind, syntax) {
            let enum_path = enum_rust_path(target, ctx, module);
            quote! {
                #number => {
                    let mut value: i32 = #field_expr;
                    ::protokit::encoding::enumeration::merge(wire_type, &mut value, buf, ctx)?;
                    if #enum_path::from_i32(value).is_some() {
                        #field_expr = value;
                    } else {
                        self.unknown_fields.push(#number as u32, ::protokit::UnknownField::Varint(value as u64));
                    }
                    Ok(())
                },
            }
        } else {
            let merge_call = singular_merge(&kind, &quote!(&mut #field_expr));
            quote!(#number => #merge_call,)
        };
        let clear = quote!(#field_expr = Default::default(););
        return (ty, encode, merge, len_call, clear);
    }

    // proto3 implicit presence: skip on the zero default.
    let ty = bare_value_type(&kind, ctx, module, container, boxed);
    let is_zero = fields::is_zero_expr(&quote!(&#field_expr));
    let encode_call = singular_encode(&kind, number, &quote!(&#field_expr));
    let merge_call = singular_merge(&kind, &quote!(&mut #field_expr));
    let len_call = singular_len(&kind, number, &quote!(&#field_expr));
    let encode = quote!(if !(#is_zero) { #encode_call; });
    let merge = quote!(#number => #merge_call,);
    let len = quote!(if #is_zero { 0 } else { #len_call });
    let clear = quote!(#field_expr = Default::default(););
    (ty, encode, merge, len, clear)
}

fn map_field_gen(map_field: &MapField, ctx: &Context, module: &Module) -> (TokenStream, TokenStream, TokenStream, TokenStream, TokenStream) {
    let key_ty = fields::scalar_element_type(map_field.key);
    let value_kind = classify(&map_field.value, ctx);
    let value_ty = element_value_type(&value_kind, ctx, module);
    let ty = quote!(::std::collections::BTreeMap<#key_ty, #value_ty>);

    let key_module = fields::scalar_module(map_field.key);
    let value_module = codec_module(&value_kind);
    let number = map_field.number;
    let rust_ident = ident::field_ident(&map_field.name);
    let field_expr = quote!(self.#rust_ident);

    let encode = quote! {
        ::protokit::encoding::map::encode(
            ::protokit::encoding::#key_module::encode,
            ::protokit::encoding::#key_module::encoded_len,
            ::protokit::encoding::#value_module::encode,
            ::protokit::encoding::#value_module::encoded_len,
            #number,
            &#field_expr,
            buf,
        );
    };
    let merge = quote! {
        #number => ::protokit::encoding::map::merge(
            ::protokit::encoding::#key_module::merge,
            ::protokit::encoding::#value_module::merge,
            &mut #field_expr,
            buf,
            ctx,
        ),
    };
    let len = quote! {
        ::protokit::encoding::map::encoded_len(
            ::protokit::encoding::#key_module::encoded_len,
            ::protokit::encoding::#value_module::encoded_len,
            #number,
            &#field_expr,
        )
    };
    let clear = quote!(#field_expr.clear(););
    (ty, encode, merge, len, clear)
}

struct OneofMember<'a> {
    field: &'a Field,
    variant: Ident,
}

fn oneof_gen(
    message: &Message,
    oneof_index: usize,
    ctx: &Context,
    module: &Module,
    container: &str,
    boxed: &HashSet<(String, String)>,
) -> (Ident, TokenStream) {
    let oneof = &message.oneofs[oneof_index];
    let enum_name = Ident::new(
        &format!("{}{}", ident::type_ident(&message.name), ident::type_ident(&oneof.name)),
        Span::call_site(),
    );
    let members: Vec<OneofMember> = message
        .fields
        .iter()
        .filter(|f| f.oneof_index == Some(oneof_index))
        .map(|f| OneofMember {
            field: f,
            variant: ident::type_ident(&f.name),
        })
        .collect();

    let variants = members.iter().map(|m| {
        let kind = classify(&m.field.ty, ctx);
        let ty = bare_value_type(&kind, ctx, module, container, boxed);
        let variant = &m.variant;
        quote!(#variant(#ty))
    });

    let enum_def = quote! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum #enum_name {
            #(#variants),*
        }
    };

    (enum_name, enum_def)
}

/// Emits the struct, its `impl Message`, and any nested types, for one
/// message — recursing into `nested_messages`/`nested_enums` as sibling
/// items inside a module named after this message (§4.6's nested-namespace
/// rule, same convention `protokit-types` itself uses for descriptor
/// sub-messages).
pub fn generate(message: &Message, absolute_name: &str, module: &Module, ctx: &Context, boxed: &HashSet<(String, String)>, syntax: Syntax) -> TokenStream {
    let struct_name = ident::type_ident(&message.name);

    enum Item<'a> {
        Plain(&'a Field),
        Map(&'a MapField),
        OneofMember { oneof_index: usize, field: &'a Field },
    }

    let mut items: Vec<(i32, Item)> = Vec::new();
    for field in &message.fields {
        match field.oneof_index {
            Some(idx) => items.push((field.number, Item::OneofMember { oneof_index: idx, field })),
            None => items.push((field.number, Item::Plain(field))),
        }
    }
    for map_field in &message.map_fields {
        items.push((map_field.number, Item::Map(map_field)));
    }
    items.sort_by_key(|(n, _)| *n);

    let mut struct_fields = Vec::new();
    let mut encode_stmts = Vec::new();
    let mut merge_arms = Vec::new();
    let mut len_terms = Vec::new();
    let mut clear_stmts = Vec::new();
    let mut oneof_defs = Vec::new();
    let mut emitted_oneofs = HashSet::new();

    for (_, item) in &items {
        match item {
            Item::Plain(field) => {
                let (ty, encode, merge, len, clear) = plain_field(field, ctx, module, absolute_name, boxed, syntax);
                let name = ident::field_ident(&field.name);
                struct_fields.push(quote!(pub #name: #ty));
                encode_stmts.push(encode);
                merge_arms.push(merge);
                len_terms.push(len);
                clear_stmts.push(clear);
            }
            Item::Map(map_field) => {
                let (ty, encode, merge, len, clear) = map_field_gen(map_field, ctx, module);
                let name = ident::field_ident(&map_field.name);
                struct_fields.push(quote!(pub #name: #ty));
                encode_stmts.push(encode);
                merge_arms.push(merge);
                len_terms.push(len);
                clear_stmts.push(clear);
            }
            Item::OneofMember { oneof_index, field } => {
                let (enum_name, enum_def) = oneof_gen(message, *oneof_index, ctx, module, absolute_name, boxed);
                if emitted_oneofs.insert(*oneof_index) {
                    oneof_defs.push(enum_def);
                    let oneof = &message.oneofs[*oneof_index];
                    let name = ident::field_ident(&oneof.name);
                    struct_fields.push(quote!(pub #name: ::core::option::Option<#enum_name>));
                    clear_stmts.push(quote!(self.#name = None;));
                }

                let oneof = &message.oneofs[*oneof_index];
                let field_name = ident::field_ident(&oneof.name);
                let variant = ident::type_ident(&field.name);
                let kind = classify(&field.ty, ctx);
                let number = field.number;

                let encode_call = singular_encode(&kind, number, &quote!(v));
                encode_stmts.push(quote! {
                    if let Some(#enum_name::#variant(v)) = &self.#field_name {
                        #encode_call;
                    }
                });

                let merge_existing = singular_merge(&kind, &quote!(v));
                let merge_new = singular_merge(&kind, &quote!(&mut v));
                let bare_ty = bare_value_type(&kind, ctx, module, absolute_name, boxed);
                merge_arms.push(quote! {
                    #number => match &mut self.#field_name {
                        Some(#enum_name::#variant(v)) => #merge_existing,
                        _ => {
                            let mut v: #bare_ty = Default::default();
                            #merge_new?;
                            self.#field_name = Some(#enum_name::#variant(v));
                            Ok(())
                        }
                    },
                });

                let len_call = singular_len(&kind, number, &quote!(v));
                len_terms.push(quote! {
                    match &self.#field_name {
                        Some(#enum_name::#variant(v)) => #len_call,
                        _ => 0,
                    }
                });
            }
        }
    }

    let nested = message.nested_messages.iter().map(|nested| {
        let nested_abs = format!("{absolute_name}.{}", nested.name);
        generate(nested, &nested_abs, module, ctx, boxed, syntax)
    });
    let nested_enums = message.nested_enums.iter().map(crate::enum_gen::generate);
    let has_nested = !message.nested_messages.is_empty() || !message.nested_enums.is_empty();
    let nested_mod_name = ident::module_ident(&message.name);
    let nested_mod = if has_nested {
        quote! {
            pub mod #nested_mod_name {
                use super::*;
                #(#nested)*
                #(#nested_enums)*
            }
        }
    } else {
        quote!()
    };

    quote! {
        #(#oneof_defs)*

        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct #struct_name {
            #(#struct_fields,)*
            pub unknown_fields: ::protokit::UnknownFieldSet,
        }

        impl ::protokit::Message for #struct_name {
            fn encode_raw(&self, buf: &mut impl ::bytes::BufMut) {
                #(#encode_stmts)*
                self.unknown_fields.encode_raw(buf);
            }

            fn merge_field(
                &mut self,
                tag: u32,
                wire_type: ::protokit::encoding::WireType,
                buf: &mut impl ::bytes::Buf,
                ctx: ::protokit::encoding::DecodeContext,
            ) -> ::core::result::Result<(), ::protokit::DecodeError> {
                match tag {
                    #(#merge_arms)*
                    _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
                }
            }

            fn encoded_len(&self) -> usize {
                0 #(+ (#len_terms))* + self.unknown_fields.encoded_len()
            }

            fn clear(&mut self) {
                #(#clear_stmts)*
                self.unknown_fields.clear();
            }
        }

        #nested_mod
    }
}

#[cfg(test)]
mod tests {
    use protokit_front::parse;
    use protokit_link::link;

    use super::*;
    use crate::message_graph::boxed_fields;

    fn build(source: &str) -> (protokit_link::LinkedSet, Syntax) {
        let (entry, diagnostics) = parse("a.proto", source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let syntax = entry.syntax;
        let mut loader = |_: &str| -> Result<String, String> { Err("no imports".into()) };
        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        (linked, syntax)
    }

    #[test]
    fn generates_scalar_fields_with_proto3_presence() {
        let (linked, syntax) = build("syntax = \"proto3\"; message Point { int32 x = 1; int32 y = 2; }");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".Point", &module, &ctx, &boxed, syntax).to_string();
        assert!(tokens.contains("pub struct Point"));
        assert!(tokens.contains("pub x : i32"));
        assert!(tokens.contains("encoding :: int32 :: encode"));
        assert!(tokens.contains("unknown_fields"));
    }

    #[test]
    fn boxes_a_self_referential_message_field() {
        let (linked, syntax) = build("message Node { Node child = 1; }");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".Node", &module, &ctx, &boxed, syntax).to_string();
        assert!(tokens.contains("Box"));
    }

    #[test]
    fn generates_a_map_field_using_the_map_codec() {
        let (linked, syntax) = build("syntax = \"proto3\"; message M { map<string, int32> counts = 1; }");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".M", &module, &ctx, &boxed, syntax).to_string();
        assert!(tokens.contains("BTreeMap"));
        assert!(tokens.contains("encoding :: map :: encode"));
    }

    #[test]
    fn generates_a_oneof_enum_and_dispatches_by_member_number() {
        let (linked, syntax) =
            build("syntax = \"proto3\"; message M { oneof kind { string name = 1; int32 id = 2; } }");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".M", &module, &ctx, &boxed, syntax).to_string();
        assert!(tokens.contains("pub enum MKind"));
        assert!(tokens.contains("pub kind : :: core :: option :: Option < MKind >"));
    }

    #[test]
    fn proto2_enum_field_merge_arm_routes_unknown_values_to_unknown_fields() {
        let (linked, syntax) = build(
            "syntax = \"proto2\"; enum Color { RED = 0; GREEN = 1; } \
             message M { required Color color = 1; optional Color shade = 2; repeated Color tints = 3; }",
        );
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".M", &module, &ctx, &boxed, syntax).to_string();
        assert!(tokens.contains("Color :: from_i32"));
        assert!(tokens.contains("unknown_fields . push"));
        assert!(tokens.contains("UnknownField :: Varint"));
    }

    #[test]
    fn proto3_enum_field_merge_arm_has_no_closed_enum_guard() {
        let (linked, syntax) = build("syntax = \"proto3\"; enum Color { RED = 0; GREEN = 1; } message M { Color color = 1; }");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        let module = Module::from_package(None, "a");
        let message = &linked.files["a.proto"].messages[0];
        let tokens = generate(message, ".M", &module, &ctx, &boxed, syntax).to_string();
        assert!(!tokens.contains("from_i32"));
        assert!(tokens.contains("encoding :: enumeration :: merge"));
    }
}
