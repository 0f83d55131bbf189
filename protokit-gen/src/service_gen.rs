use proc_macro2::TokenStream;
use protokit_front::{Service, TypeRef};
use quote::quote;

use crate::context::Context;
use crate::ident;
use crate::module::Module;

fn type_path(ty: &TypeRef, ctx: &Context, module: &Module) -> TokenStream {
    match ty {
        TypeRef::Named(name) => ctx.rust_type_path(module, name).unwrap_or_else(|| quote!(::protokit::UnknownFieldSet)),
        TypeRef::Scalar(_) => quote!(()),
    }
}

/// Emits a service's metadata descriptor, a server-dispatch table, and a
/// channel-backed client stub, covering all four RPC shapes named in §4.6's
/// method-shape table.
pub fn generate(service: &Service, ctx: &Context, module: &Module) -> TokenStream {
    let service_ident = ident::type_ident(&service.name);
    let descriptor_const = quote::format_ident!("{}_DESCRIPTOR", service.name.to_uppercase());
    let handlers_name = quote::format_ident!("{}Handlers", service_ident);
    let client_name = quote::format_ident!("{}Client", service_ident);

    let method_consts = service.methods.iter().map(|m| {
        let const_name = quote::format_ident!("{}_{}_METHOD", service.name.to_uppercase(), m.name.to_uppercase());
        let name = &m.name;
        let full_name = format!("/{}/{}", service.name, m.name);
        let client_streaming = m.client_streaming;
        let server_streaming = m.server_streaming;
        quote! {
            pub const #const_name: ::protokit_rpc::MethodDescriptor = ::protokit_rpc::MethodDescriptor {
                name: #name,
                full_name: #full_name,
                client_streaming: #client_streaming,
                server_streaming: #server_streaming,
            };
        }
    });

    let method_refs = service.methods.iter().map(|m| {
        let const_name = quote::format_ident!("{}_{}_METHOD", service.name.to_uppercase(), m.name.to_uppercase());
        quote!(&#const_name)
    });

    let descriptor = {
        let name = &service.name;
        quote! {
            pub const #descriptor_const: ::protokit_rpc::ServiceDescriptor = ::protokit_rpc::ServiceDescriptor {
                name: #name,
                methods: &[#(#method_refs),*],
            };
        }
    };

    let handler_fields = service.methods.iter().map(|m| {
        let field = ident::field_ident(&m.name);
        let req = type_path(&m.input_type, ctx, module);
        let resp = type_path(&m.output_type, ctx, module);
        match (m.client_streaming, m.server_streaming) {
            (false, false) => quote!(pub #field: fn(&::protokit_rpc::RpcContext, #req) -> ::core::result::Result<#resp, ::protokit_rpc::RpcError>),
            (false, true) => quote! {
                pub #field: fn(
                    &::protokit_rpc::RpcContext,
                    #req,
                    &mut ::protokit_rpc::TypedSendStream<#resp>,
                ) -> ::core::result::Result<(), ::protokit_rpc::RpcError>
            },
            (true, false) => quote! {
                pub #field: fn(
                    &::protokit_rpc::RpcContext,
                    &mut ::protokit_rpc::TypedRecvStream<#req>,
                ) -> ::core::result::Result<#resp, ::protokit_rpc::RpcError>
            },
            (true, true) => quote! {
                pub #field: fn(
                    &::protokit_rpc::RpcContext,
                    &mut ::protokit_rpc::TypedRecvStream<#req>,
                    &mut ::protokit_rpc::TypedSendStream<#resp>,
                ) -> ::core::result::Result<(), ::protokit_rpc::RpcError>
            },
        }
    });

    let client_methods = service.methods.iter().map(|m| {
        let fn_name = ident::field_ident(&m.name);
        let const_name = quote::format_ident!("{}_{}_METHOD", service.name.to_uppercase(), m.name.to_uppercase());
        let req = type_path(&m.input_type, ctx, module);
        let resp = type_path(&m.output_type, ctx, module);
        match (m.client_streaming, m.server_streaming) {
            (false, false) => quote! {
                pub fn #fn_name(
                    &self,
                    ctx: &::protokit_rpc::RpcContext,
                    request: #req,
                ) -> ::core::result::Result<#resp, ::protokit_rpc::RpcError> {
                    let bytes = ::protokit::Message::encode_to_vec(&request);
                    let response = self.channel.unary_call(&#const_name, ctx, bytes)?;
                    <#resp as ::protokit::Message>::decode(response.as_slice()).map_err(::protokit_rpc::RpcError::from)
                }
            },
            (false, true) => quote! {
                pub fn #fn_name(
                    &self,
                    ctx: &::protokit_rpc::RpcContext,
                    request: #req,
                ) -> ::core::result::Result<::protokit_rpc::TypedRecvStream<#resp>, ::protokit_rpc::RpcError> {
                    let bytes = ::protokit::Message::encode_to_vec(&request);
                    let raw = self.channel.server_stream_call(&#const_name, ctx, bytes)?;
                    Ok(::protokit_rpc::TypedRecvStream::new(raw))
                }
            },
            (true, false) => quote! {
                #[allow(clippy::type_complexity)]
                pub fn #fn_name(
                    &self,
                    ctx: &::protokit_rpc::RpcContext,
                ) -> ::core::result::Result<
                    (::protokit_rpc::TypedSendStream<#req>, ::protokit_rpc::RpcFuture<#resp>),
                    ::protokit_rpc::RpcError,
                > {
                    let (raw_send, raw_future) = self.channel.client_stream_call(&#const_name, ctx)?;
                    Ok((::protokit_rpc::TypedSendStream::new(raw_send), ::protokit_rpc::RpcFuture::new(raw_future)))
                }
            },
            (true, true) => quote! {
                #[allow(clippy::type_complexity)]
                pub fn #fn_name(
                    &self,
                    ctx: &::protokit_rpc::RpcContext,
                ) -> ::core::result::Result<
                    (::protokit_rpc::TypedSendStream<#req>, ::protokit_rpc::TypedRecvStream<#resp>),
                    ::protokit_rpc::RpcError,
                > {
                    let (raw_send, raw_recv) = self.channel.bidi_stream_call(&#const_name, ctx)?;
                    Ok((::protokit_rpc::TypedSendStream::new(raw_send), ::protokit_rpc::TypedRecvStream::new(raw_recv)))
                }
            },
        }
    });

    quote! {
        #(#method_consts)*
        #descriptor

        pub struct #handlers_name {
            #(#handler_fields,)*
        }

        pub struct #client_name<'a> {
            pub channel: &'a dyn ::protokit_rpc::Channel,
        }

        impl<'a> #client_name<'a> {
            pub fn new(channel: &'a dyn ::protokit_rpc::Channel) -> Self {
                #client_name { channel }
            }

            #(#client_methods)*
        }
    }
}

#[cfg(test)]
mod tests {
    use protokit_front::parse;
    use protokit_link::link;

    use super::*;
    use crate::context::Context;

    #[test]
    fn generates_all_four_method_shapes() {
        let (entry, diagnostics) = parse(
            "a.proto",
            r#"
            syntax = "proto3";
            message Req {}
            message Resp {}
            service Chat {
                rpc Unary(Req) returns (Resp);
                rpc ServerStream(Req) returns (stream Resp);
                rpc ClientStream(stream Req) returns (Resp);
                rpc Bidi(stream Req) returns (stream Resp);
            }
            "#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let mut loader = |_: &str| -> Result<String, String> { Err("no imports".into()) };
        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let ctx = Context::build(&linked);
        let module = Module::from_package(None, "a");
        let service = &linked.files["a.proto"].services[0];
        let tokens = generate(service, &ctx, &module).to_string();
        assert!(tokens.contains("pub struct ChatHandlers"));
        assert!(tokens.contains("pub struct ChatClient"));
        assert!(tokens.contains("unary_call"));
        assert!(tokens.contains("server_stream_call"));
        assert!(tokens.contains("client_stream_call"));
        assert!(tokens.contains("bidi_stream_call"));
    }
}
