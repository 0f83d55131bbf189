//! Schema-driven Rust code generator: turns a [`protokit_link::LinkedSet`]
//! into one formatted Rust source string per output module.
//!
//! Generation is purely data-driven from the resolved descriptor set — no
//! runtime reflection is emitted for the generated types themselves (see
//! `protokit-reflect` for the dynamic, schema-at-runtime layer).

mod context;
mod enum_gen;
mod fields;
mod ident;
mod message_gen;
mod message_graph;
mod module;
mod service_gen;

use std::collections::BTreeMap;

pub use context::Context;
pub use module::Module;
use protokit_front::File;
use protokit_link::LinkedSet;

/// Formatted Rust source for every module touched by `files_to_generate`,
/// keyed by output [`Module`] path (mirroring the `a/b/c` package-to-path
/// rule: a file without a package falls back to its own stem).
pub fn generate(linked: &LinkedSet, files_to_generate: &[String]) -> BTreeMap<Module, String> {
    let ctx = Context::build(linked);
    let boxed = message_graph::boxed_fields(&ctx);

    let mut by_module: BTreeMap<Module, proc_macro2::TokenStream> = BTreeMap::new();
    for path in files_to_generate {
        let Some(file) = linked.files.get(path) else {
            log::warn!("generate: {path} is not in the linked set, skipping");
            continue;
        };
        let module = Module::from_package(file.package.as_deref(), file_stem(path));
        let tokens = generate_file(file, &module, &ctx, &boxed);
        by_module.entry(module).or_default().extend(tokens);
    }

    by_module.into_iter().map(|(module, tokens)| (module, render(tokens))).collect()
}

fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.strip_suffix(".proto").unwrap_or(base)
}

fn generate_file(file: &File, module: &Module, ctx: &Context, boxed: &std::collections::HashSet<(String, String)>) -> proc_macro2::TokenStream {
    let package_scope = file.package.as_deref().map(|p| format!(".{p}")).unwrap_or_default();

    let messages = file.messages.iter().map(|m| {
        let abs = format!("{package_scope}.{}", m.name);
        message_gen::generate(m, &abs, module, ctx, boxed, file.syntax)
    });
    let enums = file.enums.iter().map(enum_gen::generate);
    let services = file.services.iter().map(|s| service_gen::generate(s, ctx, module));

    quote::quote! {
        #(#messages)*
        #(#enums)*
        #(#services)*
    }
}

#[cfg(feature = "format")]
fn render(tokens: proc_macro2::TokenStream) -> String {
    match syn::parse2(tokens.clone()) {
        Ok(file) => prettyplease::unparse(&file),
        Err(err) => {
            log::warn!("generated module failed to parse for formatting: {err}");
            tokens.to_string()
        }
    }
}

#[cfg(not(feature = "format"))]
fn render(tokens: proc_macro2::TokenStream) -> String {
    tokens.to_string()
}
