use std::collections::HashMap;

use protokit_front::{Enum, File, Message};
use protokit_link::LinkedSet;

use crate::module::Module;

pub enum Def<'a> {
    Message(&'a Message),
    Enum(&'a Enum),
}

pub struct TypeInfo<'a> {
    pub module: Module,
    /// Original-case path from the package root, e.g. `["Outer", "Inner"]`.
    pub segments: Vec<String>,
    pub def: Def<'a>,
}

/// Precomputed module/path information for every message and enum reachable
/// from a [`LinkedSet`], keyed by absolute fully-qualified name. Built once
/// and consulted throughout code generation.
pub struct Context<'a> {
    pub linked: &'a LinkedSet,
    pub types: HashMap<String, TypeInfo<'a>>,
}

fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.strip_suffix(".proto").unwrap_or(base)
}

impl<'a> Context<'a> {
    pub fn build(linked: &'a LinkedSet) -> Self {
        let mut types = HashMap::new();
        for (path, file) in &linked.files {
            let module = Module::from_package(file.package.as_deref(), file_stem(path));
            let scope = file.package.as_deref().map(|p| format!(".{p}")).unwrap_or_default();
            register_file(&mut types, &module, &scope, file);
        }
        Context { linked, types }
    }

    pub fn rust_type_path(&self, from: &Module, absolute_name: &str) -> Option<proc_macro2::TokenStream> {
        let info = self.types.get(absolute_name)?;
        let module_path = from.relative_path_to(&info.module);
        let mut nested = proc_macro2::TokenStream::new();
        for seg in &info.segments[..info.segments.len() - 1] {
            let id = crate::ident::module_ident(seg);
            nested.extend(quote::quote!(#id ::));
        }
        let last = crate::ident::type_ident(info.segments.last().expect("at least one segment"));
        nested.extend(quote::quote!(#last));
        Some(if module_path.is_empty() {
            nested
        } else {
            quote::quote!(#module_path :: #nested)
        })
    }
}

fn register_file<'a>(types: &mut HashMap<String, TypeInfo<'a>>, module: &Module, scope: &str, file: &'a File) {
    for message in &file.messages {
        register_message(types, module, scope, &[], message);
    }
    for e in &file.enums {
        register_enum(types, module, scope, &[], e);
    }
}

fn register_message<'a>(
    types: &mut HashMap<String, TypeInfo<'a>>,
    module: &Module,
    scope: &str,
    prefix: &[String],
    message: &'a Message,
) {
    let mut segments = prefix.to_vec();
    segments.push(message.name.clone());
    let absolute = format!("{scope}.{}", segments.join("."));
    types.insert(
        absolute,
        TypeInfo {
            module: module.clone(),
            segments: segments.clone(),
            def: Def::Message(message),
        },
    );
    for nested in &message.nested_messages {
        register_message(types, module, scope, &segments, nested);
    }
    for nested in &message.nested_enums {
        register_enum(types, module, scope, &segments, nested);
    }
}

fn register_enum<'a>(types: &mut HashMap<String, TypeInfo<'a>>, module: &Module, scope: &str, prefix: &[String], e: &'a Enum) {
    let mut segments = prefix.to_vec();
    segments.push(e.name.clone());
    let absolute = format!("{scope}.{}", segments.join("."));
    types.insert(
        absolute,
        TypeInfo {
            module: module.clone(),
            segments,
            def: Def::Enum(e),
        },
    );
}
