//! Import resolution, symbol table construction, type resolution, and
//! validation for a set of parsed `.proto` files (§4.5).
//!
//! This crate takes the [`protokit_front::File`] ASTs produced by the
//! parser and turns them into a [`LinkedSet`]: every `TypeRef::Named` is
//! rewritten to its absolute fully-qualified name, and every file has been
//! checked against the validation rules in the module design. Callers
//! drive the code generator or descriptor-set adapter from the result.

mod graph;
mod resolve;
mod symbols;
mod validate;

use std::collections::HashMap;

use protokit_front::{Diagnostic, File};

pub use symbols::{Symbol, SymbolKind, SymbolTable};

/// Every file reachable from the entry set, keyed by the path used to
/// import it (or its own name, for an entry file), plus the symbol table
/// built across all of them.
pub struct LinkedSet {
    pub files: HashMap<String, File>,
    pub entry_files: Vec<String>,
    pub symbols: SymbolTable,
}

impl LinkedSet {
    pub fn visible_files(&self, from: &str) -> std::collections::HashSet<String> {
        graph::visible_files(from, &self.files)
    }
}

/// Links `entry_files` (already parsed by `protokit-front`), using `loader`
/// to fetch the source of any transitively-imported file by import path.
/// Returns the linked set alongside every diagnostic recorded across
/// import resolution, symbol registration, type resolution, and
/// validation — callers should check [`protokit_front::has_errors`] before
/// trusting the result for codegen.
pub fn link(
    entry_files: Vec<File>,
    loader: &mut dyn FnMut(&str) -> Result<String, String>,
) -> (LinkedSet, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut files: HashMap<String, File> = HashMap::new();
    let mut entry_order = Vec::new();

    for file in entry_files {
        let name = file.name.clone();
        if !files.contains_key(&name) {
            entry_order.push(name.clone());
            files.insert(name, file);
        }
    }

    let mut visiting = std::collections::HashSet::new();
    let mut done = std::collections::HashSet::new();
    for path in entry_order.clone() {
        graph::visit(&path, &mut files, loader, &mut visiting, &mut done, &mut diagnostics);
    }

    let symbols = SymbolTable::build(&files, &mut diagnostics);

    let paths: Vec<String> = files.keys().cloned().collect();
    for path in paths {
        let mut file = files.remove(&path).expect("path came from files.keys()");
        resolve::resolve_file(&mut file, &symbols, &mut diagnostics);
        validate::validate_file(&file, &symbols, &mut diagnostics);
        files.insert(path, file);
    }

    (
        LinkedSet {
            files,
            entry_files: entry_order,
            symbols,
        },
        diagnostics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::{has_errors, parse};

    #[test]
    fn links_a_file_with_a_transitive_import() {
        let (entry, diagnostics) = parse(
            "a.proto",
            r#"syntax = "proto3"; import "b.proto"; message A { b.B nested = 1; }"#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let mut loader = |path: &str| -> Result<String, String> {
            if path == "b.proto" {
                Ok(r#"syntax = "proto3"; package b; message B { string name = 1; }"#.to_string())
            } else {
                Err("not found".to_string())
            }
        };

        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(!has_errors(&diagnostics), "{diagnostics:?}");
        let a = &linked.files["a.proto"];
        assert_eq!(a.messages[0].fields[0].ty, protokit_front::TypeRef::Named(".b.B".to_string()));
        assert!(linked.symbols.entries.contains_key(".b.B"));
    }

    #[test]
    fn reports_an_error_when_an_import_cannot_be_loaded() {
        let (entry, _) = parse("a.proto", r#"import "missing.proto";"#);
        let mut loader = |_: &str| -> Result<String, String> { Err("no such file".to_string()) };
        let (_, diagnostics) = link(vec![entry], &mut loader);
        assert!(has_errors(&diagnostics));
    }
}
