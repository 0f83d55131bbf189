use std::collections::HashMap;

use protokit_front::{Diagnostic, Enum, File, Message, NumberRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Message,
    Enum,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub file: String,
}

/// Absolute fully-qualified names (`.package.Outer.Inner`) to their
/// definition, built once across every file in a linked set (§4.5.2).
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub entries: HashMap<String, Symbol>,
    /// Extension ranges declared by each message, keyed by its absolute
    /// name — consulted when validating `extend` blocks.
    pub extension_ranges: HashMap<String, Vec<NumberRange>>,
}

impl SymbolTable {
    pub fn build(files: &HashMap<String, File>, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut table = SymbolTable::default();
        let mut paths: Vec<&String> = files.keys().collect();
        paths.sort();
        for path in paths {
            let file = &files[path];
            let scope = file.package.as_deref().map(|p| format!(".{p}")).unwrap_or_default();
            for message in &file.messages {
                table.register_message(&scope, message, path, diagnostics);
            }
            for e in &file.enums {
                table.register_enum(&scope, e, path, diagnostics);
            }
        }
        table
    }

    fn insert(&mut self, name: String, kind: SymbolKind, file: &str, diagnostics: &mut Vec<Diagnostic>, location: &protokit_front::Location) {
        if let Some(existing) = self.entries.get(&name) {
            diagnostics.push(Diagnostic::error(
                location.clone(),
                format!("'{name}' is already defined in {}", existing.file),
            ));
            return;
        }
        self.entries.insert(name, Symbol { kind, file: file.to_string() });
    }

    fn register_message(&mut self, scope: &str, message: &Message, file: &str, diagnostics: &mut Vec<Diagnostic>) {
        let fqn = format!("{scope}.{}", message.name);
        self.insert(fqn.clone(), SymbolKind::Message, file, diagnostics, &message.location);
        self.extension_ranges.insert(fqn.clone(), message.extension_ranges.clone());
        for nested in &message.nested_messages {
            self.register_message(&fqn, nested, file, diagnostics);
        }
        for nested in &message.nested_enums {
            self.register_enum(&fqn, nested, file, diagnostics);
        }
    }

    fn register_enum(&mut self, scope: &str, e: &Enum, file: &str, diagnostics: &mut Vec<Diagnostic>) {
        let fqn = format!("{scope}.{}", e.name);
        self.insert(fqn, SymbolKind::Enum, file, diagnostics, &e.location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::parse;

    #[test]
    fn registers_nested_types_by_absolute_name() {
        let (file, _) = parse(
            "a.proto",
            "package a.b; message Outer { message Inner {} enum E { X = 0; } }",
        );
        let mut files = HashMap::new();
        files.insert("a.proto".to_string(), file);
        let mut diagnostics = Vec::new();
        let table = SymbolTable::build(&files, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(table.entries.contains_key(".a.b.Outer"));
        assert!(table.entries.contains_key(".a.b.Outer.Inner"));
        assert!(table.entries.contains_key(".a.b.Outer.E"));
    }

    #[test]
    fn duplicate_absolute_names_are_an_error() {
        let (file, _) = parse("a.proto", "message M {} message M {}");
        let mut files = HashMap::new();
        files.insert("a.proto".to_string(), file);
        let mut diagnostics = Vec::new();
        SymbolTable::build(&files, &mut diagnostics);
        assert!(diagnostics.iter().any(|d| d.message.contains("already defined")));
    }
}
