use protokit_front::{Diagnostic, Extend, File, Location, Message, TypeRef};

use crate::symbols::{SymbolKind, SymbolTable};

/// Innermost-to-outermost lookup prefixes for `scope`, ending with the
/// empty (global) scope — e.g. `.a.b.Outer.Inner` yields
/// `[".a.b.Outer.Inner", ".a.b.Outer", ".a.b", ""]` (§4.5.3).
fn scope_chain(scope: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = scope.to_string();
    loop {
        chain.push(current.clone());
        if current.is_empty() {
            break;
        }
        match current.rfind('.') {
            Some(idx) => current.truncate(idx),
            None => current.clear(),
        }
    }
    chain
}

fn resolve_name(reference: &str, scope: &str, table: &SymbolTable) -> Option<(String, SymbolKind)> {
    if let Some(rest) = reference.strip_prefix('.') {
        let absolute = format!(".{rest}");
        return table.entries.get(&absolute).map(|s| (absolute, s.kind));
    }
    for prefix in scope_chain(scope) {
        let candidate = format!("{prefix}.{reference}");
        if let Some(symbol) = table.entries.get(&candidate) {
            return Some((candidate, symbol.kind));
        }
    }
    None
}

fn resolve_type_ref(
    ty: &mut TypeRef,
    scope: &str,
    table: &SymbolTable,
    location: &Location,
    require: Option<SymbolKind>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let TypeRef::Named(name) = ty else { return };
    match resolve_name(name, scope, table) {
        Some((absolute, kind)) => {
            if let Some(required) = require {
                if kind != required {
                    let what = match required {
                        SymbolKind::Message => "a message type",
                        SymbolKind::Enum => "an enum type",
                    };
                    diagnostics.push(Diagnostic::error(
                        location.clone(),
                        format!("'{name}' does not name {what}"),
                    ));
                }
            }
            *name = absolute;
        }
        None => {
            diagnostics.push(Diagnostic::error(location.clone(), format!("unresolved type reference '{name}'")));
        }
    }
}

fn resolve_extend(extend: &mut Extend, scope: &str, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    resolve_type_ref(&mut extend.extendee, scope, table, &extend.location, Some(SymbolKind::Message), diagnostics);
    for field in &mut extend.fields {
        resolve_type_ref(&mut field.ty, scope, table, &field.location, None, diagnostics);
    }
}

fn resolve_message(message: &mut Message, scope: &str, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    let own_scope = format!("{scope}.{}", message.name);
    for field in &mut message.fields {
        resolve_type_ref(&mut field.ty, &own_scope, table, &field.location, None, diagnostics);
    }
    for map_field in &mut message.map_fields {
        resolve_type_ref(&mut map_field.value, &own_scope, table, &map_field.location, None, diagnostics);
    }
    for extend in &mut message.extends {
        resolve_extend(extend, &own_scope, table, diagnostics);
    }
    for nested in &mut message.nested_messages {
        resolve_message(nested, &own_scope, table, diagnostics);
    }
}

/// Resolves every `TypeRef::Named` reachable from `file` in place, rewriting
/// it to its absolute fully-qualified name. Unresolved or kind-mismatched
/// references are recorded as diagnostics and left unrewritten.
pub fn resolve_file(file: &mut File, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    let package_scope = file.package.as_deref().map(|p| format!(".{p}")).unwrap_or_default();
    for message in &mut file.messages {
        resolve_message(message, &package_scope, table, diagnostics);
    }
    for extend in &mut file.extends {
        resolve_extend(extend, &package_scope, table, diagnostics);
    }
    for service in &mut file.services {
        for method in &mut service.methods {
            resolve_type_ref(&mut method.input_type, &package_scope, table, &method.location, Some(SymbolKind::Message), diagnostics);
            resolve_type_ref(&mut method.output_type, &package_scope, table, &method.location, Some(SymbolKind::Message), diagnostics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::parse;
    use std::collections::HashMap;

    #[test]
    fn resolves_sibling_and_outer_scope_references() {
        let (mut file, _) = parse(
            "a.proto",
            "package a; message Outer { message Inner { Sibling s = 1; Top t = 2; } message Sibling {} } message Top {}",
        );
        let mut files = HashMap::new();
        files.insert("a.proto".to_string(), file.clone());
        let mut diagnostics = Vec::new();
        let table = SymbolTable::build(&files, &mut diagnostics);
        resolve_file(&mut file, &table, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let inner = &file.messages[0].nested_messages[0];
        assert_eq!(inner.fields[0].ty, TypeRef::Named(".a.Outer.Sibling".to_string()));
        assert_eq!(inner.fields[1].ty, TypeRef::Named(".a.Top".to_string()));
    }

    #[test]
    fn reports_unresolved_references() {
        let (mut file, _) = parse("a.proto", "message M { Nope n = 1; }");
        let mut files = HashMap::new();
        files.insert("a.proto".to_string(), file.clone());
        let mut diagnostics = Vec::new();
        let table = SymbolTable::build(&files, &mut diagnostics);
        resolve_file(&mut file, &table, &mut diagnostics);
        assert!(diagnostics.iter().any(|d| d.message.contains("unresolved")));
    }
}
