use std::collections::HashMap;

use protokit_front::{Diagnostic, Enum, Extend, File, Label, Location, Message, Syntax, TypeRef};

use crate::symbols::SymbolTable;

const MAX_FIELD_NUMBER: i32 = (1 << 29) - 1;

fn record_field_number(
    seen: &mut HashMap<i32, Location>,
    reserved: &[protokit_front::NumberRange],
    number: i32,
    location: &Location,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !(1..=MAX_FIELD_NUMBER).contains(&number) {
        diagnostics.push(Diagnostic::error(
            location.clone(),
            format!("field number {number} is out of range [1, {MAX_FIELD_NUMBER}]"),
        ));
    }
    if reserved.iter().any(|r| number >= r.start && number <= r.end) {
        diagnostics.push(Diagnostic::error(location.clone(), format!("field number {number} is reserved")));
    }
    if let Some(previous) = seen.insert(number, location.clone()) {
        diagnostics.push(Diagnostic::error(
            location.clone(),
            format!("field number {number} is already used at {previous}"),
        ));
    }
}

fn validate_message(file: &File, message: &Message, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen_numbers = HashMap::new();

    for field in &message.fields {
        record_field_number(&mut seen_numbers, &message.reserved_ranges, field.number, &field.location, diagnostics);
        if message.reserved_names.iter().any(|n| n == &field.name) {
            diagnostics.push(Diagnostic::error(
                field.location.clone(),
                format!("field name '{}' is reserved", field.name),
            ));
        }
        if file.syntax == Syntax::Proto3 && field.label == Label::Required {
            diagnostics.push(Diagnostic::error(field.location.clone(), "proto3 fields may not be 'required'"));
        }
        if field.label == Label::Required && field.oneof_index.is_some() {
            diagnostics.push(Diagnostic::error(field.location.clone(), "a oneof member cannot be 'required'"));
        }
    }

    for map_field in &message.map_fields {
        record_field_number(&mut seen_numbers, &message.reserved_ranges, map_field.number, &map_field.location, diagnostics);
        if !map_field.key.is_legal_map_key() {
            diagnostics.push(Diagnostic::error(
                map_field.location.clone(),
                "map keys must be an integral, bool, or string scalar type",
            ));
        }
    }

    for extend in &message.extends {
        validate_extend(extend, table, diagnostics);
    }
    for nested in &message.nested_messages {
        validate_message(file, nested, table, diagnostics);
    }
    for e in &message.nested_enums {
        validate_enum(file, e, diagnostics);
    }
}

fn validate_enum(file: &File, e: &Enum, diagnostics: &mut Vec<Diagnostic>) {
    if file.syntax == Syntax::Proto3 {
        if e.values.first().map_or(true, |v| v.number != 0) {
            diagnostics.push(Diagnostic::error(
                e.location.clone(),
                "proto3 enums must define a zero-valued first value",
            ));
        }
    }
    let allow_alias = e.allow_alias();
    let mut seen: HashMap<i32, &str> = HashMap::new();
    for value in &e.values {
        if let Some(previous) = seen.insert(value.number, &value.name) {
            if !allow_alias {
                diagnostics.push(Diagnostic::error(
                    value.location.clone(),
                    format!(
                        "enum value '{}' aliases '{previous}' at {}; add 'option allow_alias = true' to permit aliasing",
                        value.name, value.number
                    ),
                ));
            }
        }
    }
}

fn validate_extend(extend: &Extend, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    let TypeRef::Named(extendee) = &extend.extendee else {
        return;
    };
    let Some(ranges) = table.extension_ranges.get(extendee) else {
        // Unresolved extendee already produced a diagnostic during resolution.
        return;
    };
    for field in &extend.fields {
        if !ranges.iter().any(|r| field.number >= r.start && field.number <= r.end) {
            diagnostics.push(Diagnostic::error(
                field.location.clone(),
                format!("extension field number {} is not within an extension range of '{extendee}'", field.number),
            ));
        }
    }
}

/// Runs every §4.5.4 validation rule over `file`, appending diagnostics for
/// every violation found rather than stopping at the first.
pub fn validate_file(file: &File, table: &SymbolTable, diagnostics: &mut Vec<Diagnostic>) {
    for message in &file.messages {
        validate_message(file, message, table, diagnostics);
    }
    for e in &file.enums {
        validate_enum(file, e, diagnostics);
    }
    for extend in &file.extends {
        validate_extend(extend, table, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::parse;
    use std::collections::HashMap as Map;

    fn check(source: &str) -> Vec<Diagnostic> {
        let (file, mut diagnostics) = parse("a.proto", source);
        let mut files = Map::new();
        files.insert("a.proto".to_string(), file.clone());
        let table = SymbolTable::build(&files, &mut diagnostics);
        validate_file(&file, &table, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn rejects_duplicate_field_numbers() {
        let diagnostics = check("message M { string a = 1; int32 b = 1; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("already used")));
    }

    #[test]
    fn rejects_field_numbers_in_reserved_ranges() {
        let diagnostics = check("message M { reserved 5 to 10; string a = 7; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("reserved")));
    }

    #[test]
    fn rejects_required_fields_in_proto3() {
        let diagnostics = check("syntax = \"proto3\"; message M { required string a = 1; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("may not be 'required'")));
    }

    #[test]
    fn proto3_enum_without_zero_first_value_is_an_error() {
        let diagnostics = check("syntax = \"proto3\"; enum E { A = 1; B = 0; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("zero-valued first value")));
    }

    #[test]
    fn enum_aliases_require_allow_alias() {
        let diagnostics = check("enum E { A = 0; B = 0; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("allow_alias")));

        let diagnostics = check("enum E { option allow_alias = true; A = 0; B = 0; }");
        assert!(!diagnostics.iter().any(|d| d.message.contains("allow_alias")));
    }

    #[test]
    fn illegal_map_key_types_are_rejected() {
        let diagnostics = check("message M { map<float, string> bad = 1; }");
        assert!(diagnostics.iter().any(|d| d.message.contains("map keys")));
    }
}
