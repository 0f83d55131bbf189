use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Ident, Span};

/// Rust 2021 strict and reserved keywords; anything else is a legal bare
/// identifier. Field/value names that collide are escaped with `r#` rather
/// than renamed, so generated and source names stay recognizable (§4.6).
const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "union",
];

fn escape(text: &str) -> String {
    if KEYWORDS.contains(&text) {
        format!("r#{text}")
    } else if text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{text}")
    } else {
        text.to_string()
    }
}

/// A Rust field/value identifier: `snake_case`, keyword-escaped.
pub fn field_ident(name: &str) -> Ident {
    let snake = name.to_snake_case();
    Ident::new(&escape(&snake), Span::call_site())
}

/// A Rust type identifier: `UpperCamelCase`, keyword-escaped (only `Self`
/// realistically collides, but the scheme stays uniform).
pub fn type_ident(name: &str) -> Ident {
    let camel = name.to_upper_camel_case();
    Ident::new(&escape(&camel), Span::call_site())
}

/// A Rust module identifier for a nested-type scope: `snake_case` of the
/// parent type's own name, keyword-escaped.
pub fn module_ident(name: &str) -> Ident {
    Ident::new(&escape(&name.to_snake_case()), Span::call_site())
}

pub fn sanitize_module_segment(stem: &str) -> String {
    let snake = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_snake_case();
    escape(&snake)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_keyword_field_names() {
        assert_eq!(field_ident("type").to_string(), "r#type");
        assert_eq!(field_ident("MessageType").to_string(), "message_type");
    }

    #[test]
    fn sanitizes_non_ident_file_stems() {
        assert_eq!(sanitize_module_segment("weird-file.name"), "weird_file_name");
    }
}
