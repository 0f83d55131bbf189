use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

/// A dotted Rust module path (`a::b::c`), derived from a protobuf package
/// (`a.b.c`) or, absent one, from the source file's stem (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Module(pub Vec<String>);

impl Module {
    pub fn from_package(package: Option<&str>, file_stem: &str) -> Self {
        match package {
            Some(p) if !p.is_empty() => Module(p.split('.').map(str::to_string).collect()),
            _ => Module(vec![crate::ident::sanitize_module_segment(file_stem)]),
        }
    }

    /// Emits the `super::`/segment path to get from `self` to `target`,
    /// sharing their common module prefix (mirrors the teacher's relative
    /// module-path resolution between generated files).
    pub fn relative_path_to(&self, target: &Module) -> TokenStream {
        let common = self.0.iter().zip(target.0.iter()).take_while(|(a, b)| a == b).count();
        let ups = self.0.len() - common;
        let mut segments: Vec<TokenStream> = Vec::new();
        for _ in 0..ups {
            segments.push(quote!(super));
        }
        for seg in &target.0[common..] {
            let ident = Ident::new(seg, Span::call_site());
            segments.push(quote!(#ident));
        }
        quote!(#(#segments)::*)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_module_path_is_empty() {
        let m = Module(vec!["a".into(), "b".into()]);
        assert_eq!(m.relative_path_to(&m).to_string(), "");
    }

    #[test]
    fn sibling_module_uses_one_super() {
        let from = Module(vec!["a".into(), "b".into()]);
        let to = Module(vec!["a".into(), "c".into()]);
        assert_eq!(from.relative_path_to(&to).to_string(), "super :: c");
    }

    #[test]
    fn package_without_dots_uses_file_stem_when_absent() {
        let m = Module::from_package(None, "weird-file.name");
        assert_eq!(m.0, vec!["weird_file_name".to_string()]);
    }
}
