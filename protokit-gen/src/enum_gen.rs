use proc_macro2::TokenStream;
use protokit_front::Enum;
use quote::quote;

use crate::ident;

/// Emits a plain `#[repr(i32)]` Rust enum plus `from_i32`, matching how
/// protobuf enums are represented everywhere else in this toolkit: message
/// fields store the raw `i32` so an unrecognized value round-trips, and
/// this type exists only for the typed, fallible view onto it.
pub fn generate(e: &Enum) -> TokenStream {
    let name = ident::type_ident(&e.name);

    // Aliased numbers (under `allow_alias`) only get one Rust variant, the
    // first-declared name; `from_i32` still maps every alias's number to it.
    let mut first_name_for_number = std::collections::HashMap::new();
    for v in &e.values {
        first_name_for_number.entry(v.number).or_insert_with(|| v.name.clone());
    }

    let variants = e.values.iter().filter(|v| first_name_for_number[&v.number] == v.name).map(|v| {
        let variant = ident::type_ident(&v.name);
        let number = v.number;
        quote!(#variant = #number)
    });

    let mut seen_numbers = std::collections::HashSet::new();
    let arms = e
        .values
        .iter()
        .filter(|v| seen_numbers.insert(v.number))
        .map(|v| {
            let number = v.number;
            let canonical = ident::type_ident(&first_name_for_number[&number]);
            quote!(#number => #name::#canonical)
        });

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum #name {
            #(#variants),*
        }

        impl #name {
            pub fn from_i32(value: i32) -> Option<Self> {
                Some(match value {
                    #(#arms,)*
                    _ => return None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::parse;

    #[test]
    fn generates_a_fromi32_covering_every_declared_number() {
        let (file, diagnostics) = parse("a.proto", "enum Color { RED = 0; GREEN = 1; BLUE = 2; }");
        assert!(diagnostics.is_empty());
        let tokens = generate(&file.enums[0]).to_string();
        assert!(tokens.contains("pub enum Color"));
        assert!(tokens.contains("Red = 0i32") || tokens.contains("Red = 0"));
        assert!(tokens.contains("from_i32"));
    }
}
