//! Lexer and recursive-descent parser for `.proto` source text.
//!
//! This crate stops at the AST: it never resolves imports, type names, or
//! validates anything beyond what the grammar itself enforces. That work
//! belongs to the linker crate built on top of it.

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod location;
mod parser;
pub mod token;

pub use ast::*;
pub use diagnostic::{has_errors, Diagnostic, Severity};
pub use location::Location;
pub use parser::parse;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_file_end_to_end() {
        let (file, diagnostics) = parse(
            "addressbook.proto",
            r#"
            syntax = "proto3";
            package tutorial;

            message Person {
                string name = 1;
                int32 id = 2;
                string email = 3;

                enum PhoneType {
                    MOBILE = 0;
                    HOME = 1;
                    WORK = 2;
                }

                message PhoneNumber {
                    string number = 1;
                    PhoneType type = 2;
                }

                repeated PhoneNumber phones = 4;
            }

            message AddressBook {
                repeated Person people = 1;
            }
            "#,
        );
        assert!(!has_errors(&diagnostics), "{diagnostics:?}");
        assert_eq!(file.package.as_deref(), Some("tutorial"));
        assert_eq!(file.messages.len(), 2);
        assert_eq!(file.messages[0].nested_messages[0].name, "PhoneNumber");
        assert_eq!(file.messages[0].nested_enums[0].values.len(), 3);
    }
}
