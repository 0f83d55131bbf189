use std::collections::VecDeque;
use std::sync::Arc;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::location::Location;
use crate::token::{Token, TokenKind};

/// Recursive-descent, resynchronizing parser (§4.4). Never aborts on a
/// syntax error: it records a diagnostic and skips to the next `;` or
/// balanced `}`, so one malformed file still yields every diagnostic worth
/// reporting in a single pass.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    file: Arc<str>,
    lookahead: VecDeque<Token>,
    diagnostics: Vec<Diagnostic>,
    syntax: Syntax,
}

/// Parses one `.proto` file, returning its AST and every diagnostic
/// recorded along the way (empty if the file was entirely well-formed).
pub fn parse(file_name: impl Into<Arc<str>>, source: &str) -> (File, Vec<Diagnostic>) {
    let file: Arc<str> = file_name.into();
    let mut parser = Parser {
        lexer: Lexer::new(file.clone(), source),
        file,
        lookahead: VecDeque::new(),
        diagnostics: Vec::new(),
        syntax: Syntax::Proto3,
    };
    let ast = parser.parse_file();
    (ast, parser.diagnostics)
}

impl<'a> Parser<'a> {
    fn fill(&mut self, n: usize) {
        while self.lookahead.len() < n {
            match self.lexer.next() {
                Ok(token) => {
                    let eof = token.is_eof();
                    self.lookahead.push_back(token);
                    if eof {
                        break;
                    }
                }
                Err(diagnostic) => {
                    log::warn!("{diagnostic}");
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn peek(&mut self) -> &Token {
        self.fill(1);
        self.lookahead.front().expect("fill(1) guarantees a token")
    }

    fn peek2(&mut self) -> &Token {
        self.fill(2);
        self.lookahead.get(1).unwrap_or_else(|| self.lookahead.back().unwrap())
    }

    fn bump(&mut self) -> Token {
        self.fill(1);
        self.lookahead.pop_front().expect("fill(1) guarantees a token")
    }

    fn error(&mut self, location: Location, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(location, message);
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn loc(&mut self) -> Location {
        self.peek().location.clone()
    }

    /// Skips to the next top-level-relative `;` or unmatched `}`, per §4.4.
    fn resync(&mut self) {
        log::debug!("resyncing after a parse error");
        let mut depth: i32 = 0;
        loop {
            let token = self.bump();
            match &token.kind {
                TokenKind::Eof => return,
                TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct('}') => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Punct(';') if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn expect_punct(&mut self, c: char) -> bool {
        if self.peek().is_punct(c) {
            self.bump();
            true
        } else {
            let loc = self.loc();
            self.error(loc, format!("expected '{c}'"));
            false
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        if self.peek().ident().is_some() {
            match self.bump().kind {
                TokenKind::Ident(s) => Some(s),
                _ => unreachable!(),
            }
        } else {
            let loc = self.loc();
            self.error(loc, "expected an identifier");
            None
        }
    }

    fn expect_integer(&mut self) -> Option<i64> {
        let negative = if self.peek().is_punct('-') {
            self.bump();
            true
        } else {
            false
        };
        match self.peek().kind {
            TokenKind::Integer(v) => {
                self.bump();
                let v = v as i64;
                Some(if negative { -v } else { v })
            }
            _ => {
                let loc = self.loc();
                self.error(loc, "expected an integer");
                None
            }
        }
    }

    fn parse_file(&mut self) -> File {
        let mut syntax = Syntax::Proto3;
        if self.peek().is_ident("syntax") {
            self.bump();
            self.expect_punct('=');
            let loc = self.loc();
            match self.peek().kind.clone() {
                TokenKind::Str(s) if s == "proto2" => {
                    syntax = Syntax::Proto2;
                    self.bump();
                }
                TokenKind::Str(s) if s == "proto3" => {
                    syntax = Syntax::Proto3;
                    self.bump();
                }
                TokenKind::Str(_) => {
                    self.error(loc, "unrecognized syntax; defaulting to proto3");
                    self.bump();
                }
                _ => {
                    self.error(loc, "expected a syntax string literal");
                }
            }
            self.expect_punct(';');
        }
        self.syntax = syntax;

        let mut file = File {
            name: self.file.to_string(),
            syntax,
            package: None,
            imports: Vec::new(),
            options: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            services: Vec::new(),
            extends: Vec::new(),
        };

        loop {
            match self.peek().kind.clone() {
                TokenKind::Eof => break,
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Ident(kw) if kw == "import" => {
                    if let Some(import) = self.parse_import() {
                        file.imports.push(import);
                    }
                }
                TokenKind::Ident(kw) if kw == "package" => {
                    self.bump();
                    if let Some(name) = self.parse_dotted_name() {
                        file.package = Some(name);
                    }
                    self.expect_punct(';');
                }
                TokenKind::Ident(kw) if kw == "option" => {
                    if let Some(opt) = self.parse_option_statement() {
                        file.options.push(opt);
                    }
                }
                TokenKind::Ident(kw) if kw == "message" => {
                    file.messages.push(self.parse_message());
                }
                TokenKind::Ident(kw) if kw == "enum" => {
                    file.enums.push(self.parse_enum());
                }
                TokenKind::Ident(kw) if kw == "service" => {
                    file.services.push(self.parse_service());
                }
                TokenKind::Ident(kw) if kw == "extend" => {
                    file.extends.push(self.parse_extend());
                }
                _ => {
                    let loc = self.loc();
                    self.error(loc, "expected import, package, option, message, enum, service, or extend");
                    self.resync();
                }
            }
        }

        file
    }

    fn parse_dotted_name(&mut self) -> Option<String> {
        let leading_dot = self.peek().is_punct('.');
        if leading_dot {
            self.bump();
        }
        let mut name = if leading_dot { ".".to_string() } else { String::new() };
        name.push_str(&self.expect_ident()?);
        while self.peek().is_punct('.') {
            self.bump();
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Some(name)
    }

    fn parse_import(&mut self) -> Option<Import> {
        let location = self.loc();
        self.bump();
        let mut public = false;
        let mut weak = false;
        if self.peek().is_ident("public") {
            self.bump();
            public = true;
        } else if self.peek().is_ident("weak") {
            self.bump();
            weak = true;
        }
        let path = match self.bump().kind {
            TokenKind::Str(s) => s,
            _ => {
                self.error(location.clone(), "expected an import path string");
                self.resync();
                return None;
            }
        };
        self.expect_punct(';');
        Some(Import {
            path,
            public,
            weak,
            location,
        })
    }

    fn parse_constant(&mut self) -> Option<Constant> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Str(_) => {
                let mut value = String::new();
                while let TokenKind::Str(s) = self.peek().kind.clone() {
                    value.push_str(&s);
                    self.bump();
                }
                Some(Constant::Str(value))
            }
            TokenKind::Ident(s) if s == "true" => {
                self.bump();
                Some(Constant::Bool(true))
            }
            TokenKind::Ident(s) if s == "false" => {
                self.bump();
                Some(Constant::Bool(false))
            }
            TokenKind::Ident(s) if s == "inf" => {
                self.bump();
                Some(Constant::Float(f64::INFINITY))
            }
            TokenKind::Ident(s) if s == "nan" => {
                self.bump();
                Some(Constant::Float(f64::NAN))
            }
            TokenKind::Ident(_) => {
                let name = self.parse_dotted_name()?;
                Some(Constant::Ident(name))
            }
            TokenKind::Integer(v) => {
                self.bump();
                Some(Constant::UInt(v))
            }
            TokenKind::Float(v) => {
                self.bump();
                Some(Constant::Float(v))
            }
            TokenKind::Punct('-') => {
                self.bump();
                match self.peek().kind.clone() {
                    TokenKind::Integer(v) => {
                        self.bump();
                        Some(Constant::Int(-(v as i64)))
                    }
                    TokenKind::Float(v) => {
                        self.bump();
                        Some(Constant::Float(-v))
                    }
                    TokenKind::Ident(s) if s == "inf" => {
                        self.bump();
                        Some(Constant::Float(f64::NEG_INFINITY))
                    }
                    _ => {
                        self.error(token.location.clone(), "expected a number after '-'");
                        None
                    }
                }
            }
            TokenKind::Punct('+') => {
                self.bump();
                self.parse_constant()
            }
            TokenKind::Punct('{') => {
                let text = self.capture_balanced_braces();
                Some(Constant::Aggregate(text))
            }
            _ => {
                self.error(token.location.clone(), "expected a constant value");
                None
            }
        }
    }

    /// Aggregate option values are not interpreted — only their raw text
    /// span between balanced braces is kept (§4.4).
    fn capture_balanced_braces(&mut self) -> String {
        let mut depth = 0;
        let mut text = String::new();
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::Punct('{') => {
                    depth += 1;
                    text.push('{');
                    self.bump();
                }
                TokenKind::Punct('}') => {
                    depth -= 1;
                    text.push('}');
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
                _ => {
                    text.push_str(&token_text(&token.kind));
                    text.push(' ');
                    self.bump();
                }
            }
        }
        text
    }

    fn parse_option_name(&mut self) -> Option<OptionName> {
        let mut parts = Vec::new();
        loop {
            if self.peek().is_punct('(') {
                self.bump();
                let name = self.parse_dotted_name()?;
                self.expect_punct(')');
                parts.push(OptionNamePart {
                    name,
                    is_extension: true,
                });
            } else {
                let name = self.expect_ident()?;
                parts.push(OptionNamePart {
                    name,
                    is_extension: false,
                });
            }
            if self.peek().is_punct('.') {
                self.bump();
                continue;
            }
            break;
        }
        Some(OptionName { parts })
    }

    /// `option name = value;` at file, message, or nested scope.
    fn parse_option_statement(&mut self) -> Option<OptionEntry> {
        let location = self.loc();
        self.bump();
        let name = self.parse_option_name()?;
        self.expect_punct('=');
        let value = self.parse_constant()?;
        self.expect_punct(';');
        Some(OptionEntry { name, value, location })
    }

    /// A single `[name = value, ...]` inline field-options block.
    fn parse_bracketed_options(&mut self) -> Vec<OptionEntry> {
        let mut options = Vec::new();
        if !self.peek().is_punct('[') {
            return options;
        }
        self.bump();
        loop {
            let location = self.loc();
            let Some(name) = self.parse_option_name() else {
                break;
            };
            if !self.expect_punct('=') {
                break;
            }
            let Some(value) = self.parse_constant() else {
                break;
            };
            options.push(OptionEntry { name, value, location });
            if self.peek().is_punct(',') {
                self.bump();
                continue;
            }
            break;
        }
        self.expect_punct(']');
        options
    }

    fn parse_type_ref(&mut self) -> Option<TypeRef> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                if let Some(scalar) = ScalarType::from_keyword(name) {
                    self.bump();
                    return Some(TypeRef::Scalar(scalar));
                }
                let name = self.parse_dotted_name()?;
                Some(TypeRef::Named(name))
            }
            TokenKind::Punct('.') => {
                let name = self.parse_dotted_name()?;
                Some(TypeRef::Named(name))
            }
            _ => {
                self.error(token.location, "expected a type name");
                None
            }
        }
    }

    fn is_label_keyword(&mut self) -> bool {
        matches!(self.peek().ident(), Some("optional" | "required" | "repeated"))
    }

    /// Parses one field, including `map<K, V>` fields which are kept
    /// separate from ordinary fields (§3).
    fn parse_field_or_map(&mut self, field_owner: &mut Message, oneof_index: Option<usize>) {
        let location = self.loc();

        if self.peek().is_ident("map") && self.peek2().is_punct('<') {
            self.bump();
            self.bump();
            let key_token = self.peek().clone();
            let key = match key_token.kind {
                TokenKind::Ident(name) => ScalarType::from_keyword(&name),
                _ => None,
            };
            if key.is_some() {
                self.bump();
            } else {
                self.error(key_token.location, "map key must be a scalar type");
            }
            self.expect_punct(',');
            let Some(value) = self.parse_type_ref() else {
                self.resync();
                return;
            };
            self.expect_punct('>');
            let Some(name) = self.expect_ident() else {
                self.resync();
                return;
            };
            self.expect_punct('=');
            let Some(number) = self.expect_integer() else {
                self.resync();
                return;
            };
            let options = self.parse_bracketed_options();
            self.expect_punct(';');
            field_owner.map_fields.push(MapField {
                name,
                number: number as i32,
                key: key.unwrap_or(ScalarType::String),
                value,
                options,
                location,
            });
            return;
        }

        let label = if oneof_index.is_some() {
            Label::Implicit
        } else if self.is_label_keyword() {
            match self.bump().kind {
                TokenKind::Ident(s) if s == "optional" => Label::Optional,
                TokenKind::Ident(s) if s == "required" => Label::Required,
                TokenKind::Ident(s) if s == "repeated" => Label::Repeated,
                _ => unreachable!(),
            }
        } else if self.syntax == Syntax::Proto2 {
            // proto2 fields always carry an explicit label; a bare field
            // here means a malformed file, but the historical default for
            // an absent label is `required`, not implicit presence.
            Label::Required
        } else {
            Label::Implicit
        };

        let Some(ty) = self.parse_type_ref() else {
            self.resync();
            return;
        };
        let Some(name) = self.expect_ident() else {
            self.resync();
            return;
        };
        if !self.expect_punct('=') {
            self.resync();
            return;
        }
        let Some(number) = self.expect_integer() else {
            self.resync();
            return;
        };
        let options = self.parse_bracketed_options();
        self.expect_punct(';');
        field_owner.fields.push(Field {
            name,
            number: number as i32,
            label,
            ty,
            options,
            oneof_index,
            location,
        });
    }

    fn parse_oneof(&mut self, message: &mut Message) {
        self.bump();
        let location = self.loc();
        let Some(name) = self.expect_ident() else {
            self.resync();
            return;
        };
        if !self.expect_punct('{') {
            self.resync();
            return;
        }
        let index = message.oneofs.len();
        let mut oneof_options = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::Punct('}') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Ident(kw) if kw == "option" => {
                    if let Some(opt) = self.parse_option_statement() {
                        oneof_options.push(opt);
                    }
                }
                TokenKind::Eof => break,
                _ => self.parse_field_or_map(message, Some(index)),
            }
        }
        message.oneofs.push(OneOf {
            name,
            options: oneof_options,
            location,
        });
    }

    /// `N`, `N to M`, or `N to max` number-range lists for `reserved`/`extensions`.
    fn parse_number_ranges(&mut self) -> Vec<NumberRange> {
        let mut ranges = Vec::new();
        loop {
            let Some(start) = self.expect_integer() else {
                break;
            };
            let end = if self.peek().is_ident("to") {
                self.bump();
                if self.peek().is_ident("max") {
                    self.bump();
                    i32::MAX
                } else {
                    self.expect_integer().unwrap_or(start) as i32
                }
            } else {
                start as i32
            };
            ranges.push(NumberRange {
                start: start as i32,
                end,
            });
            if self.peek().is_punct(',') {
                self.bump();
                continue;
            }
            break;
        }
        ranges
    }

    fn parse_reserved(&mut self, message: &mut Message) {
        self.bump();
        if let TokenKind::Str(_) = self.peek().kind {
            loop {
                match self.bump().kind {
                    TokenKind::Str(s) => message.reserved_names.push(s),
                    _ => break,
                }
                if self.peek().is_punct(',') {
                    self.bump();
                    continue;
                }
                break;
            }
        } else {
            message.reserved_ranges.extend(self.parse_number_ranges());
        }
        self.expect_punct(';');
    }

    fn parse_extensions(&mut self, message: &mut Message) {
        self.bump();
        message.extension_ranges.extend(self.parse_number_ranges());
        // Trailing bracketed options on `extensions N to M [...]` are parsed
        // and discarded; they don't affect range validation.
        self.parse_bracketed_options();
        self.expect_punct(';');
    }

    fn parse_extend(&mut self) -> Extend {
        let location = self.loc();
        self.bump();
        let extendee = self.parse_type_ref().unwrap_or(TypeRef::Named(String::new()));
        let mut extend = Extend {
            extendee,
            fields: Vec::new(),
            location,
        };
        if !self.expect_punct('{') {
            self.resync();
            return extend;
        }
        let mut host = Message {
            name: String::new(),
            fields: Vec::new(),
            map_fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            reserved_ranges: Vec::new(),
            reserved_names: Vec::new(),
            extension_ranges: Vec::new(),
            extends: Vec::new(),
            options: Vec::new(),
            location: extend.location.clone(),
        };
        loop {
            match self.peek().kind.clone() {
                TokenKind::Punct('}') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Eof => break,
                _ => self.parse_field_or_map(&mut host, None),
            }
        }
        extend.fields = host.fields;
        extend
    }

    fn parse_message(&mut self) -> Message {
        let location = self.loc();
        self.bump();
        let name = self.expect_ident().unwrap_or_default();
        let mut message = Message {
            name,
            fields: Vec::new(),
            map_fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            reserved_ranges: Vec::new(),
            reserved_names: Vec::new(),
            extension_ranges: Vec::new(),
            extends: Vec::new(),
            options: Vec::new(),
            location,
        };
        if !self.expect_punct('{') {
            self.resync();
            return message;
        }
        loop {
            match self.peek().kind.clone() {
                TokenKind::Punct('}') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Ident(kw) if kw == "message" => {
                    message.nested_messages.push(self.parse_message());
                }
                TokenKind::Ident(kw) if kw == "enum" => {
                    message.nested_enums.push(self.parse_enum());
                }
                TokenKind::Ident(kw) if kw == "oneof" => {
                    self.parse_oneof(&mut message);
                }
                TokenKind::Ident(kw) if kw == "reserved" => {
                    self.parse_reserved(&mut message);
                }
                TokenKind::Ident(kw) if kw == "extensions" => {
                    self.parse_extensions(&mut message);
                }
                TokenKind::Ident(kw) if kw == "extend" => {
                    message.extends.push(self.parse_extend());
                }
                TokenKind::Ident(kw) if kw == "option" => {
                    if let Some(opt) = self.parse_option_statement() {
                        message.options.push(opt);
                    }
                }
                TokenKind::Eof => break,
                _ => self.parse_field_or_map(&mut message, None),
            }
        }
        message
    }

    fn parse_enum(&mut self) -> Enum {
        let location = self.loc();
        self.bump();
        let name = self.expect_ident().unwrap_or_default();
        let mut e = Enum {
            name,
            values: Vec::new(),
            options: Vec::new(),
            reserved_ranges: Vec::new(),
            reserved_names: Vec::new(),
            location,
        };
        if !self.expect_punct('{') {
            self.resync();
            return e;
        }
        loop {
            match self.peek().kind.clone() {
                TokenKind::Punct('}') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Ident(kw) if kw == "option" => {
                    if let Some(opt) = self.parse_option_statement() {
                        e.options.push(opt);
                    }
                }
                TokenKind::Ident(kw) if kw == "reserved" => {
                    self.bump();
                    if let TokenKind::Str(_) = self.peek().kind {
                        loop {
                            match self.bump().kind {
                                TokenKind::Str(s) => e.reserved_names.push(s),
                                _ => break,
                            }
                            if self.peek().is_punct(',') {
                                self.bump();
                                continue;
                            }
                            break;
                        }
                    } else {
                        e.reserved_ranges.extend(self.parse_number_ranges());
                    }
                    self.expect_punct(';');
                }
                TokenKind::Eof => break,
                _ => {
                    let value_location = self.loc();
                    let Some(name) = self.expect_ident() else {
                        self.resync();
                        continue;
                    };
                    if !self.expect_punct('=') {
                        self.resync();
                        continue;
                    }
                    let Some(number) = self.expect_integer() else {
                        self.resync();
                        continue;
                    };
                    let options = self.parse_bracketed_options();
                    self.expect_punct(';');
                    e.values.push(EnumValue {
                        name,
                        number: number as i32,
                        options,
                        location: value_location,
                    });
                }
            }
        }
        e
    }

    fn parse_service(&mut self) -> Service {
        let location = self.loc();
        self.bump();
        let name = self.expect_ident().unwrap_or_default();
        let mut service = Service {
            name,
            methods: Vec::new(),
            options: Vec::new(),
            location,
        };
        if !self.expect_punct('{') {
            self.resync();
            return service;
        }
        loop {
            match self.peek().kind.clone() {
                TokenKind::Punct('}') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(';') => {
                    self.bump();
                }
                TokenKind::Ident(kw) if kw == "option" => {
                    if let Some(opt) = self.parse_option_statement() {
                        service.options.push(opt);
                    }
                }
                TokenKind::Ident(kw) if kw == "rpc" => {
                    service.methods.push(self.parse_method());
                }
                TokenKind::Eof => break,
                _ => {
                    let loc = self.loc();
                    self.error(loc, "expected an rpc method or option");
                    self.resync();
                }
            }
        }
        service
    }

    fn parse_method(&mut self) -> Method {
        let location = self.loc();
        self.bump();
        let name = self.expect_ident().unwrap_or_default();
        self.expect_punct('(');
        let client_streaming = if self.peek().is_ident("stream") {
            self.bump();
            true
        } else {
            false
        };
        let input_type = self.parse_type_ref().unwrap_or(TypeRef::Named(String::new()));
        self.expect_punct(')');
        if self.peek().is_ident("returns") {
            self.bump();
        } else {
            let loc = self.loc();
            self.error(loc, "expected 'returns'");
        }
        self.expect_punct('(');
        let server_streaming = if self.peek().is_ident("stream") {
            self.bump();
            true
        } else {
            false
        };
        let output_type = self.parse_type_ref().unwrap_or(TypeRef::Named(String::new()));
        self.expect_punct(')');

        let mut method = Method {
            name,
            input_type,
            client_streaming,
            output_type,
            server_streaming,
            options: Vec::new(),
            location,
        };

        if self.peek().is_punct('{') {
            self.bump();
            loop {
                match self.peek().kind.clone() {
                    TokenKind::Punct('}') => {
                        self.bump();
                        break;
                    }
                    TokenKind::Punct(';') => {
                        self.bump();
                    }
                    TokenKind::Ident(kw) if kw == "option" => {
                        if let Some(opt) = self.parse_option_statement() {
                            method.options.push(opt);
                        }
                    }
                    TokenKind::Eof => break,
                    _ => {
                        let loc = self.loc();
                        self.error(loc, "expected an option inside an rpc method body");
                        self.resync();
                    }
                }
            }
        } else {
            self.expect_punct(';');
        }

        method
    }
}

fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => s.clone(),
        TokenKind::Integer(v) => v.to_string(),
        TokenKind::Float(v) => v.to_string(),
        TokenKind::Str(s) => format!("{s:?}"),
        TokenKind::Punct(c) => c.to_string(),
        TokenKind::Eof => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_syntax_declaration_and_defaults_to_proto3_otherwise() {
        let (file, diagnostics) = parse("a.proto", "syntax = \"proto3\"; message M {}");
        assert!(diagnostics.is_empty());
        assert_eq!(file.syntax, Syntax::Proto3);
        assert_eq!(file.messages.len(), 1);

        let (file, diagnostics) = parse("b.proto", "message M {}");
        assert!(diagnostics.is_empty());
        assert_eq!(file.syntax, Syntax::Proto3);
    }

    #[test]
    fn parses_fields_labels_and_numbers() {
        let (file, diagnostics) = parse(
            "a.proto",
            r#"syntax = "proto2";
            message Person {
                required string name = 1;
                optional int32 id = 2;
                repeated string tags = 3 [packed = true];
            }"#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let message = &file.messages[0];
        assert_eq!(message.fields[0].label, Label::Required);
        assert_eq!(message.fields[1].label, Label::Optional);
        assert_eq!(message.fields[2].label, Label::Repeated);
        assert_eq!(message.fields[2].options[0].name.as_simple(), Some("packed"));
    }

    #[test]
    fn unlabeled_field_defaults_to_required_under_proto2_and_implicit_under_proto3() {
        let (file, _) = parse(
            "a.proto",
            r#"syntax = "proto2"; message M { string name = 1; }"#,
        );
        assert_eq!(file.messages[0].fields[0].label, Label::Required);

        let (file, _) = parse(
            "b.proto",
            r#"syntax = "proto3"; message M { string name = 1; }"#,
        );
        assert_eq!(file.messages[0].fields[0].label, Label::Implicit);
    }

    #[test]
    fn parses_map_fields_separately_from_ordinary_fields() {
        let (file, diagnostics) = parse(
            "a.proto",
            "message M { map<string, int32> counts = 1; }",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(file.messages[0].map_fields[0].key, ScalarType::String);
        assert_eq!(file.messages[0].fields.len(), 0);
    }

    #[test]
    fn parses_oneof_members_as_implicit_label() {
        let (file, diagnostics) = parse(
            "a.proto",
            "message M { oneof kind { string a = 1; int32 b = 2; } }",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let message = &file.messages[0];
        assert_eq!(message.oneofs.len(), 1);
        assert_eq!(message.fields[0].oneof_index, Some(0));
        assert_eq!(message.fields[0].label, Label::Implicit);
    }

    #[test]
    fn parses_reserved_ranges_and_names() {
        let (file, diagnostics) = parse(
            "a.proto",
            r#"message M { reserved 2, 15, 9 to 11; reserved "foo", "bar"; }"#,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let message = &file.messages[0];
        assert_eq!(
            message.reserved_ranges,
            vec![
                NumberRange { start: 2, end: 2 },
                NumberRange { start: 15, end: 15 },
                NumberRange { start: 9, end: 11 },
            ]
        );
        assert_eq!(message.reserved_names, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn recovers_from_a_malformed_field_and_keeps_parsing() {
        let (file, diagnostics) = parse(
            "a.proto",
            "message M { this is not valid; string ok = 1; }",
        );
        assert!(!diagnostics.is_empty());
        assert_eq!(file.messages[0].fields.last().unwrap().name, "ok");
    }

    #[test]
    fn parses_service_methods_with_streaming_flags() {
        let (file, diagnostics) = parse(
            "a.proto",
            "service Greeter { rpc Chat (stream Req) returns (stream Resp); }",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let method = &file.services[0].methods[0];
        assert!(method.client_streaming);
        assert!(method.server_streaming);
    }

    #[test]
    fn captures_aggregate_option_values_as_raw_text() {
        let (file, diagnostics) = parse(
            "a.proto",
            "message M { string name = 1 [(my.custom) = { key: 1 nested: { x: 2 } }]; }",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            &file.messages[0].fields[0].options[0].value,
            Constant::Aggregate(_)
        ));
    }
}
