use std::sync::Arc;

use crate::diagnostic::Diagnostic;
use crate::location::Location;
use crate::token::{Token, TokenKind};

/// Byte stream → tokens with locations (§4.3). Comments are consumed here
/// and never reach the token stream; string escapes are resolved eagerly so
/// the parser only ever sees the final text.
pub struct Lexer<'a> {
    file: Arc<str>,
    source: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Result<Token, Diagnostic>>,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<Arc<str>>, source: &'a str) -> Self {
        Lexer {
            file: file.into(),
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    pub fn peek(&mut self) -> Result<&Token, Diagnostic> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_token());
        }
        match self.peeked.as_ref().unwrap() {
            Ok(token) => Ok(token),
            Err(diagnostic) => Err(diagnostic.clone()),
        }
    }

    pub fn next(&mut self) -> Result<Token, Diagnostic> {
        if let Some(token) = self.peeked.take() {
            return token;
        }
        self.lex_token()
    }

    fn here(&self) -> Location {
        Location::new(self.file.clone(), self.line, self.column)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'/') => {
                    while !matches!(self.peek_byte(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek_byte() {
                            None => break,
                            Some(b'*') if self.peek_byte_at(1) == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia();
        let location = self.here();

        let Some(b) = self.peek_byte() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location,
            });
        };

        let kind = match b {
            b'"' | b'\'' => self.lex_string(b)?,
            b'0'..=b'9' => self.lex_number(),
            b'.' if self.peek_byte_at(1).is_some_and(|n| n.is_ascii_digit()) => self.lex_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.lex_ident(),
            b';' | b',' | b'.' | b'=' | b'-' | b'+' | b'{' | b'}' | b'[' | b']' | b'(' | b')' | b'<' | b'>' | b'/' => {
                self.bump();
                TokenKind::Punct(b as char)
            }
            other => {
                self.bump();
                return Err(Diagnostic::error(
                    location,
                    format!("unexpected character {:?}", other as char),
                ));
            }
        };

        Ok(Token { kind, location })
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')) {
            self.bump();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos])
            .expect("identifier bytes are ASCII")
            .to_string();
        TokenKind::Ident(text)
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.peek_byte() == Some(b'0') && matches!(self.peek_byte_at(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.bump();
            }
            let text = std::str::from_utf8(&self.source[start + 2..self.pos]).unwrap();
            let value = u64::from_str_radix(text, 16).unwrap_or(0);
            return TokenKind::Integer(value);
        }

        let mut is_float = false;
        let mut saw_leading_zero_octal = self.peek_byte() == Some(b'0');
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_byte() == Some(b'.') && self.peek_byte_at(1).is_some_and(|b| b.is_ascii_digit() || b == b'e' || b == b'E') {
            is_float = true;
            saw_leading_zero_octal = false;
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        } else if self.peek_byte() == Some(b'.') {
            is_float = true;
            saw_leading_zero_octal = false;
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek_byte(), Some(b'e' | b'E')) {
            let save = (self.pos, self.line, self.column);
            self.bump();
            if matches!(self.peek_byte(), Some(b'+' | b'-')) {
                self.bump();
            }
            if self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                saw_leading_zero_octal = false;
                while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                (self.pos, self.line, self.column) = save;
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else if saw_leading_zero_octal && text.len() > 1 {
            TokenKind::Integer(u64::from_str_radix(text, 8).unwrap_or(0))
        } else {
            TokenKind::Integer(text.parse().unwrap_or(0))
        }
    }

    fn lex_string(&mut self, quote: u8) -> Result<TokenKind, Diagnostic> {
        let start_location = self.here();
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek_byte() {
                None | Some(b'\n') => {
                    return Err(Diagnostic::error(start_location, "unterminated string literal"));
                }
                Some(b) if b == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    value.push(self.lex_escape(&start_location)?);
                }
                Some(_) => {
                    // Re-decode as UTF-8 a byte at a time is unsafe for multi-byte
                    // sequences, so fall back to scanning a full char here.
                    let rest = std::str::from_utf8(&self.source[self.pos..]).unwrap_or("");
                    let c = rest.chars().next().unwrap();
                    for _ in 0..c.len_utf8() {
                        self.bump();
                    }
                    value.push(c);
                }
            }
        }
        Ok(TokenKind::Str(value))
    }

    fn lex_escape(&mut self, start_location: &Location) -> Result<char, Diagnostic> {
        let Some(b) = self.peek_byte() else {
            return Err(Diagnostic::error(start_location.clone(), "unterminated string literal"));
        };
        let simple = match b {
            b'a' => Some('\x07'),
            b'b' => Some('\x08'),
            b'f' => Some('\x0c'),
            b'n' => Some('\n'),
            b'r' => Some('\r'),
            b't' => Some('\t'),
            b'v' => Some('\x0b'),
            b'\\' => Some('\\'),
            b'\'' => Some('\''),
            b'"' => Some('"'),
            _ => None,
        };
        if let Some(c) = simple {
            self.bump();
            return Ok(c);
        }

        match b {
            b'x' | b'X' => {
                self.bump();
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 2 && self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit()) {
                    value = value * 16 + (self.bump().unwrap() as char).to_digit(16).unwrap();
                    digits += 1;
                }
                Ok(char::from_u32(value).unwrap_or('\u{FFFD}'))
            }
            b'0'..=b'7' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 3 && matches!(self.peek_byte(), Some(b'0'..=b'7')) {
                    value = value * 8 + (self.bump().unwrap() - b'0') as u32;
                    digits += 1;
                }
                Ok(char::from_u32(value).unwrap_or('\u{FFFD}'))
            }
            b'u' => {
                self.bump();
                let value = self.lex_hex_digits(4)?;
                Ok(char::from_u32(value).unwrap_or('\u{FFFD}'))
            }
            b'U' => {
                self.bump();
                let value = self.lex_hex_digits(8)?;
                if value > 0x0010_FFFF {
                    return Err(Diagnostic::error(
                        start_location.clone(),
                        "\\U escape exceeds U+10FFFF",
                    ));
                }
                Ok(char::from_u32(value).unwrap_or('\u{FFFD}'))
            }
            other => {
                self.bump();
                Err(Diagnostic::error(
                    start_location.clone(),
                    format!("unknown escape sequence \\{}", other as char),
                ))
            }
        }
    }

    fn lex_hex_digits(&mut self, count: usize) -> Result<u32, Diagnostic> {
        let mut value = 0u32;
        for _ in 0..count {
            let Some(b) = self.peek_byte().filter(u8::is_ascii_hexdigit) else {
                return Err(Diagnostic::error(self.here(), "incomplete unicode escape"));
            };
            value = value * 16 + (self.bump().unwrap() as char).to_digit(16).unwrap();
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new("test.proto", source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next().unwrap();
            let eof = token.is_eof();
            out.push(token.kind);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_line_and_block_comments() {
        let tokens = lex_all("// a comment\nfoo /* inline */ bar");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("foo".into()),
                TokenKind::Ident("bar".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn resolves_all_documented_escapes() {
        let tokens = lex_all(r#""\a\b\f\n\r\t\v\\\'\"\x41\101A\U00000041""#);
        let expected: String = ['\x07', '\x08', '\x0c', '\n', '\r', '\t', '\x0b', '\\', '\'', '"', 'A', 'A', 'A', 'A']
            .into_iter()
            .collect();
        assert_eq!(tokens[0], TokenKind::Str(expected));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("test.proto", "\"abc");
        assert!(lexer.next().is_err());
    }

    #[test]
    fn lexes_decimal_octal_and_hex_integers() {
        let tokens = lex_all("10 010 0x1F");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Integer(10),
                TokenKind::Integer(8),
                TokenKind::Integer(31),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_floats_with_exponents() {
        let tokens = lex_all("1.5 1e10 .5");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Float(1.5),
                TokenKind::Float(1e10),
                TokenKind::Float(0.5),
                TokenKind::Eof
            ]
        );
    }
}
