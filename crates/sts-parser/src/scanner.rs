//! Tokenizer.
//!
//! The scanner is pull-based: `scan()` advances to the next token and
//! returns its kind; the token's span and value are then available through
//! accessors. Trivia (whitespace, line and block comments) is skipped.

use sts_common::Span;
use sts_common::diagnostics::diagnostic_codes;

use crate::syntax_kind::{SyntaxKind, text_to_keyword};

/// A lexical error, reported by the parser as a syntax diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanError {
    pub span: Span,
    pub code: u32,
}

pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    /// Identifier text, or the cooked value of a string/numeric literal.
    token_value: String,
    preceded_by_line_break: bool,
    errors: Vec<ScanError>,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            text,
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_value: String::new(),
            preceded_by_line_break: false,
            errors: Vec::new(),
        }
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    pub fn token_span(&self) -> Span {
        Span::new(self.token_start as u32, self.pos as u32)
    }

    pub fn token_start(&self) -> u32 {
        self.token_start as u32
    }

    pub fn token_end(&self) -> u32 {
        self.pos as u32
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.preceded_by_line_break
    }

    pub fn take_errors(&mut self) -> Vec<ScanError> {
        std::mem::take(&mut self.errors)
    }

    /// Snapshot for speculative parsing.
    pub fn save(&self) -> ScannerState {
        ScannerState {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_value: self.token_value.clone(),
            preceded_by_line_break: self.preceded_by_line_break,
            error_count: self.errors.len(),
        }
    }

    pub fn restore(&mut self, state: ScannerState) {
        self.pos = state.pos;
        self.token = state.token;
        self.token_start = state.token_start;
        self.token_value = state.token_value;
        self.preceded_by_line_break = state.preceded_by_line_break;
        self.errors.truncate(state.error_count);
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        self.preceded_by_line_break = false;
        while let Some(b) = self.peek_byte(0) {
            match b {
                b'\n' | b'\r' => {
                    self.preceded_by_line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek_byte(1) == Some(b'/') => {
                    while let Some(c) = self.peek_byte(0) {
                        if c == b'\n' || c == b'\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b'/' if self.peek_byte(1) == Some(b'*') => {
                    self.pos += 2;
                    loop {
                        match self.peek_byte(0) {
                            None => break,
                            Some(b'*') if self.peek_byte(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(c) => {
                                if c == b'\n' {
                                    self.preceded_by_line_break = true;
                                }
                                self.pos += 1;
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Advance to the next token.
    pub fn scan(&mut self) -> SyntaxKind {
        self.skip_trivia();
        self.token_start = self.pos;
        self.token_value.clear();

        let Some(ch) = self.text[self.pos..].chars().next() else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            ';' => self.single(SyntaxKind::SemicolonToken),
            ',' => self.single(SyntaxKind::CommaToken),
            ':' => self.single(SyntaxKind::ColonToken),
            '?' => self.single(SyntaxKind::QuestionToken),
            '+' => self.single(SyntaxKind::PlusToken),
            '-' => self.single(SyntaxKind::MinusToken),
            '*' => self.single(SyntaxKind::AsteriskToken),
            '/' => self.single(SyntaxKind::SlashToken),
            '%' => self.single(SyntaxKind::PercentToken),
            '.' => {
                if self.peek_byte(1) == Some(b'.') && self.peek_byte(2) == Some(b'.') {
                    self.pos += 3;
                    SyntaxKind::DotDotDotToken
                } else if self.peek_byte(1).is_some_and(|b| b.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.single(SyntaxKind::DotToken)
                }
            }
            '<' => {
                if self.peek_byte(1) == Some(b'=') {
                    self.pos += 2;
                    SyntaxKind::LessThanEqualsToken
                } else {
                    self.single(SyntaxKind::LessThanToken)
                }
            }
            '>' => {
                if self.peek_byte(1) == Some(b'=') {
                    self.pos += 2;
                    SyntaxKind::GreaterThanEqualsToken
                } else {
                    self.single(SyntaxKind::GreaterThanToken)
                }
            }
            '=' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'='), Some(b'=')) => {
                    self.pos += 3;
                    SyntaxKind::EqualsEqualsEqualsToken
                }
                (Some(b'='), _) => {
                    self.pos += 2;
                    SyntaxKind::EqualsEqualsToken
                }
                (Some(b'>'), _) => {
                    self.pos += 2;
                    SyntaxKind::EqualsGreaterThanToken
                }
                _ => self.single(SyntaxKind::EqualsToken),
            },
            '!' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'='), Some(b'=')) => {
                    self.pos += 3;
                    SyntaxKind::ExclamationEqualsEqualsToken
                }
                (Some(b'='), _) => {
                    self.pos += 2;
                    SyntaxKind::ExclamationEqualsToken
                }
                _ => self.single(SyntaxKind::ExclamationToken),
            },
            '&' if self.peek_byte(1) == Some(b'&') => {
                self.pos += 2;
                SyntaxKind::AmpersandAmpersandToken
            }
            '|' if self.peek_byte(1) == Some(b'|') => {
                self.pos += 2;
                SyntaxKind::BarBarToken
            }
            '"' | '\'' => self.scan_string(ch),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_identifier_start(c) => self.scan_identifier(),
            c => {
                self.pos += c.len_utf8();
                self.errors.push(ScanError {
                    span: Span::new(self.token_start as u32, self.pos as u32),
                    code: diagnostic_codes::INVALID_CHARACTER,
                });
                SyntaxKind::Unknown
            }
        };
        self.token
    }

    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        for c in self.text[self.pos..].chars() {
            if is_identifier_part(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.text[start..self.pos];
        self.token_value.push_str(text);
        text_to_keyword(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        if self.peek_byte(0) == Some(b'0') && matches!(self.peek_byte(1), Some(b'x' | b'X')) {
            self.pos += 2;
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
        } else {
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            if self.peek_byte(0) == Some(b'.') {
                self.pos += 1;
                while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
                let save = self.pos;
                self.pos += 1;
                if matches!(self.peek_byte(0), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                if self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                    while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                        self.pos += 1;
                    }
                } else {
                    self.pos = save;
                }
            }
        }
        self.token_value.push_str(&self.text[start..self.pos]);
        SyntaxKind::NumericLiteral
    }

    fn scan_string(&mut self, quote: char) -> SyntaxKind {
        self.pos += 1;
        let mut value = String::new();
        let mut terminated = false;

        while let Some(c) = self.text[self.pos..].chars().next() {
            match c {
                c if c == quote => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                '\n' | '\r' => break,
                '\\' => {
                    self.pos += 1;
                    let Some(escaped) = self.text[self.pos..].chars().next() else {
                        break;
                    };
                    self.pos += escaped.len_utf8();
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        'u' => {
                            let digits = self.text.get(self.pos..self.pos + 4).unwrap_or("");
                            match u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
                                Some(decoded) if digits.len() == 4 => {
                                    value.push(decoded);
                                    self.pos += 4;
                                }
                                _ => value.push('u'),
                            }
                        }
                        other => value.push(other),
                    }
                }
                other => {
                    value.push(other);
                    self.pos += other.len_utf8();
                }
            }
        }

        if !terminated {
            self.errors.push(ScanError {
                span: Span::new(self.token_start as u32, self.pos as u32),
                code: diagnostic_codes::UNTERMINATED_STRING_LITERAL,
            });
        }
        self.token_value = value;
        SyntaxKind::StringLiteral
    }
}

/// Saved scanner position for lookahead.
#[derive(Clone, Debug)]
pub struct ScannerState {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceded_by_line_break: bool,
    error_count: usize,
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}
