use indexmap::IndexMap;
use thiserror::Error;

use crate::value::Bric;

/// Builder capabilities the pull parser drives.
///
/// The parser never constructs values itself. Callers parse directly into
/// [`Bric`] via [`BricBuilder`], or into any host representation, without an
/// intermediate allocation pass.
pub trait Bricolage {
    type Value;
    type Array;
    type Object;

    fn null(&mut self) -> Self::Value;
    fn boolean(&mut self, value: bool) -> Self::Value;
    fn string(&mut self, text: &str) -> Self::Value;
    /// Receives the raw number text so the builder can pick its own numeric
    /// conversion. Returning `None` reports `InvalidNumber` at the token.
    fn number(&mut self, text: &str) -> Option<Self::Value>;
    fn array(&mut self) -> Self::Array;
    fn push(&mut self, array: &mut Self::Array, element: Self::Value);
    fn seal_array(&mut self, array: Self::Array) -> Self::Value;
    fn object(&mut self) -> Self::Object;
    /// Returns `true` when `key` was already present (last writer wins).
    fn put(&mut self, object: &mut Self::Object, key: String, value: Self::Value) -> bool;
    fn seal_object(&mut self, object: Self::Object) -> Self::Value;
}

/// The native builder producing a [`Bric`] tree.
pub struct BricBuilder;

impl Bricolage for BricBuilder {
    type Value = Bric;
    type Array = Vec<Bric>;
    type Object = IndexMap<String, Bric>;

    fn null(&mut self) -> Bric {
        Bric::Null
    }

    fn boolean(&mut self, value: bool) -> Bric {
        Bric::Bool(value)
    }

    fn string(&mut self, text: &str) -> Bric {
        Bric::Str(text.to_string())
    }

    fn number(&mut self, text: &str) -> Option<Bric> {
        // parsed from the full token text so small exponents like 1.23e-12
        // survive intact
        text.parse::<f64>().ok().map(Bric::Num)
    }

    fn array(&mut self) -> Vec<Bric> {
        Vec::new()
    }

    fn push(&mut self, array: &mut Vec<Bric>, element: Bric) {
        array.push(element);
    }

    fn seal_array(&mut self, array: Vec<Bric>) -> Bric {
        Bric::Arr(array)
    }

    fn object(&mut self) -> IndexMap<String, Bric> {
        IndexMap::new()
    }

    fn put(&mut self, object: &mut IndexMap<String, Bric>, key: String, value: Bric) -> bool {
        object.insert(key, value).is_some()
    }

    fn seal_object(&mut self, object: IndexMap<String, Bric>) -> Bric {
        Bric::Obj(object)
    }
}

/// Lexical options. `strict()` is plain RFC 8259; `compat()` turns on the
/// common extensions and tolerates duplicate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub allow_comments: bool,
    pub allow_trailing_commas: bool,
    pub allow_unquoted_keys: bool,
    pub allow_nan_infinity: bool,
    pub reject_duplicate_keys: bool,
    pub max_depth: usize,
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions {
            allow_comments: false,
            allow_trailing_commas: false,
            allow_unquoted_keys: false,
            allow_nan_infinity: false,
            reject_duplicate_keys: true,
            max_depth: 1024,
        }
    }

    pub fn compat() -> Self {
        ParseOptions {
            allow_comments: true,
            allow_trailing_commas: true,
            allow_unquoted_keys: true,
            allow_nan_infinity: true,
            reject_duplicate_keys: false,
            max_depth: 1024,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions::strict()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `None` means end of input.
    UnexpectedChar(Option<char>),
    UnterminatedString,
    InvalidEscape,
    InvalidNumber,
    InvalidLiteral,
    TrailingGarbage,
    DepthExceeded,
    DuplicateKey(String),
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::UnexpectedChar(Some(ch)) => write!(f, "unexpected character {:?}", ch),
            ParseErrorKind::UnexpectedChar(None) => write!(f, "unexpected end of input"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            ParseErrorKind::InvalidNumber => write!(f, "invalid number"),
            ParseErrorKind::InvalidLiteral => write!(f, "invalid literal"),
            ParseErrorKind::TrailingGarbage => write!(f, "trailing characters after value"),
            ParseErrorKind::DepthExceeded => write!(f, "maximum nesting depth exceeded"),
            ParseErrorKind::DuplicateKey(key) => write!(f, "duplicate key {:?}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Parse `text` into whatever `builder` constructs.
pub fn parse_with<B: Bricolage>(
    text: &str,
    options: &ParseOptions,
    builder: &mut B,
) -> Result<B::Value, ParseError> {
    let mut parser = Parser {
        text,
        offset: 0,
        line: 1,
        column: 1,
        options,
    };
    parser.skip_trivia()?;
    let value = parser.parse_value(builder, 0)?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.fail(ParseErrorKind::TrailingGarbage));
    }
    Ok(value)
}

struct Parser<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    options: &'a ParseOptions,
}

struct Mark {
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn fail(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn fail_at(&self, mark: &Mark, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: mark.offset,
            line: mark.line,
            column: mark.column,
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.options.allow_comments => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.mark();
        self.bump();
        match self.peek() {
            Some('/') => {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some('*') => {
                self.bump();
                let mut previous = '\0';
                while let Some(ch) = self.bump() {
                    if previous == '*' && ch == '/' {
                        return Ok(());
                    }
                    previous = ch;
                }
                Err(self.fail_at(&start, ParseErrorKind::UnexpectedChar(None)))
            }
            other => Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
        }
    }

    fn parse_value<B: Bricolage>(
        &mut self,
        builder: &mut B,
        depth: usize,
    ) -> Result<B::Value, ParseError> {
        if depth > self.options.max_depth {
            return Err(self.fail(ParseErrorKind::DepthExceeded));
        }
        match self.peek() {
            Some('{') => self.parse_object(builder, depth),
            Some('[') => self.parse_array(builder, depth),
            Some('"') => {
                let text = self.parse_string_literal()?;
                Ok(builder.string(&text))
            }
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_number(builder),
            Some(ch) if ch.is_ascii_alphabetic() => self.parse_literal(builder),
            other => Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
        }
    }

    fn parse_object<B: Bricolage>(
        &mut self,
        builder: &mut B,
        depth: usize,
    ) -> Result<B::Value, ParseError> {
        self.bump();
        let mut object = builder.object();
        self.skip_trivia()?;
        if self.peek() == Some('}') {
            self.bump();
            return Ok(builder.seal_object(object));
        }
        loop {
            self.skip_trivia()?;
            let key_mark = self.mark();
            let key = self.parse_key()?;
            self.skip_trivia()?;
            match self.peek() {
                Some(':') => {
                    self.bump();
                }
                other => return Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
            }
            self.skip_trivia()?;
            let value = self.parse_value(builder, depth + 1)?;
            let replaced = builder.put(&mut object, key.clone(), value);
            if replaced && self.options.reject_duplicate_keys {
                return Err(self.fail_at(&key_mark, ParseErrorKind::DuplicateKey(key)));
            }
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_trivia()?;
                    if self.peek() == Some('}') && self.options.allow_trailing_commas {
                        self.bump();
                        return Ok(builder.seal_object(object));
                    }
                }
                Some('}') => {
                    self.bump();
                    return Ok(builder.seal_object(object));
                }
                other => return Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
            }
        }
    }

    fn parse_array<B: Bricolage>(
        &mut self,
        builder: &mut B,
        depth: usize,
    ) -> Result<B::Value, ParseError> {
        self.bump();
        let mut array = builder.array();
        self.skip_trivia()?;
        if self.peek() == Some(']') {
            self.bump();
            return Ok(builder.seal_array(array));
        }
        loop {
            self.skip_trivia()?;
            let element = self.parse_value(builder, depth + 1)?;
            builder.push(&mut array, element);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_trivia()?;
                    if self.peek() == Some(']') && self.options.allow_trailing_commas {
                        self.bump();
                        return Ok(builder.seal_array(array));
                    }
                }
                Some(']') => {
                    self.bump();
                    return Ok(builder.seal_array(array));
                }
                other => return Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some('"') => self.parse_string_literal(),
            Some(ch) if self.options.allow_unquoted_keys && is_ident_start(ch) => {
                let start = self.offset;
                while let Some(ch) = self.peek() {
                    if is_ident_continue(ch) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(self.text[start..self.offset].to_string())
            }
            other => Err(self.fail(ParseErrorKind::UnexpectedChar(other))),
        }
    }

    fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        let start = self.mark();
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.fail_at(&start, ParseErrorKind::UnterminatedString)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escape_mark = self.mark();
                    match self.bump() {
                        Some('"') => out.push('"'),
                        Some('\\') => out.push('\\'),
                        Some('/') => out.push('/'),
                        Some('b') => out.push('\u{8}'),
                        Some('f') => out.push('\u{c}'),
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some('u') => {
                            let ch = self.parse_unicode_escape(&escape_mark)?;
                            out.push(ch);
                        }
                        _ => return Err(self.fail_at(&escape_mark, ParseErrorKind::InvalidEscape)),
                    }
                }
                Some(ch) if (ch as u32) < 0x20 => {
                    return Err(self.fail_at(&start, ParseErrorKind::UnterminatedString));
                }
                Some(ch) => out.push(ch),
            }
        }
    }

    fn parse_unicode_escape(&mut self, mark: &Mark) -> Result<char, ParseError> {
        let first = self.parse_hex4(mark)?;
        if (0xD800..=0xDBFF).contains(&first) {
            // high surrogate, a low surrogate escape must follow
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(self.fail_at(mark, ParseErrorKind::InvalidEscape));
            }
            let second = self.parse_hex4(mark)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(self.fail_at(mark, ParseErrorKind::InvalidEscape));
            }
            let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            char::from_u32(combined).ok_or_else(|| self.fail_at(mark, ParseErrorKind::InvalidEscape))
        } else if (0xDC00..=0xDFFF).contains(&first) {
            Err(self.fail_at(mark, ParseErrorKind::InvalidEscape))
        } else {
            char::from_u32(first).ok_or_else(|| self.fail_at(mark, ParseErrorKind::InvalidEscape))
        }
    }

    fn parse_hex4(&mut self, mark: &Mark) -> Result<u32, ParseError> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| self.fail_at(mark, ParseErrorKind::InvalidEscape))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number<B: Bricolage>(&mut self, builder: &mut B) -> Result<B::Value, ParseError> {
        let mark = self.mark();
        let start = self.offset;
        if self.peek() == Some('-') {
            self.bump();
        }
        // -Infinity lands here with the sign already consumed
        if self.options.allow_nan_infinity && self.peek().map_or(false, |c| c.is_ascii_alphabetic())
        {
            let word = self.scan_word();
            if word != "Infinity" {
                return Err(self.fail_at(&mark, ParseErrorKind::InvalidNumber));
            }
        } else {
            match self.peek() {
                Some('0') => {
                    self.bump();
                    if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                        return Err(self.fail_at(&mark, ParseErrorKind::InvalidNumber));
                    }
                }
                Some(ch) if ch.is_ascii_digit() => {
                    self.scan_digits();
                }
                _ => return Err(self.fail_at(&mark, ParseErrorKind::InvalidNumber)),
            }
            if self.peek() == Some('.') {
                self.bump();
                if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    return Err(self.fail_at(&mark, ParseErrorKind::InvalidNumber));
                }
                self.scan_digits();
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    return Err(self.fail_at(&mark, ParseErrorKind::InvalidNumber));
                }
                self.scan_digits();
            }
        }
        let text = &self.text[start..self.offset];
        builder
            .number(text)
            .ok_or_else(|| self.fail_at(&mark, ParseErrorKind::InvalidNumber))
    }

    fn scan_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn scan_word(&mut self) -> &'a str {
        let start = self.offset;
        while self.peek().map_or(false, |c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        &self.text[start..self.offset]
    }

    fn parse_literal<B: Bricolage>(&mut self, builder: &mut B) -> Result<B::Value, ParseError> {
        let mark = self.mark();
        let word = self.scan_word();
        match word {
            "true" => Ok(builder.boolean(true)),
            "false" => Ok(builder.boolean(false)),
            "null" => Ok(builder.null()),
            "NaN" | "Infinity" if self.options.allow_nan_infinity => builder
                .number(word)
                .ok_or_else(|| self.fail_at(&mark, ParseErrorKind::InvalidNumber)),
            _ => Err(self.fail_at(&mark, ParseErrorKind::InvalidLiteral)),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
