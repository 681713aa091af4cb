//! Streaming JSON tokenizer.
//!
//! This module provides the [`Decoder`] that node decoders share while building a tree.
//!
//! ## Overview
//!
//! The decoder reads one [`Token`] at a time from a single input buffer:
//!
//! - **Single pass**: every byte is read once, nested values are never re-sliced
//! - **Grammar tracking**: separators (`:` and `,`) are checked and skipped internally, so
//!   callers only see delimiters, keys and scalars
//! - **Error reporting**: every error carries the line and column where it was detected
//!
//! A parent node that reads an opening delimiter hands `&mut Decoder` to the child it
//! creates; the child keeps reading from the same position until its closing delimiter and
//! returns the borrow to the parent.
//!
//! ## Usage
//!
//! ```rust
//! use kvtree::de::{Decoder, Delim, Token};
//!
//! let mut dec = Decoder::new(r#"{"ports": [80, 443]}"#);
//! assert_eq!(dec.token().unwrap(), Token::Delim(Delim::OpenObject));
//! assert_eq!(dec.token().unwrap(), Token::String("ports".to_string()));
//! assert_eq!(dec.token().unwrap(), Token::Delim(Delim::OpenArray));
//! while dec.more() {
//!     assert!(matches!(dec.token().unwrap(), Token::Number(_)));
//! }
//! assert_eq!(dec.token().unwrap(), Token::Delim(Delim::CloseArray));
//! assert_eq!(dec.token().unwrap(), Token::Delim(Delim::CloseObject));
//! dec.finish().unwrap();
//! ```

use crate::{Error, Number, Result};
use std::fmt;

/// A structural delimiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delim {
    OpenObject,
    CloseObject,
    OpenArray,
    CloseArray,
}

impl Delim {
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            Delim::OpenObject => '{',
            Delim::CloseObject => '}',
            Delim::OpenArray => '[',
            Delim::CloseArray => ']',
        }
    }
}

/// One token of a JSON document.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Delim(Delim),
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Delim(d) => write!(f, "'{}'", d.as_char()),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Bool(b) => write!(f, "bool {}", b),
            Token::Null => f.write_str("null"),
        }
    }
}

/// Where the decoder stands in the grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    TopValue,
    TopDone,
    ArrayStart,
    ArrayValue,
    ArrayComma,
    ObjectStart,
    ObjectKey,
    ObjectColon,
    ObjectValue,
    ObjectComma,
}

impl State {
    fn value_allowed(self) -> bool {
        matches!(
            self,
            State::TopValue | State::ArrayStart | State::ArrayValue | State::ObjectValue
        )
    }

    fn expected(self) -> &'static str {
        match self {
            State::TopValue | State::ArrayValue | State::ObjectValue => "a value",
            State::TopDone => "end of input",
            State::ArrayStart => "a value or ']'",
            State::ArrayComma => "',' or ']'",
            State::ObjectStart => "a string key or '}'",
            State::ObjectKey => "a string key",
            State::ObjectColon => "':'",
            State::ObjectComma => "',' or '}'",
        }
    }
}

/// Default limit on how deeply arrays and objects may nest.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The JSON token decoder.
///
/// Created via [`Decoder::new`] and passed by `&mut` from parent nodes to their children.
/// Containers nested deeper than the maximum depth are rejected with a syntax error, which
/// bounds the recursion of the node decoders sharing it.
pub struct Decoder<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    state: State,
    stack: Vec<State>,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Decoder {
            input,
            position: 0,
            line: 1,
            column: 1,
            state: State::TopValue,
            stack: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how many arrays and objects may be open at once.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current line, starting at 1.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Nesting depth of the container being read.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some(ch) = self.input[self.position..].chars().next() {
            self.position += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::syntax(self.line, self.column, msg)
    }

    fn eof(&self) -> Error {
        Error::unexpected_eof(self.line, self.column, self.state.expected())
    }

    fn unexpected(&self, ch: char) -> Error {
        self.error(&format!(
            "unexpected character {:?}, expected {}",
            ch,
            self.state.expected()
        ))
    }

    /// Reports whether the current array or object has another element.
    ///
    /// Returns `false` at a closing delimiter and at the end of input.
    pub fn more(&mut self) -> bool {
        self.skip_whitespace();
        !matches!(self.peek_char(), None | Some(']') | Some('}'))
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Syntax`] on any character the grammar does not allow at the
    /// current position and with [`Error::UnexpectedEof`] if the input ends early.
    pub fn token(&mut self) -> Result<Token> {
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek_char() else {
                return Err(self.eof());
            };

            match ch {
                '[' | '{' => {
                    if !self.state.value_allowed() {
                        return Err(self.unexpected(ch));
                    }
                    if self.stack.len() >= self.max_depth {
                        return Err(self.error("recursion limit exceeded"));
                    }
                    self.next_char();
                    self.stack.push(self.state);
                    if ch == '[' {
                        self.state = State::ArrayStart;
                        return Ok(Token::Delim(Delim::OpenArray));
                    }
                    self.state = State::ObjectStart;
                    return Ok(Token::Delim(Delim::OpenObject));
                }
                ']' => {
                    if !matches!(self.state, State::ArrayStart | State::ArrayComma) {
                        return Err(self.unexpected(ch));
                    }
                    self.close();
                    return Ok(Token::Delim(Delim::CloseArray));
                }
                '}' => {
                    if !matches!(self.state, State::ObjectStart | State::ObjectComma) {
                        return Err(self.unexpected(ch));
                    }
                    self.close();
                    return Ok(Token::Delim(Delim::CloseObject));
                }
                ':' => {
                    if self.state != State::ObjectColon {
                        return Err(self.unexpected(ch));
                    }
                    self.next_char();
                    self.state = State::ObjectValue;
                }
                ',' => {
                    self.state = match self.state {
                        State::ArrayComma => State::ArrayValue,
                        State::ObjectComma => State::ObjectKey,
                        _ => return Err(self.unexpected(ch)),
                    };
                    self.next_char();
                }
                '"' if matches!(self.state, State::ObjectStart | State::ObjectKey) => {
                    let key = self.parse_string()?;
                    self.state = State::ObjectColon;
                    return Ok(Token::String(key));
                }
                _ => {
                    if !self.state.value_allowed() {
                        return Err(self.unexpected(ch));
                    }
                    let token = self.parse_scalar(ch)?;
                    self.value_end();
                    return Ok(token);
                }
            }
        }
    }

    /// Checks that nothing but whitespace follows the top-level value.
    pub fn finish(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.peek_char() {
            None if self.state == State::TopDone => Ok(()),
            None => Err(self.eof()),
            Some(ch) => Err(self.error(&format!(
                "unexpected character {:?} after top-level value",
                ch
            ))),
        }
    }

    fn close(&mut self) {
        self.next_char();
        self.state = self.stack.pop().unwrap_or(State::TopValue);
        self.value_end();
    }

    fn value_end(&mut self) {
        self.state = match self.state {
            State::TopValue => State::TopDone,
            State::ArrayStart | State::ArrayValue => State::ArrayComma,
            State::ObjectValue => State::ObjectComma,
            other => other,
        };
    }

    fn parse_scalar(&mut self, ch: char) -> Result<Token> {
        match ch {
            '"' => Ok(Token::String(self.parse_string()?)),
            't' => self.parse_literal("true").map(|_| Token::Bool(true)),
            'f' => self.parse_literal("false").map(|_| Token::Bool(false)),
            'n' => self.parse_literal("null").map(|_| Token::Null),
            '-' | '0'..='9' => Ok(Token::Number(self.parse_number()?)),
            other => Err(self.unexpected(other)),
        }
    }

    fn parse_literal(&mut self, literal: &str) -> Result<()> {
        if !self.input[self.position..].starts_with(literal) {
            return Err(self.error(&format!("expected {}", literal)));
        }
        for _ in 0..literal.len() {
            self.next_char();
        }
        Ok(())
    }

    fn parse_string(&mut self) -> Result<String> {
        self.next_char(); // consume opening quote
        let mut result = String::new();

        while let Some(ch) = self.next_char() {
            match ch {
                '"' => return Ok(result),
                '\\' => match self.next_char() {
                    Some('"') => result.push('"'),
                    Some('\\') => result.push('\\'),
                    Some('/') => result.push('/'),
                    Some('b') => result.push('\u{0008}'),
                    Some('f') => result.push('\u{000C}'),
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('u') => result.push(self.parse_unicode_escape()?),
                    Some(other) => {
                        return Err(self.error(&format!("invalid escape sequence \\{}", other)))
                    }
                    None => return Err(self.error("unexpected end of input in string")),
                },
                c if (c as u32) < 0x20 => {
                    return Err(self.error("control character in string"));
                }
                other => result.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .next_char()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| {
                    self.error("invalid unicode escape sequence (expected 4 hex digits)")
                })?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        let first = self.parse_hex4()?;
        let code_point = if (0xD800..0xDC00).contains(&first) {
            if !self.input[self.position..].starts_with("\\u") {
                return Err(self.error("unpaired surrogate in unicode escape"));
            }
            self.next_char();
            self.next_char();
            let second = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err(self.error("invalid low surrogate in unicode escape"));
            }
            0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
        } else {
            first
        };

        char::from_u32(code_point).ok_or_else(|| self.error("invalid unicode code point"))
    }

    fn consume_digits(&mut self) -> usize {
        let mut count = 0;
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_digit()) {
            self.next_char();
            count += 1;
        }
        count
    }

    fn parse_number(&mut self) -> Result<Number> {
        let start = self.position;

        if self.peek_char() == Some('-') {
            self.next_char();
        }

        match self.peek_char() {
            Some('0') => {
                self.next_char();
            }
            Some(ch) if ch.is_ascii_digit() => {
                self.consume_digits();
            }
            _ => return Err(self.error("invalid number")),
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') {
            self.next_char();
            if self.consume_digits() == 0 {
                return Err(self.error("expected digit after decimal point"));
            }
            is_float = true;
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.next_char();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.next_char();
            }
            if self.consume_digits() == 0 {
                return Err(self.error("expected digit in exponent"));
            }
            is_float = true;
        }

        let number_str = &self.input[start..self.position];
        if !is_float {
            if let Ok(i) = number_str.parse::<i64>() {
                return Ok(Number::Integer(i));
            }
        }
        number_str
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| self.error("invalid number"))
    }
}
