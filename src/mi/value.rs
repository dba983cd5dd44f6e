//! Payload decoding for result and async records.
//!
//! A payload is a comma-separated list of `name=value` results where a
//! value is a c-string, a `{...}` tuple, or a `[...]` list:
//!
//! ```text
//! reason="breakpoint-hit",bkptno="1",frame={addr="0x401136",args=[]}
//! ```
//!
//! [`MiDecoder`] maps that onto [`serde_json::Value`]: the top level and
//! tuples become objects, c-strings become strings, lists become arrays.
//! A list of results (`[frame={..},frame={..}]`) becomes an array of
//! single-key objects so element order and names both survive. A name
//! repeated inside one tuple collects its values into an array, whatever
//! the type of its first value.
//!
//! Octal escapes in c-strings denote raw bytes; the unescaped bytes are
//! read back as UTF-8 so multi-byte text survives.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{AppError, Result};

/// Turns payload text into a structured value.
///
/// Implementations must map the empty string to an empty value rather than
/// failing.
pub trait PayloadDecoder: Send + Sync {
    /// Decode `text`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] when `text` is malformed.
    fn decode(&self, text: &str) -> Result<Value>;
}

/// Decoder for the debugger's machine-interface payload grammar.
#[derive(Debug, Default, Clone, Copy)]
pub struct MiDecoder;

impl PayloadDecoder for MiDecoder {
    fn decode(&self, text: &str) -> Result<Value> {
        decode(text)
    }
}

/// Decode a payload with the default grammar.
///
/// # Errors
///
/// Returns [`AppError::Decode`] with the byte offset of the first
/// unexpected character.
pub fn decode(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    let mut fields = Fields::default();
    if !parser.at_end() {
        loop {
            let (name, value) = parser.result()?;
            fields.insert(name, value);
            if !parser.eat(',') {
                break;
            }
        }
    }
    if !parser.at_end() {
        return Err(parser.error("trailing input"));
    }
    Ok(fields.into_value())
}

/// Unescape a quoted c-string such as a stream record payload.
///
/// # Errors
///
/// Returns [`AppError::Decode`] if `text` is not exactly one c-string.
pub fn unescape_c_string(text: &str) -> Result<String> {
    let mut parser = Parser::new(text);
    let s = parser.c_string()?;
    if !parser.at_end() {
        return Err(parser.error("trailing input after string"));
    }
    Ok(s)
}

/// Members of one tuple, with the names already seen more than once.
#[derive(Default)]
struct Fields {
    map: Map<String, Value>,
    repeated: HashSet<String>,
}

impl Fields {
    fn insert(&mut self, name: String, value: Value) {
        match self.map.get_mut(&name) {
            None => {
                self.map.insert(name, value);
            }
            Some(Value::Array(items)) if self.repeated.contains(&name) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
                self.repeated.insert(name);
            }
        }
    }

    fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn require(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}")))
        }
    }

    fn error(&self, what: &str) -> AppError {
        AppError::Decode(format!("{what} at offset {} in {:?}", self.pos, self.src))
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '=' || c == ',' || c == '{' || c == '[' || c == '}' || c == ']' || c == '"' {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a name"));
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn result(&mut self) -> Result<(String, Value)> {
        let name = self.name()?;
        self.require('=')?;
        let value = self.value()?;
        Ok((name, value))
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('"') => self.c_string().map(Value::String),
            Some('{') => self.tuple(),
            Some('[') => self.list(),
            _ => Err(self.error("expected a value")),
        }
    }

    fn tuple(&mut self) -> Result<Value> {
        self.require('{')?;
        let mut fields = Fields::default();
        if self.eat('}') {
            return Ok(fields.into_value());
        }
        loop {
            let (name, value) = self.result()?;
            fields.insert(name, value);
            if self.eat('}') {
                return Ok(fields.into_value());
            }
            self.require(',')?;
        }
    }

    fn list(&mut self) -> Result<Value> {
        self.require('[')?;
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(Value::Array(items));
        }
        loop {
            let item = if matches!(self.peek(), Some('"' | '{' | '[')) {
                self.value()?
            } else {
                let (name, value) = self.result()?;
                let mut single = Map::new();
                single.insert(name, value);
                Value::Object(single)
            };
            items.push(item);
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            self.require(',')?;
        }
    }

    fn c_string(&mut self) -> Result<String> {
        self.require('"')?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(String::from_utf8_lossy(&out).into_owned()),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => push_char(&mut out, c),
            }
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(c) = self.bump() else {
            return Err(self.error("dangling escape"));
        };
        match c {
            'n' => out.push(b'\n'),
            't' => out.push(b'\t'),
            'r' => out.push(b'\r'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'v' => out.push(0x0b),
            'e' => out.push(0x1b),
            '0'..='7' => {
                // Up to three octal digits encode one raw byte.
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                match u8::try_from(code) {
                    Ok(byte) => out.push(byte),
                    Err(_) => push_char(out, char::REPLACEMENT_CHARACTER),
                }
            }
            other => push_char(out, other),
        }
        Ok(())
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
