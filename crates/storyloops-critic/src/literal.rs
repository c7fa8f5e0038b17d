//! Permissive decoder for Python-literal style structures.
//!
//! Accepts what models commonly emit when asked for JSON but answering in
//! Python syntax: single-quoted strings, `True`/`False`/`None`, tuples and
//! trailing commas. Produces a `serde_json::Value`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Deepest container nesting accepted, matching serde_json's recursion limit
const MAX_DEPTH: usize = 128;

#[derive(Error, Debug, PartialEq)]
pub enum LiteralError {
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Unexpected character {found:?} at byte {pos}")]
    UnexpectedChar { found: char, pos: usize },

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Invalid escape sequence at byte {0}")]
    InvalidEscape(usize),

    #[error("Dictionary keys must be strings (byte {0})")]
    NonStringKey(usize),

    #[error("Trailing characters after literal at byte {0}")]
    TrailingCharacters(usize),

    #[error("Nesting deeper than {MAX_DEPTH} levels at byte {0}")]
    TooDeep(usize),
}

/// Decode a complete literal; anything after it except whitespace is an error.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(LiteralError::TrailingCharacters(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(found) => Err(LiteralError::UnexpectedChar {
                found,
                pos: self.pos - found.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('{') => self.nested(Self::parse_dict),
            Some('[') => self.nested(|p| p.parse_sequence('[', ']')),
            Some('(') => self.nested(|p| p.parse_sequence('(', ')')),
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(c) if c.is_alphabetic() => self.parse_keyword(),
            Some(found) => Err(LiteralError::UnexpectedChar {
                found,
                pos: self.pos,
            }),
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep(self.pos));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key_pos = self.pos;
            let key = match self.parse_value()? {
                Value::String(key) => key,
                _ => return Err(LiteralError::NonStringKey(key_pos)),
            };
            self.skip_whitespace();
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        pos: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        pos: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let escape_pos = self.pos - 1;
            match self.bump().ok_or(LiteralError::UnexpectedEnd)? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                '\n' => {}
                'u' => {
                    let end = self.pos + 4;
                    let hex = self
                        .input
                        .get(self.pos..end)
                        .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
                        .ok_or(LiteralError::InvalidEscape(escape_pos))?;
                    let decoded = u32::from_str_radix(hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or(LiteralError::InvalidEscape(escape_pos))?;
                    out.push(decoded);
                    self.pos = end;
                }
                _ => return Err(LiteralError::InvalidEscape(escape_pos)),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_') {
                self.bump();
            } else {
                break;
            }
        }
        let raw: String = self.input[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(LiteralError::InvalidNumber(raw))
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.input[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            word => Err(LiteralError::UnexpectedChar {
                found: word.chars().next().unwrap_or(' '),
                pos: start,
            }),
        }
    }
}
