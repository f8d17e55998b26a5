//! Permissive parser for Python-style literal structures.
//!
//! Models sometimes answer with a dict literal instead of JSON: single
//! quotes, `True`/`False`/`None`, tuples, trailing commas. This accepts that
//! grammar and produces the equivalent `serde_json::Value`.

use serde_json::{Map, Number, Value};
use std::fmt;

/// Deepest container nesting accepted, the same bound serde_json applies
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralError {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for LiteralError {}

/// Parse one complete literal; trailing non-whitespace is an error
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        len: input.len(),
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(i, _)| i)
    }

    fn error(&self, message: &str) -> LiteralError {
        LiteralError {
            message: message.to_string(),
            offset: self.offset(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            Some(open @ ('{' | '[' | '(')) => self.container(open),
            Some('\'') | Some('"') => self.strings().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn container(&mut self, open: char) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = match open {
            '{' => self.dict(),
            '[' => self
                .expect('[')
                .and_then(|()| self.sequence(']', Vec::new()))
                .map(Value::Array),
            _ => self.tuple(),
        };
        self.depth -= 1;
        value
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                Value::Null => "None".to_string(),
                _ => return Err(self.error("unhashable dict key")),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    /// Items up to `close`; the opening bracket and any `items` are consumed
    fn sequence(&mut self, close: char, mut items: Vec<Value>) -> Result<Vec<Value>, LiteralError> {
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }

            items.push(self.value()?);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.error(&format!("expected ',' or '{}'", close))),
            }
        }
    }

    /// `(x)` is just `x`; `()` and `(x,)` are tuples
    fn tuple(&mut self) -> Result<Value, LiteralError> {
        self.expect('(')?;
        self.skip_ws();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(Value::Array(Vec::new()));
        }

        let first = self.value()?;
        self.skip_ws();
        match self.peek() {
            Some(')') => {
                self.pos += 1;
                Ok(first)
            }
            Some(',') => {
                self.pos += 1;
                self.sequence(')', vec![first]).map(Value::Array)
            }
            _ => Err(self.error("expected ',' or ')'")),
        }
    }

    /// One or more adjacent string literals, concatenated
    fn strings(&mut self) -> Result<String, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('\'') | Some('"') => out.push_str(&self.string()?),
                _ => {
                    self.pos = save;
                    return Ok(out);
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a string")),
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\n') => return Err(self.error("newline in string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation
            Some('\n') => {}
            Some('x') => out.push(self.hex_char(2)?),
            Some('u') => out.push(self.hex_char(4)?),
            Some('U') => out.push(self.hex_char(8)?),
            // Unknown escapes are kept verbatim
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => return Err(self.error("unterminated string")),
        }
        Ok(())
    }

    fn hex_char(&mut self, digits: usize) -> Result<char, LiteralError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_') {
                // A sign only starts the number or follows an exponent
                if matches!(c, '-' | '+')
                    && !text.is_empty()
                    && !text.ends_with(['e', 'E'])
                {
                    break;
                }
                if c != '_' {
                    text.push(c);
                }
                self.pos += 1;
            } else {
                break;
            }
        }

        let unsigned = text.trim_start_matches(['-', '+']);
        let is_float = unsigned.contains(['.', 'e', 'E']);

        let number = if is_float {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else if let Ok(i) = text.parse::<i64>() {
            Some(Number::from(i))
        } else {
            text.parse::<u64>().ok().map(Number::from)
        };

        number.map(Value::Number).ok_or_else(|| {
            self.pos = start;
            self.error("invalid number")
        })
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }

        match ident.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error(&format!("'{}' is not a literal", ident)))
            }
        }
    }
}
