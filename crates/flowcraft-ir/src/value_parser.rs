//! ABOUTME: Minimal recursive-descent parser for the sanitized declarative
//! ABOUTME: document format (a CUE/JSON5-lite object literal) into serde_json::Value

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseError {}

pub fn parse_document(text: &str) -> Result<serde_json::Value, ParseError> {
    let mut parser = Parser::new(text);
    parser.skip_ws_and_comments();
    let value = parser.parse_top_level_object()?;
    parser.skip_ws_and_comments();
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(',') => {
                    self.bump();
                }
                Some('/') => {
                    let mut clone = self.chars.clone();
                    clone.next();
                    if let Some((_, '/')) = clone.peek() {
                        // line comment
                        self.bump();
                        self.bump();
                        for c in self.chars.by_ref() {
                            if c.1 == '\n' {
                                break;
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// The sanitized document is a sequence of `key: value` pairs at the top
    /// level (no surrounding braces), so the top level is parsed as an
    /// implicit object.
    fn parse_top_level_object(&mut self) -> Result<serde_json::Value, ParseError> {
        self.parse_object_body('\0')
    }

    fn parse_value(&mut self) -> Result<serde_json::Value, ParseError> {
        self.skip_ws_and_comments();
        match self.peek_char() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map(serde_json::Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(_) => self.parse_bareword_value(),
            None => Err(ParseError("unexpected end of input".to_string())),
        }
    }

    fn parse_object(&mut self) -> Result<serde_json::Value, ParseError> {
        self.expect('{')?;
        let value = self.parse_object_body('}')?;
        self.skip_ws_and_comments();
        self.expect('}')?;
        Ok(value)
    }

    /// Parse `key: value` pairs until `closing` (or EOF when `closing == '\0'`).
    fn parse_object_body(&mut self, closing: char) -> Result<serde_json::Value, ParseError> {
        let mut map = serde_json::Map::new();
        loop {
            self.skip_ws_and_comments();
            match self.peek_char() {
                None => break,
                Some(c) if c == closing => break,
                _ => {}
            }
            let key = self.parse_key()?;
            self.skip_ws_and_comments();
            // optional field marker, not meaningful once we're compiling a concrete document
            if self.peek_char() == Some('?') {
                self.bump();
            }
            self.skip_ws_and_comments();
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws_and_comments();
        }
        Ok(serde_json::Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<serde_json::Value, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws_and_comments();
            if self.peek_char() == Some(']') {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws_and_comments();
        }
        self.expect(']')?;
        Ok(serde_json::Value::Array(items))
    }

    fn parse_key(&mut self) -> Result<String, ParseError> {
        self.skip_ws_and_comments();
        match self.peek_char() {
            Some('"') => self.parse_string(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let mut key = String::new();
                while let Some(c) = self.peek_char() {
                    if c.is_alphanumeric() || c == '_' || c == '-' {
                        key.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(key)
            }
            other => Err(ParseError(format!("expected object key, found {other:?}"))),
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.expect('"')?;
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError("unterminated string".to_string())),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some('/') => s.push('/'),
                    Some('u') => {
                        let mut hex = String::new();
                        for _ in 0..4 {
                            hex.push(self.bump().ok_or_else(|| {
                                ParseError("truncated unicode escape".to_string())
                            })?);
                        }
                        let code = u32::from_str_radix(&hex, 16)
                            .map_err(|_| ParseError("invalid unicode escape".to_string()))?;
                        if let Some(c) = char::from_u32(code) {
                            s.push(c);
                        }
                    }
                    Some(other) => s.push(other),
                    None => return Err(ParseError("truncated escape sequence".to_string())),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(s)
    }

    fn parse_number(&mut self) -> Result<serde_json::Value, ParseError> {
        let start = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-')
        {
            self.bump();
        }
        let end = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
        let slice = &self.src[start..end];
        slice
            .parse::<i64>()
            .map(serde_json::Value::from)
            .or_else(|_| slice.parse::<f64>().map(serde_json::Value::from))
            .map_err(|_| ParseError(format!("invalid number literal '{slice}'")))
    }

    /// Bare words: `true`, `false`, `null`, or an unquoted identifier/expression
    /// treated as a plain string (e.g. `mode: sequential`).
    fn parse_bareword_value(&mut self) -> Result<serde_json::Value, ParseError> {
        let mut word = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == ',' || c == '}' || c == ']' {
                break;
            }
            word.push(c);
            self.bump();
        }
        match word.as_str() {
            "true" => Ok(serde_json::Value::Bool(true)),
            "false" => Ok(serde_json::Value::Bool(false)),
            "null" => Ok(serde_json::Value::Null),
            "" => Err(ParseError("expected a value".to_string())),
            other => Ok(serde_json::Value::String(other.to_string())),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            other => Err(ParseError(format!(
                "expected '{expected}', found {other:?}"
            ))),
        }
    }
}
