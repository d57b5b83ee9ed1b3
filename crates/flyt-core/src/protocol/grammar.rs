//! Field-level scanner for the text wire grammar.
//!
//! Every line of the protocol is a sequence of whitespace-separated tokens:
//!
//! ```text
//! <word> [<key>:<value> ...]
//! ```
//!
//! where a value is one of
//!
//! | kind    | example            |
//! |---------|--------------------|
//! | float   | `12.5`, `-3e-2`    |
//! | integer | `640`, `-5`        |
//! | bool    | `true`, `false`    |
//! | vector  | `{1.5, 0, -2}`     |
//! | quoted  | `"no resource"`    |
//!
//! Any run of ASCII whitespace separates tokens, including around the braces
//! and commas of a vector.  A [`Cursor`] walks one line left to right; the
//! command and response parsers compose its methods into their grammars.

use crate::protocol::error::ProtocolError;

/// A left-to-right cursor over one protocol line (terminator already removed).
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `line`.
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    /// Byte offset of the cursor within the line.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn error(&self, expected: &'static str) -> ProtocolError {
        ProtocolError::Parse {
            expected,
            offset: self.pos,
        }
    }

    /// Advances past any ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    /// Returns `true` when only whitespace remains.
    pub fn is_at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.rest().is_empty()
    }

    /// Succeeds only if nothing but whitespace remains on the line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] pointing at the first trailing token.
    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error("end of line"))
        }
    }

    /// Consumes the longest run of characters matching `pred`.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consumes one value token: everything up to whitespace, `,` or `}`.
    fn value_token(&mut self) -> &'a str {
        self.skip_whitespace();
        self.take_while(|c| !(c.is_ascii_whitespace() || c == ',' || c == '}'))
    }

    /// Consumes an identifier made of ASCII letters, digits and `_`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if no identifier starts here.
    pub fn word(&mut self) -> Result<&'a str, ProtocolError> {
        self.skip_whitespace();
        let start = self.pos;
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if word.is_empty() {
            self.pos = start;
            return Err(self.error("identifier"));
        }
        Ok(word)
    }

    /// Consumes `key:` if it is the next token; otherwise leaves the cursor
    /// where it was and returns `false`.
    ///
    /// `yaw` does not match `yaw_rate:` because the colon must follow the key
    /// immediately.
    pub fn try_key(&mut self, key: &str) -> bool {
        self.skip_whitespace();
        let rest = self.rest();
        if rest.starts_with(key) && rest[key.len()..].starts_with(':') {
            self.pos += key.len() + 1;
            true
        } else {
            false
        }
    }

    /// Consumes `key:` or fails.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] naming `key` as the expected token.
    pub fn expect_key(&mut self, key: &'static str) -> Result<(), ProtocolError> {
        if self.try_key(key) {
            Ok(())
        } else {
            Err(self.error(key))
        }
    }

    /// Consumes a single expected character (after optional whitespace).
    fn expect_char(&mut self, ch: char, expected: &'static str) -> Result<(), ProtocolError> {
        self.skip_whitespace();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    /// Parses a 32-bit float.
    ///
    /// Accepts everything `f32::from_str` accepts (`1`, `-0.5`, `2e3`, `inf`).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the token is not a float.
    pub fn float(&mut self) -> Result<f32, ProtocolError> {
        let mut probe = self.clone();
        let token = probe.value_token();
        let value = token.parse::<f32>().map_err(|_| probe.error_at_token(token, "float"))?;
        *self = probe;
        Ok(value)
    }

    /// Parses a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the token is not an `i32`.
    pub fn int(&mut self) -> Result<i32, ProtocolError> {
        let mut probe = self.clone();
        let token = probe.value_token();
        let value = token.parse::<i32>().map_err(|_| probe.error_at_token(token, "integer"))?;
        *self = probe;
        Ok(value)
    }

    /// Parses `true` or `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] for any other token.
    pub fn boolean(&mut self) -> Result<bool, ProtocolError> {
        let mut probe = self.clone();
        let token = probe.value_token();
        let value = match token {
            "true" => true,
            "false" => false,
            _ => return Err(probe.error_at_token(token, "`true` or `false`")),
        };
        *self = probe;
        Ok(value)
    }

    /// Parses a `{x,y,z}` float triple.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if a brace, comma, or component is missing.
    pub fn vector3(&mut self) -> Result<[f32; 3], ProtocolError> {
        self.expect_char('{', "`{`")?;
        let x = self.float()?;
        self.expect_char(',', "`,`")?;
        let y = self.float()?;
        self.expect_char(',', "`,`")?;
        let z = self.float()?;
        self.expect_char('}', "`}`")?;
        Ok([x, y, z])
    }

    /// Parses a double-quoted string and returns its contents.
    ///
    /// There is no escape processing: the string ends at the next `"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the opening or closing quote is missing.
    pub fn quoted(&mut self) -> Result<&'a str, ProtocolError> {
        self.expect_char('"', "opening `\"`")?;
        let rest = self.rest();
        match rest.find('"') {
            Some(end) => {
                self.pos += end + 1;
                Ok(&rest[..end])
            }
            None => {
                self.pos = self.line.len();
                Err(self.error("closing `\"`"))
            }
        }
    }

    /// Consumes the remainder of the line and returns it with surrounding
    /// whitespace trimmed.
    pub fn rest_of_line(&mut self) -> &'a str {
        let rest = self.rest();
        self.pos = self.line.len();
        rest.trim()
    }

    fn error_at_token(&self, token: &str, expected: &'static str) -> ProtocolError {
        ProtocolError::Parse {
            expected,
            offset: self.pos - token.len(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
