//! ASCII FBX recognizer.
//!
//! A hand-written recognizer for the text form of the format, producing
//! the same [`Element`] tree as the binary tokenizer. Identifiers
//! followed by `:` introduce an element; properties are comma-separated
//! literals (quoted string, number, `*N { a: ... }` array literal, or a
//! bare word such as `T`, `W` or `Y`, kept as a string token); `{ ... }`
//! introduces children; `;` starts a comment running to end of line.
//!
//! Numbers without a fraction or exponent tokenize as `i64`, others as
//! `f64`; array literals are reassembled into one typed array property.

use super::{Element, Property, Token};
use crate::util::{Error, Result};

/// Whether the head of the buffer is plausible FBX text.
pub fn looks_like_text(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    data.iter()
        .take(64)
        .all(|&b| (0x20..0x7f).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r')
}

/// Tokenize a text buffer, returning the root element and the version
/// declared in `FBXHeaderExtension.FBXVersion` (default 7300).
pub fn tokenize(data: &[u8]) -> Result<(Element, u32)> {
    let mut parser = Parser {
        data,
        pos: 0,
        line: 1,
    };

    let mut root = Element::default();
    loop {
        parser.skip_trivia();
        if parser.at_end() {
            break;
        }
        root.children.push(parser.read_element()?);
    }

    let version = root
        .find("FBXHeaderExtension.FBXVersion")
        .and_then(|el| el.property(0))
        .and_then(|p| p.to_i64().ok())
        .unwrap_or(7300) as u32;

    Ok((root, version))
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    /// Skip whitespace (including newlines) and `;` comments.
    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.bump();
                }
                b';' => {
                    while let Some(c) = self.bump() {
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip spaces and tabs only.
    fn skip_inline(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.bump();
        }
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn is_ident_continue(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_'
    }

    fn read_identifier(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        match self.peek() {
            Some(b) if Self::is_ident_start(b) => {
                self.bump();
            }
            _ => return Err(self.error("expected identifier")),
        }
        while matches!(self.peek(), Some(b) if Self::is_ident_continue(b)) {
            self.bump();
        }
        Ok(&self.data[start..self.pos])
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.bump() {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.error(format!("expected '{}', found end of text", expected as char))),
        }
    }

    fn read_element(&mut self) -> Result<Element> {
        let id = Token::ascii(self.read_identifier()?);
        self.skip_inline();
        self.expect(b':')?;

        let mut properties = Vec::new();
        self.read_properties(&mut properties)?;

        let mut children = Vec::new();
        self.skip_trivia();
        if self.peek() == Some(b'{') {
            self.bump();
            loop {
                self.skip_trivia();
                match self.peek() {
                    Some(b'}') => {
                        self.bump();
                        break;
                    }
                    Some(_) => children.push(self.read_element()?),
                    None => return Err(self.error("unterminated '{' block")),
                }
            }
        }

        Ok(Element {
            id,
            properties,
            children,
        })
    }

    fn read_properties(&mut self, out: &mut Vec<Property>) -> Result<()> {
        loop {
            self.skip_inline();
            let Some(b) = self.peek() else { return Ok(()) };
            match b {
                b'"' => out.push(self.read_string()?),
                b'*' => out.push(self.read_array()?),
                b'-' | b'+' | b'.' => out.push(self.read_number()?),
                b if b.is_ascii_digit() => out.push(self.read_number()?),
                b if Self::is_ident_start(b) => {
                    // A bare word is a property unless a ':' follows, in
                    // which case it opens the next element.
                    let saved = (self.pos, self.line);
                    let word = self.read_identifier()?.to_vec();
                    self.skip_inline();
                    if self.peek() == Some(b':') {
                        (self.pos, self.line) = saved;
                        return Ok(());
                    }
                    out.push(Property::String(Token::ascii(&word)));
                }
                _ => return Ok(()),
            }
            self.skip_inline();
            if self.peek() == Some(b',') {
                self.bump();
                self.skip_trivia();
            } else {
                return Ok(());
            }
        }
    }

    fn read_string(&mut self) -> Result<Property> {
        self.expect(b'"')?;
        let start = self.pos;
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(_) => {}
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(Property::String(Token::ascii(
            &self.data[start..self.pos - 1],
        )))
    }

    fn number_text(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.bump();
        }
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E'
                || b == b'-' || b == b'+'
        ) {
            // Sign characters are only valid right after an exponent.
            if matches!(self.peek(), Some(b'-') | Some(b'+'))
                && !matches!(self.data.get(self.pos - 1), Some(b'e') | Some(b'E'))
            {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected number"));
        }
        Ok(&self.data[start..self.pos])
    }

    fn parse_number(&self, text: &[u8]) -> Result<Property> {
        let s = std::str::from_utf8(text).map_err(|_| self.error("non-ASCII number"))?;
        let is_real = s.contains(['.', 'e', 'E']);
        if !is_real {
            if let Ok(v) = s.parse::<i64>() {
                return Ok(Property::I64(v));
            }
        }
        s.parse::<f64>()
            .map(Property::F64)
            .map_err(|_| self.error(format!("malformed number '{s}'")))
    }

    fn read_number(&mut self) -> Result<Property> {
        let text = self.number_text()?;
        self.parse_number(text)
    }

    /// `*N { a: n1,n2,... }` array literal, reassembled into one typed
    /// array property.
    fn read_array(&mut self) -> Result<Property> {
        self.expect(b'*')?;
        let count_text = self.number_text()?;
        let count: usize = std::str::from_utf8(count_text)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("malformed array count"))?;

        self.skip_trivia();
        self.expect(b'{')?;
        self.skip_trivia();
        let label = self.read_identifier()?;
        if label != b"a" {
            return Err(self.error("expected 'a:' inside array literal"));
        }
        self.skip_inline();
        self.expect(b':')?;

        let mut ints = Vec::with_capacity(count);
        let mut reals = Vec::new();
        let mut any_real = false;
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b'}') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let text = self.number_text()?;
                    match self.parse_number(text)? {
                        Property::I64(v) => {
                            if any_real {
                                reals.push(v as f64);
                            } else {
                                ints.push(v);
                            }
                        }
                        Property::F64(v) => {
                            if !any_real {
                                any_real = true;
                                reals = ints.iter().map(|&x| x as f64).collect();
                                ints.clear();
                            }
                            reals.push(v);
                        }
                        _ => unreachable!(),
                    }
                    self.skip_trivia();
                    if self.peek() == Some(b',') {
                        self.bump();
                    }
                }
                None => return Err(self.error("unterminated array literal")),
            }
        }

        let len = if any_real { reals.len() } else { ints.len() };
        if len != count {
            return Err(self.error(format!(
                "array literal declares {count} values but carries {len}"
            )));
        }
        Ok(if any_real {
            Property::F64Array(reals)
        } else {
            Property::I64Array(ints)
        })
    }
}
