//! NEON decoder
//!
//! Covers the syntax PHPStan extension configs are written in: block and
//! inline arrays, comments, quoted and multi-line strings, bare literals such
//! as `%param%`, `@service` or `Foo::bar`, keywords, numbers and entities like
//! `listOf(string())`. Indentation may use tabs or spaces, but sibling lines
//! must share the exact same prefix.
//!
//! Entities decode to [`Value::Tagged`]: the tag holds the entity name, the
//! value holds the arguments as a sequence, or as a mapping once any argument
//! is named.

use crate::error::{DocumentError, DocumentResult};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Number, Value};

/// Characters after `-` or `:` that keep it from starting a literal
const INDICATOR_FOLLOW: &[char] = &['"', '\'', ',', '=', '[', ']', '{', '}', '(', ')'];

/// Decode NEON text into a value tree
pub(crate) fn decode(input: &str) -> DocumentResult<Value> {
    let tokens = Lexer::tokenize(input)?;
    Parser { tokens, pos: 0 }.document()
}

/// Value of a bare literal
pub(crate) fn literal_value(text: &str) -> Value {
    match text {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Value::Bool(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            Value::Bool(false)
        }
        "null" | "Null" | "NULL" => Value::Null,
        _ => number(text).map_or_else(|| Value::String(text.to_string()), Value::Number),
    }
}

/// Entity name stored in a tag built by the decoder
pub(crate) fn entity_name(tag: &Tag) -> String {
    let tag = tag.to_string();
    tag.strip_prefix('!').unwrap_or(&tag).to_string()
}

/// Build an entity value
pub(crate) fn entity(name: &str, arguments: Value) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(format!("!{name}")),
        value: arguments,
    }))
}

fn number(text: &str) -> Option<Number> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(rest) = digits.strip_prefix(prefix) {
            if rest.is_empty() || !rest.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            let value = i64::from_str_radix(rest, radix).ok()?;
            return Some(Number::from(if negative { -value } else { value }));
        }
    }

    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        || !digits.chars().any(|c| c.is_ascii_digit())
        || !digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }

    if digits.contains(['.', 'e', 'E']) {
        return text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::from);
    }
    text.parse::<i64>()
        .map(Number::from)
        .or_else(|_| text.parse::<u64>().map(Number::from))
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(Number::from))
}

/// Keys keep their text, except plain non-negative integers
fn literal_key(text: &str) -> Value {
    let integer = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && !(text.len() > 1 && text.starts_with('0'));
    match text.parse::<u64>() {
        Ok(n) if integer => Value::Number(n.into()),
        _ => Value::String(text.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    /// First token of a content line; carries the line's indentation
    Line(String),
    Char(char),
    Quoted(String),
    Literal(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    line: usize,
    /// Indentation a block starting at this token would have
    column: String,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    indent: String,
    content_start: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn tokenize(input: &str) -> DocumentResult<Vec<Token>> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut lexer = Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            indent: String::new(),
            content_start: 0,
            tokens: Vec::new(),
        };

        lexer.start_line();
        while let Some(c) = lexer.peek(0) {
            match c {
                ' ' | '\t' | '\r' => lexer.pos += 1,
                '\n' => {
                    lexer.pos += 1;
                    lexer.line += 1;
                    lexer.start_line();
                }
                '#' => lexer.skip_comment(),
                ',' | '=' | '[' | ']' | '{' | '}' | '(' | ')' => lexer.char_token(c),
                ':' | '-' if !lexer.indicator_starts_literal() => lexer.char_token(c),
                '\'' | '"' => lexer.quoted(c)?,
                '`' => return Err(lexer.error("unexpected '`'")),
                _ => lexer.literal(),
            }
        }
        Ok(lexer.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, start: usize, kind: Kind) {
        let mut column = self.indent.clone();
        column.extend(std::iter::repeat(' ').take(start.saturating_sub(self.content_start)));
        self.tokens.push(Token {
            kind,
            line: self.line,
            column,
        });
    }

    fn char_token(&mut self, c: char) {
        self.push(self.pos, Kind::Char(c));
        self.pos += 1;
    }

    fn error(&self, message: &str) -> DocumentError {
        DocumentError::syntax(format!("{message} on line {}", self.line))
    }

    /// Skip blank and comment-only lines, then record the next line's indentation
    fn start_line(&mut self) {
        loop {
            let start = self.pos;
            while matches!(self.peek(0), Some(' ' | '\t')) {
                self.pos += 1;
            }
            match self.peek(0) {
                None => return,
                Some('\n') => {
                    self.pos += 1;
                    self.line += 1;
                }
                Some('\r') if self.peek(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                Some('#') => self.skip_comment(),
                Some(_) => {
                    self.indent = self.chars[start..self.pos].iter().collect();
                    self.content_start = self.pos;
                    self.push(self.pos, Kind::Line(self.indent.clone()));
                    return;
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.peek(0), None | Some('\n')) {
            self.pos += 1;
        }
    }

    /// `-` and `:` start a literal when directly followed by a literal character
    fn indicator_starts_literal(&self) -> bool {
        matches!(self.peek(1), Some(n) if !n.is_whitespace() && !INDICATOR_FOLLOW.contains(&n))
    }

    fn literal(&mut self) {
        let start = self.pos;
        self.pos += 1;

        while let Some(c) = self.peek(0) {
            match c {
                '\n' | '\r' | ',' | '=' | ']' | '}' | ')' | '(' => break,
                ':' => match self.peek(1) {
                    Some(n) if !n.is_whitespace() && !matches!(n, ',' | ']' | '}' | ')') => {
                        self.pos += 1;
                    }
                    _ => break,
                },
                ' ' | '\t' => {
                    let mut ahead = self.pos;
                    while matches!(self.chars.get(ahead), Some(' ' | '\t')) {
                        ahead += 1;
                    }
                    match self.chars.get(ahead) {
                        None
                        | Some('#' | ',' | ':' | '=' | ']' | '}' | ')' | '(' | '\n' | '\r') => break,
                        Some(_) => self.pos = ahead + 1,
                    }
                }
                _ => self.pos += 1,
            }
        }

        let text = self.chars[start..self.pos].iter().collect();
        self.push(start, Kind::Literal(text));
    }

    fn quoted(&mut self, quote: char) -> DocumentResult<()> {
        if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
            return self.multiline(quote);
        }

        let start = self.pos;
        self.pos += 1;
        let mut raw = String::new();
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some(c) if c == quote => {
                    if quote == '\'' && self.peek(1) == Some('\'') {
                        raw.push('\'');
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        break;
                    }
                }
                Some('\\') if quote == '"' => {
                    raw.push('\\');
                    self.pos += 1;
                    if let Some(next) = self.peek(0).filter(|n| *n != '\n') {
                        raw.push(next);
                        self.pos += 1;
                    }
                }
                Some(c) => {
                    raw.push(c);
                    self.pos += 1;
                }
            }
        }

        let value = if quote == '"' {
            unescape(&raw).map_err(|message| self.error(&message))?
        } else {
            raw
        };
        self.push(start, Kind::Quoted(value));
        Ok(())
    }

    /// `'''` or `"""` block; common indentation of the content lines is removed
    fn multiline(&mut self, quote: char) -> DocumentResult<()> {
        let opening_line = self.line;
        self.pos += 3;
        while matches!(self.peek(0), Some(' ' | '\t' | '\r')) {
            self.pos += 1;
        }
        if self.peek(0) != Some('\n') {
            return Err(self.error("multi-line string must start on a new line"));
        }

        let mut lines = Vec::new();
        loop {
            if self.peek(0) != Some('\n') {
                return Err(DocumentError::syntax(format!(
                    "unterminated multi-line string on line {opening_line}"
                )));
            }
            self.pos += 1;
            self.line += 1;

            let line_start = self.pos;
            while matches!(self.peek(0), Some(' ' | '\t')) {
                self.pos += 1;
            }
            if (0..3).all(|i| self.peek(i) == Some(quote)) {
                self.pos += 3;
                break;
            }
            while !matches!(self.peek(0), None | Some('\n')) {
                self.pos += 1;
            }
            let text: String = self.chars[line_start..self.pos].iter().collect();
            lines.push(text.trim_end_matches('\r').to_string());
        }

        let indent = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| &l[..l.len() - l.trim_start().len()])
            .min_by_key(|prefix| prefix.len())
            .unwrap_or("")
            .to_string();
        let raw = lines
            .iter()
            .map(|l| l.strip_prefix(indent.as_str()).unwrap_or_else(|| l.trim_start()))
            .collect::<Vec<_>>()
            .join("\n");

        let value = if quote == '"' {
            unescape(&raw).map_err(|message| self.error(&message))?
        } else {
            raw
        };
        self.tokens.push(Token {
            kind: Kind::Quoted(value),
            line: opening_line,
            column: self.indent.clone(),
        });
        Ok(())
    }
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('b') => out.push('\u{8}'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('_') => out.push('\u{a0}'),
            Some('u') => {
                let high = hex_code(&mut chars, 4)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err("unpaired surrogate in escape sequence".to_string());
                    }
                    let low = hex_code(&mut chars, 4)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err("unpaired surrogate in escape sequence".to_string());
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                out.push(
                    char::from_u32(code)
                        .ok_or_else(|| format!("invalid code point U+{code:04X}"))?,
                );
            }
            Some('x') => {
                let code = hex_code(&mut chars, 2)?;
                out.push(char::from_u32(code).ok_or_else(|| format!("invalid byte \\x{code:02x}"))?);
            }
            Some(other) => return Err(format!("invalid escape sequence \\{other}")),
            None => return Err("unterminated escape sequence".to_string()),
        }
    }
    Ok(out)
}

fn hex_code(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid escape sequence {hex:?}"));
    }
    u32::from_str_radix(&hex, 16).map_err(|e| e.to_string())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn document(mut self) -> DocumentResult<Value> {
        let Some(Kind::Line(indent)) = self.kind(0).cloned() else {
            return Ok(Value::Null);
        };
        self.pos += 1;

        let value = self.block(&indent)?;
        match self.tokens.get(self.pos) {
            None => Ok(value),
            Some(token) => Err(unexpected(token)),
        }
    }

    fn kind(&self, offset: usize) -> Option<&Kind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn next_token(&mut self) -> DocumentResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| DocumentError::syntax("unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected_here(&self) -> DocumentError {
        self.tokens
            .get(self.pos)
            .map_or_else(|| DocumentError::syntax("unexpected end of input"), unexpected)
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.kind(0) == Some(&Kind::Char(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_lines(&mut self) {
        while matches!(self.kind(0), Some(Kind::Line(_))) {
            self.pos += 1;
        }
    }

    fn block(&mut self, indent: &str) -> DocumentResult<Value> {
        match (self.kind(0), self.kind(1)) {
            (Some(Kind::Char('-')), _) => self.block_sequence(indent),
            (Some(Kind::Literal(_) | Kind::Quoted(_)), Some(Kind::Char(':' | '='))) => {
                self.block_mapping(indent)
            }
            _ => {
                let value = self.inline_value()?;
                match self.tokens.get(self.pos) {
                    None | Some(Token { kind: Kind::Line(_), .. }) => Ok(value),
                    Some(token) => Err(unexpected(token)),
                }
            }
        }
    }

    fn block_sequence(&mut self, indent: &str) -> DocumentResult<Value> {
        let mut items = Vec::new();
        loop {
            if !self.eat_char('-') {
                return Err(self.unexpected_here());
            }
            items.push(self.block_entry(indent)?);
            if !self.next_sibling(indent)? {
                return Ok(Value::Sequence(items));
            }
        }
    }

    fn block_mapping(&mut self, indent: &str) -> DocumentResult<Value> {
        let mut map = Mapping::new();
        loop {
            let (key, line) = self.key()?;
            let value = self.block_entry(indent)?;
            insert_unique(&mut map, key, value, line)?;
            if !self.next_sibling(indent)? {
                return Ok(Value::Mapping(map));
            }
        }
    }

    fn key(&mut self) -> DocumentResult<(Value, usize)> {
        let token = self.next_token()?;
        let key = match &token.kind {
            Kind::Literal(text) => literal_key(text),
            Kind::Quoted(text) => Value::String(text.clone()),
            _ => return Err(unexpected(&token)),
        };
        let separator = self.next_token()?;
        match separator.kind {
            Kind::Char(':' | '=') => Ok((key, token.line)),
            _ => Err(unexpected(&separator)),
        }
    }

    /// Value after `-` or `key:`: the rest of the line, a deeper block, or null
    fn block_entry(&mut self, indent: &str) -> DocumentResult<Value> {
        match self.tokens.get(self.pos) {
            None => Ok(Value::Null),
            Some(Token {
                kind: Kind::Line(next),
                ..
            }) => {
                if next.len() > indent.len() && next.starts_with(indent) {
                    let next = next.clone();
                    self.pos += 1;
                    self.block(&next)
                } else {
                    Ok(Value::Null)
                }
            }
            Some(token) => {
                let column = token.column.clone();
                self.block(&column)
            }
        }
    }

    /// Step onto the next line of the block at `indent`, if there is one
    fn next_sibling(&mut self, indent: &str) -> DocumentResult<bool> {
        match self.tokens.get(self.pos) {
            None => Ok(false),
            Some(Token {
                kind: Kind::Line(next),
                line,
                ..
            }) => {
                if next.as_str() == indent {
                    self.pos += 1;
                    Ok(true)
                } else if indent.starts_with(next.as_str()) {
                    Ok(false)
                } else {
                    Err(DocumentError::syntax(format!(
                        "invalid indentation on line {line}"
                    )))
                }
            }
            Some(token) => Err(unexpected(token)),
        }
    }

    fn inline_value(&mut self) -> DocumentResult<Value> {
        let token = self.next_token()?;
        match &token.kind {
            Kind::Char('[') => self.inline_array(']'),
            Kind::Char('{') => self.inline_array('}'),
            Kind::Quoted(text) => Ok(Value::String(text.clone())),
            Kind::Literal(text) if self.eat_char('(') => {
                let arguments = self.inline_array(')')?;
                Ok(entity(text, arguments))
            }
            Kind::Literal(text) => Ok(literal_value(text)),
            _ => Err(unexpected(&token)),
        }
    }

    /// Entries up to `close`; line breaks inside brackets are insignificant
    fn inline_array(&mut self, close: char) -> DocumentResult<Value> {
        let mut entries: Vec<(Option<Value>, Value, usize)> = Vec::new();

        loop {
            self.skip_lines();
            if self.eat_char(close) {
                break;
            }

            let line = self.tokens.get(self.pos).map_or(0, |t| t.line);
            let key = match (self.kind(0), self.kind(1)) {
                (Some(Kind::Literal(text)), Some(Kind::Char(':' | '='))) => Some(literal_key(text)),
                (Some(Kind::Quoted(text)), Some(Kind::Char(':' | '='))) => {
                    Some(Value::String(text.clone()))
                }
                _ => None,
            };
            if key.is_some() {
                self.pos += 2;
                self.skip_lines();
            }

            let empty = matches!(self.kind(0), Some(Kind::Char(c)) if *c == ',' || *c == close);
            let value = if key.is_some() && empty {
                Value::Null
            } else {
                self.inline_value()?
            };
            entries.push((key, value, line));

            self.skip_lines();
            if self.eat_char(',') {
                continue;
            }
            if self.eat_char(close) {
                break;
            }
            return Err(self.unexpected_here());
        }

        let positional = entries.iter().all(|(key, ..)| key.is_none());
        if positional && !(close == '}' && entries.is_empty()) {
            return Ok(Value::Sequence(
                entries.into_iter().map(|(_, value, _)| value).collect(),
            ));
        }

        let mut map = Mapping::new();
        let mut next_index = 0u64;
        for (key, value, line) in entries {
            let key = match key {
                Some(key) => {
                    if let Some(index) = key.as_u64() {
                        next_index = next_index.max(index + 1);
                    }
                    key
                }
                None => {
                    next_index += 1;
                    Value::Number((next_index - 1).into())
                }
            };
            insert_unique(&mut map, key, value, line)?;
        }
        Ok(Value::Mapping(map))
    }
}

fn insert_unique(map: &mut Mapping, key: Value, value: Value, line: usize) -> DocumentResult<()> {
    if map.contains_key(&key) {
        let shown = match &key {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::from("?"),
        };
        return Err(DocumentError::syntax(format!(
            "duplicated key '{shown}' on line {line}"
        )));
    }
    map.insert(key, value);
    Ok(())
}

fn unexpected(token: &Token) -> DocumentError {
    let found = match &token.kind {
        Kind::Line(_) => "indentation".to_string(),
        Kind::Char(c) => format!("'{c}'"),
        Kind::Quoted(text) | Kind::Literal(text) => format!("'{text}'"),
    };
    DocumentError::syntax(format!("unexpected {found} on line {}", token.line))
}
