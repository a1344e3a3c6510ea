//! Block-mode encoder
//!
//! Writes a document the way NEON's block mode does:
//! - `key: scalar` on one line, nested containers on the following lines
//! - `- scalar` for list items, a bare `-` followed by the nested block for
//!   container items
//! - `[]` / `{}` for empty containers
//! - entities inline, as `name(arg, key: arg)`
//!
//! Strings are left as bare literals when they read back as the same string
//! and double-quoted (JSON escaping) otherwise, so the output always decodes
//! back to the same values.

use crate::decode::{entity_name, literal_value};
use crate::error::{DocumentError, DocumentResult};
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Number, Value};

/// Default indentation unit
pub const DEFAULT_INDENT: &str = "    ";

/// Characters that may not start a bare literal
const LEADING_INDICATORS: &[char] = &[
    '#', '"', '\'', ',', ':', '=', '-', '[', ']', '{', '}', '(', ')', '`',
];

/// Characters kept out of bare literals
const INNER_INDICATORS: &[char] = &['#', '"', '\'', ',', '=', '[', ']', '{', '}', '(', ')', '`'];

/// Words that decode to something other than a string, in any letter case
const RESERVED_WORDS: &[&str] = &["true", "false", "yes", "no", "on", "off", "null"];

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    indent: String,
}

impl EncodeOptions {
    /// Default options (4-space indentation)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent with `width` spaces
    #[inline]
    #[must_use]
    pub fn spaces(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }

    /// With a custom indentation unit
    #[inline]
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Indentation unit
    #[inline]
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Check the indentation unit is one or more spaces, or one or more tabs
    ///
    /// # Errors
    /// [`DocumentError::InvalidIndent`] otherwise.
    pub fn validate(&self) -> DocumentResult<()> {
        let uniform =
            self.indent.chars().all(|c| c == ' ') || self.indent.chars().all(|c| c == '\t');
        if self.indent.is_empty() || !uniform {
            return Err(DocumentError::InvalidIndent(self.indent.clone()));
        }
        Ok(())
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

/// Encode a top-level mapping
pub(crate) fn encode_mapping(root: &Mapping, options: &EncodeOptions) -> DocumentResult<String> {
    options.validate()?;

    if root.is_empty() {
        return Ok("{}\n".to_string());
    }

    let mut encoder = Encoder {
        out: String::new(),
        indent: options.indent(),
        path: Vec::new(),
    };
    encoder.mapping(root, 0)?;
    Ok(encoder.out)
}

struct Encoder<'a> {
    out: String,
    indent: &'a str,
    path: Vec<String>,
}

impl Encoder<'_> {
    fn mapping(&mut self, map: &Mapping, depth: usize) -> DocumentResult<()> {
        for (key, value) in map {
            let key = self.key(key)?;
            self.pad(depth);
            self.out.push_str(&key);
            self.out.push(':');

            self.path.push(key);
            self.entry_value(value, depth)?;
            self.path.pop();
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Value], depth: usize) -> DocumentResult<()> {
        for (index, item) in items.iter().enumerate() {
            self.pad(depth);
            self.out.push('-');

            self.path.push(index.to_string());
            self.entry_value(item, depth)?;
            self.path.pop();
        }
        Ok(())
    }

    /// Value following `key:` or `-`
    fn entry_value(&mut self, value: &Value, depth: usize) -> DocumentResult<()> {
        match value {
            Value::Mapping(map) if !map.is_empty() => {
                self.out.push('\n');
                self.mapping(map, depth + 1)
            }
            Value::Sequence(items) if !items.is_empty() => {
                self.out.push('\n');
                self.sequence(items, depth + 1)
            }
            scalar => {
                let inline = self.inline(scalar)?;
                self.out.push(' ');
                self.out.push_str(&inline);
                self.out.push('\n');
                Ok(())
            }
        }
    }

    fn inline(&self, value: &Value) -> DocumentResult<String> {
        Ok(match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => self.number(n)?,
            Value::String(s) => self.string(s)?,
            Value::Sequence(items) => format!("[{}]", self.inline_items(items)?),
            Value::Mapping(map) => format!("{{{}}}", self.inline_entries(map)?),
            Value::Tagged(tagged) => self.entity(tagged)?,
        })
    }

    fn inline_items(&self, items: &[Value]) -> DocumentResult<String> {
        let items = items
            .iter()
            .map(|item| self.inline(item))
            .collect::<DocumentResult<Vec<_>>>()?;
        Ok(items.join(", "))
    }

    fn inline_entries(&self, map: &Mapping) -> DocumentResult<String> {
        let entries = map
            .iter()
            .map(|(key, value)| Ok(format!("{}: {}", self.key(key)?, self.inline(value)?)))
            .collect::<DocumentResult<Vec<_>>>()?;
        Ok(entries.join(", "))
    }

    fn entity(&self, tagged: &TaggedValue) -> DocumentResult<String> {
        let name = entity_name(&tagged.tag);
        if needs_quotes(&name) {
            return Err(DocumentError::encode(
                self.dotted(),
                format!("{name:?} is not a valid entity name"),
            ));
        }
        let arguments = match &tagged.value {
            Value::Sequence(items) => self.inline_items(items)?,
            Value::Mapping(map) => self.inline_entries(map)?,
            other => self.inline(other)?,
        };
        Ok(format!("{name}({arguments})"))
    }

    fn number(&self, n: &Number) -> DocumentResult<String> {
        if n.is_nan() || n.is_infinite() {
            return Err(DocumentError::encode(
                self.dotted(),
                format!("non-finite number {n}"),
            ));
        }
        Ok(n.to_string())
    }

    fn key(&self, key: &Value) -> DocumentResult<String> {
        match key {
            Value::String(s) => self.string(s),
            Value::Number(n) => self.number(n),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(DocumentError::encode(
                self.dotted(),
                format!("unsupported key type: {}", crate::value_kind(other)),
            )),
        }
    }

    fn string(&self, s: &str) -> DocumentResult<String> {
        if needs_quotes(s) {
            serde_json::to_string(s).map_err(|e| DocumentError::encode(self.dotted(), e.to_string()))
        } else {
            Ok(s.to_string())
        }
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(self.indent);
        }
    }

    fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// Whether a string must be quoted to decode back as the same string
fn needs_quotes(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };

    first.is_whitespace()
        || s.ends_with(char::is_whitespace)
        || s.chars().any(char::is_control)
        || LEADING_INDICATORS.contains(&first)
        || s.contains(INNER_INDICATORS)
        || s.contains(": ")
        || s.contains(" :")
        || s.ends_with(':')
        || RESERVED_WORDS.iter().any(|w| s.eq_ignore_ascii_case(w))
        || looks_like_date(s)
        || !matches!(literal_value(s), Value::String(_))
}

/// `2024-01-01...` reads back as a date
fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 8 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigDocument;
    use pretty_assertions::assert_eq;

    fn encode(text: &str) -> String {
        ConfigDocument::decode(text)
            .unwrap()
            .encode(&EncodeOptions::default())
            .unwrap()
    }

    #[test]
    fn block_layout_with_four_spaces() {
        let text = r"
parameters:
  bootstrapFiles:
    - ../../larastan/larastan/bootstrap.php
  level: 5
services:
  - class: Larastan\Larastan\Methods\RelationForwardsCallsExtension
    tags: [phpstan.broker.methodsClassReflectionExtension]
  - class: Larastan\Larastan\Properties\ModelAccessorExtension
    tags: []
";
        let expected = "\
parameters:
    bootstrapFiles:
        - ../../larastan/larastan/bootstrap.php
    level: 5
services:
    -
        class: Larastan\\Larastan\\Methods\\RelationForwardsCallsExtension
        tags:
            - phpstan.broker.methodsClassReflectionExtension
    -
        class: Larastan\\Larastan\\Properties\\ModelAccessorExtension
        tags: []
";

        assert_eq!(encode(text), expected);
    }

    #[test]
    fn custom_indent_width() {
        let doc = ConfigDocument::decode("a:\n  b:\n    - c\n").unwrap();
        let out = doc.encode(&EncodeOptions::spaces(2)).unwrap();

        assert_eq!(out, "a:\n  b:\n    - c\n");
    }

    #[test]
    fn rejects_empty_or_mixed_indent() {
        let doc = ConfigDocument::decode("a: 1\n").unwrap();

        assert!(matches!(
            doc.encode(&EncodeOptions::spaces(0)),
            Err(DocumentError::InvalidIndent(_))
        ));
        assert!(matches!(
            doc.encode(&EncodeOptions::new().with_indent(" \t")),
            Err(DocumentError::InvalidIndent(_))
        ));
    }

    #[test]
    fn tab_indent_decodes_back() {
        let doc = ConfigDocument::decode("a:\n  b:\n    - c\n").unwrap();
        let out = doc.encode(&EncodeOptions::new().with_indent("\t")).unwrap();

        assert_eq!(out, "a:\n\tb:\n\t\t- c\n");
        assert_eq!(ConfigDocument::decode(&out).unwrap(), doc);
    }

    #[test]
    fn empty_document() {
        let doc = ConfigDocument::default();
        assert_eq!(doc.encode(&EncodeOptions::default()).unwrap(), "{}\n");
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        for s in [
            "", "true", "No", "null", "42", "-7", "0x1F", "1.5", "2024-01-01", " padded",
            "a: b", "x # y", "line\nbreak", "-flag", "[x]", "bool()", "a=b", "key:",
        ] {
            assert!(needs_quotes(s), "{s:?} should be quoted");
        }
    }

    #[test]
    fn plain_strings_stay_plain() {
        for s in [
            "bootstrap.php",
            "../vendor/larastan/larastan/bootstrap.php",
            "./stubs",
            "*.blade.php",
            "%noEnvCallsOutsideOfConfig%",
            "@currentPhpVersionSimpleDirectParser",
            "Foo::create",
            "Larastan\\Larastan\\Methods\\Extension",
            "phpstan.broker.dynamicMethodReturnTypeExtension",
        ] {
            assert!(!needs_quotes(s), "{s:?} should be plain");
        }
    }

    #[test]
    fn entities_are_written_inline() {
        let text = "parametersSchema:\n\tcheckOctaneCompatibility: bool()\n\tdatabaseMigrationsPath: listOf(string())\n\tshape: structure(min: 1, [a, b])\nservices:\n\t- Foo\\Factory(%level%, @parser)\n";
        let expected = "\
parametersSchema:
    checkOctaneCompatibility: bool()
    databaseMigrationsPath: listOf(string())
    shape: structure(min: 1, 0: [a, b])
services:
    - Foo\\Factory(%level%, @parser)
";

        let out = encode(text);

        assert_eq!(out, expected);
        assert_eq!(
            ConfigDocument::decode(&out).unwrap(),
            ConfigDocument::decode(text).unwrap()
        );
    }

    #[test]
    fn strings_that_look_like_entities_stay_strings() {
        let mut root = Mapping::new();
        root.insert(Value::from("a"), Value::from("bool()"));
        let doc = ConfigDocument::new(root);

        let out = doc.encode(&EncodeOptions::default()).unwrap();

        assert_eq!(out, "a: \"bool()\"\n");
        assert_eq!(ConfigDocument::decode(&out).unwrap(), doc);
    }

    #[test]
    fn rejects_non_finite_numbers() {
        for number in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut root = Mapping::new();
            root.insert(Value::from("ratio"), Value::from(number));

            let err = ConfigDocument::new(root)
                .encode(&EncodeOptions::default())
                .unwrap_err();
            assert!(
                matches!(err, DocumentError::Encode { ref path, .. } if path == "ratio"),
                "{err}"
            );
        }
    }

    #[test]
    fn quoted_strings_decode_back() {
        let mut root = Mapping::new();
        let strings = [
            "true", "%param%", "@service", "a: b", "tab\there", "", "0755", "1e3",
        ];
        for (i, s) in strings.iter().enumerate() {
            root.insert(
                Value::String(format!("k{i}")),
                Value::String((*s).to_string()),
            );
        }
        let doc = ConfigDocument::new(root);

        let text = doc.encode(&EncodeOptions::default()).unwrap();

        assert_eq!(ConfigDocument::decode(&text).unwrap(), doc);
    }

    #[test]
    fn nested_sequences_and_scalars_decode_back() {
        let text = r"
matrix:
  - [1, 2]
  - []
  - {}
  - name: x
    enabled: true
    ratio: 0.25
    nothing: null
";
        let doc = ConfigDocument::decode(text).unwrap();
        let encoded = doc.encode(&EncodeOptions::default()).unwrap();

        assert_eq!(ConfigDocument::decode(&encoded).unwrap(), doc);
    }

    #[test]
    fn encoding_is_deterministic() {
        let text = "b: 1\na:\n  - x\n  - y\n";
        assert_eq!(encode(text), encode(text));
        assert_eq!(encode(&encode(text)), encode(text));
    }

    #[test]
    fn preserves_key_order() {
        assert_eq!(encode("zeta: 1\nalpha: 2\n"), "zeta: 1\nalpha: 2\n");
    }

    #[test]
    fn rejects_container_keys() {
        let mut root = Mapping::new();
        root.insert(Value::Sequence(vec![]), Value::Null);

        let err = ConfigDocument::new(root)
            .encode(&EncodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Encode { .. }));
    }
}
