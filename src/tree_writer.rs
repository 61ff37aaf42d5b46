//! Indenting serializer for tree values.
//!
//! Renders a [`TreeValue`] into compact or pretty-printed text. The exact
//! bracketing and escaping rules are the compatibility contract for this
//! output format:
//!
//! - `indent = -1`: compact, no newlines.
//! - `indent >= 0`: pretty-print, nesting by two spaces from the given
//!   starting level, with a newline before each element and before the
//!   closing bracket of a non-empty container. Empty containers render as
//!   `[]` / `{}` with no inner newlines.
//! - Scalars and mapping keys render as JSON literals (keys as quoted,
//!   escaped strings).
//!
//! The writer tracks whether anything has been emitted and suppresses the
//! first automatic newline at indent level 0, so standalone output carries
//! no leading or trailing blank line while output embedded after a
//! declaration line still gets separated from it.

use crate::error::PipelineError;
use crate::text::TextWriter;
use crate::tree::TreeValue;
use std::io;

/// Stateful tree renderer over a [`TextWriter`].
pub struct TreeWriter<'w, 'a> {
    out: &'w mut TextWriter<'a>,
    wrote_any: bool,
}

impl<'w, 'a> TreeWriter<'w, 'a> {
    pub fn new(out: &'w mut TextWriter<'a>) -> Self {
        Self {
            out,
            wrote_any: false,
        }
    }

    /// Write literal text, e.g. a declaration line preceding the value.
    pub fn write_raw(&mut self, text: &str) -> Result<(), PipelineError> {
        self.put_str(text)
    }

    /// Render a value at the given indent level (`-1` for compact output).
    pub fn render(&mut self, value: &TreeValue, indent: i32) -> Result<(), PipelineError> {
        self.newline(indent)?;
        self.render_value(value, indent)
    }

    fn render_value(&mut self, value: &TreeValue, indent: i32) -> Result<(), PipelineError> {
        match value {
            TreeValue::Seq(items) => {
                self.put_char('[')?;
                let inner = if indent >= 0 { indent + 2 } else { indent };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.put_char(',')?;
                    }
                    self.newline(inner)?;
                    self.render_value(item, inner)?;
                }
                if !items.is_empty() {
                    self.newline(indent)?;
                }
                self.put_char(']')
            }
            TreeValue::Map(entries) => {
                self.put_char('{')?;
                let inner = if indent >= 0 { indent + 2 } else { indent };
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.put_char(',')?;
                    }
                    self.newline(inner)?;
                    self.put_str(&json_string(key)?)?;
                    self.put_char(':')?;
                    self.render_value(item, inner)?;
                }
                if !entries.is_empty() {
                    self.newline(indent)?;
                }
                self.put_char('}')
            }
            TreeValue::Null => self.put_str("null"),
            TreeValue::Bool(b) => self.put_str(if *b { "true" } else { "false" }),
            TreeValue::Int(i) => self.put_str(&i.to_string()),
            TreeValue::Float(f) => self.put_str(&float_literal(*f)),
            TreeValue::Str(s) => self.put_str(&json_string(s)?),
        }
    }

    fn newline(&mut self, indent: i32) -> Result<(), PipelineError> {
        if indent < 0 {
            return Ok(());
        }
        // At level 0 with nothing written yet this newline would only add
        // a leading blank line, so it is suppressed.
        if indent == 0 && !self.wrote_any {
            return Ok(());
        }
        self.put_char('\n')?;
        for _ in 0..indent {
            self.put_char(' ')?;
        }
        Ok(())
    }

    fn put_char(&mut self, c: char) -> Result<(), PipelineError> {
        self.wrote_any = true;
        self.out.write_char(c)?;
        Ok(())
    }

    fn put_str(&mut self, s: &str) -> Result<(), PipelineError> {
        if !s.is_empty() {
            self.wrote_any = true;
        }
        self.out.write_str(s)?;
        Ok(())
    }
}

/// Render `value` into `out` at the given indent level.
pub fn write_tree(
    value: &TreeValue,
    out: &mut TextWriter<'_>,
    indent: i32,
) -> Result<(), PipelineError> {
    TreeWriter::new(out).render(value, indent)
}

/// Render an optional declaration line followed by `value`.
///
/// When pretty-printing, the declaration and the value are separated by a
/// newline; compact output stays on one line.
pub fn write_document(
    declaration: Option<&str>,
    value: &TreeValue,
    out: &mut TextWriter<'_>,
    indent: i32,
) -> Result<(), PipelineError> {
    let mut writer = TreeWriter::new(out);
    if let Some(declaration) = declaration {
        writer.write_raw(declaration)?;
    }
    writer.render(value, indent)
}

fn json_string(s: &str) -> Result<String, PipelineError> {
    serde_json::to_string(s).map_err(|e| PipelineError::Io(io::Error::other(e)))
}

fn float_literal(f: f64) -> String {
    match serde_json::Number::from_f64(f) {
        Some(n) => n.to_string(),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Encoding;

    fn render_to_string(value: &TreeValue, indent: i32) -> String {
        let mut buf = Vec::new();
        let mut out = TextWriter::new(&mut buf, Encoding::Utf8);
        write_tree(value, &mut out, indent).unwrap();
        out.flush().unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn tree(json: serde_json::Value) -> TreeValue {
        TreeValue::from(json)
    }

    /// Strip whitespace outside of string literals.
    fn strip_layout(s: &str) -> String {
        let mut result = String::new();
        let mut in_string = false;
        let mut escaped = false;
        for c in s.chars() {
            if in_string {
                result.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
            } else if c == '"' {
                in_string = true;
                result.push(c);
            } else if !c.is_whitespace() {
                result.push(c);
            }
        }
        result
    }

    #[test]
    fn test_compact_map_with_sequence() {
        let value = tree(serde_json::json!({"a": 1, "b": [true, null]}));
        assert_eq!(render_to_string(&value, -1), r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn test_pretty_single_element_sequence() {
        let value = tree(serde_json::json!(["x"]));
        assert_eq!(render_to_string(&value, 0), "[\n  \"x\"\n]");
    }

    #[test]
    fn test_pretty_nested() {
        let value = tree(serde_json::json!({"a": [1, 2], "b": {}}));
        assert_eq!(
            render_to_string(&value, 0),
            "{\n  \"a\":[\n    1,\n    2\n  ],\n  \"b\":{}\n}"
        );
    }

    #[test]
    fn test_empty_containers_have_no_inner_newlines() {
        assert_eq!(render_to_string(&tree(serde_json::json!([])), 0), "[]");
        assert_eq!(render_to_string(&tree(serde_json::json!({})), 0), "{}");
    }

    #[test]
    fn test_no_leading_or_trailing_blank_lines() {
        let value = tree(serde_json::json!({"a": [1]}));
        let pretty = render_to_string(&value, 0);
        assert!(!pretty.starts_with('\n'));
        assert!(!pretty.ends_with('\n'));
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(render_to_string(&TreeValue::Null, -1), "null");
        assert_eq!(render_to_string(&TreeValue::Bool(true), -1), "true");
        assert_eq!(render_to_string(&TreeValue::Int(-7), -1), "-7");
        assert_eq!(render_to_string(&TreeValue::Float(1.0), -1), "1.0");
        assert_eq!(render_to_string(&TreeValue::from("hi"), -1), "\"hi\"");
    }

    #[test]
    fn test_string_escaping() {
        let value = TreeValue::from("a\"b\\c\nd\t");
        assert_eq!(render_to_string(&value, -1), r#""a\"b\\c\nd\t""#);
    }

    #[test]
    fn test_control_characters_escaped() {
        let value = TreeValue::from("\u{1}");
        assert_eq!(render_to_string(&value, -1), "\"\\u0001\"");
    }

    #[test]
    fn test_keys_use_string_escaping() {
        let value = TreeValue::map_from([(TreeValue::from("a\"b"), TreeValue::Int(1))]).unwrap();
        assert_eq!(render_to_string(&value, -1), r#"{"a\"b":1}"#);
    }

    #[test]
    fn test_pretty_equals_compact_modulo_whitespace() {
        let value = tree(serde_json::json!({
            "name": "ada",
            "tags": ["a", "b c", ""],
            "nested": {"x": [1, 2.5, false, null], "y": {}},
            "empty": []
        }));
        assert_eq!(
            strip_layout(&render_to_string(&value, 0)),
            render_to_string(&value, -1)
        );
    }

    #[test]
    fn test_round_trip_through_conformant_reader() {
        let value = tree(serde_json::json!({
            "s": "text with \"quotes\" and \\slashes\\",
            "n": [0, -1, 3.25],
            "b": [true, false],
            "z": null,
            "deep": [{"k": []}]
        }));
        let compact = render_to_string(&value, -1);
        let reparsed: serde_json::Value = serde_json::from_str(&compact).unwrap();
        assert_eq!(TreeValue::from(reparsed), value);
    }

    #[test]
    fn test_document_with_declaration_line() {
        let value = tree(serde_json::json!({"a": 1}));
        let mut buf = Vec::new();
        let mut out = TextWriter::new(&mut buf, Encoding::Utf8);
        write_document(Some("#records v1"), &value, &mut out, 0).unwrap();
        out.flush().unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "#records v1\n{\n  \"a\":1\n}"
        );
    }

    #[test]
    fn test_document_without_declaration_has_no_separator() {
        let value = tree(serde_json::json!([1]));
        let mut buf = Vec::new();
        let mut out = TextWriter::new(&mut buf, Encoding::Utf8);
        write_document(None, &value, &mut out, 0).unwrap();
        out.flush().unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[\n  1\n]");
    }
}
