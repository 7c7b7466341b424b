//! JSON text in the harness wire format.
//!
//! Items are separated by `", "` and keys by `": "`, and every non-ASCII
//! character is written as a `\uXXXX` escape (surrogate pairs above the BMP).
//! Both the envelope line and composite results use this form, so hosts can
//! compare them byte for byte.

use std::io;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::Formatter;

/// Serialize `value` as single-line wire-format JSON text.
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, WireFormatter);
    value
        .serialize(&mut serializer)
        .context("serialize json text")?;
    String::from_utf8(buf).context("json text is not utf-8")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn separators_carry_a_space() {
        let text = to_json_text(&json!({"sum": 7, "tags": [1, "two", true]})).expect("text");
        assert_eq!(text, r#"{"sum": 7, "tags": [1, "two", true]}"#);
    }

    #[test]
    fn empty_containers_stay_tight() {
        assert_eq!(to_json_text(&json!([])).expect("array"), "[]");
        assert_eq!(to_json_text(&json!({})).expect("object"), "{}");
    }

    #[test]
    fn non_ascii_is_escaped() {
        let text = to_json_text(&json!("héllo 参数 🎉")).expect("text");
        assert_eq!(text, r#""h\u00e9llo \u53c2\u6570 \ud83c\udf89""#);
        let back: Value = serde_json::from_str(&text).expect("reparse");
        assert_eq!(back, json!("héllo 参数 🎉"));
    }

    #[test]
    fn control_characters_keep_standard_escapes() {
        let text = to_json_text(&json!("a\nb\t\"c\"")).expect("text");
        assert_eq!(text, r#""a\nb\t\"c\"""#);
    }
}
