//! The writer family: compact, pretty, and stream-pretty serialisers
//!
//! All three writers share the same escaping and number formatting
//! primitives; the two pretty variants additionally share a layout engine
//! which keeps short scalar arrays on a single line and re-indents stored
//! comments as it goes. Output is RFC 8259 JSON as long as the tree carries
//! no comments.
use std::fmt::{self, Write as FmtWrite};
use std::io;

use crate::value::{CommentPlacement, Value, ValueData};

/// Decimal text form of a signed integer
pub fn int_to_string(value: i64) -> String {
    value.to_string()
}

/// Decimal text form of an unsigned integer
pub fn uint_to_string(value: u64) -> String {
    value.to_string()
}

/// Text form of a double, equivalent to printf's `%.17g`: up to 17
/// significant digits, fixed notation for decimal exponents in `[-4, 17)`
/// and scientific notation otherwise. Non-finite values have no JSON form:
/// NaN renders as `null` and the infinities saturate to `±1e+9999`.
pub fn float_to_string(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "null".to_owned()
        } else if value > 0.0 {
            "1e+9999".to_owned()
        } else {
            "-1e+9999".to_owned()
        };
    }
    let formatted = format!("{:.16e}", value);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => return formatted,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_end_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if (-4..17).contains(&exponent) {
        if exponent >= 0 {
            let integral = exponent as usize + 1;
            if digits.len() > integral {
                out.push_str(&digits[..integral]);
                out.push('.');
                out.push_str(&digits[integral..]);
            } else {
                out.push_str(digits);
                for _ in digits.len()..integral {
                    out.push('0');
                }
            }
        } else {
            out.push_str("0.");
            for _ in 0..(-exponent - 1) {
                out.push('0');
            }
            out.push_str(digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        let magnitude = exponent.unsigned_abs();
        if magnitude < 10 {
            out.push('0');
        }
        out.push_str(&magnitude.to_string());
    }
    out
}

fn needs_escape(c: char) -> bool {
    matches!(c, '"' | '\\') || (c as u32) < 0x20
}

/// Quote and escape a string for JSON output. UTF-8 passes through
/// unmodified; control characters without a short escape render as
/// zero-padded uppercase `\u00XX`.
pub fn escape_string(value: &str) -> String {
    if !value.chars().any(needs_escape) {
        return format!("\"{value}\"");
    }
    let mut result = String::with_capacity(value.len() * 2 + 3);
    result.push('"');
    for c in value.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\u{8}' => result.push_str("\\b"),
            '\u{c}' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(result, "\\u{:04X}", c as u32);
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Writes a value as a single line of minimal JSON
#[derive(Debug, Default)]
pub struct CompactWriter {
    yaml_compatibility: bool,
    drop_null_placeholders: bool,
    omit_ending_line_feed: bool,
}

impl CompactWriter {
    pub fn new() -> Self {
        CompactWriter::default()
    }

    /// Use `": "` after member names so the output is also parseable as YAML
    pub fn enable_yaml_compatibility(&mut self) {
        self.yaml_compatibility = true;
    }

    /// Skip null values entirely, leaving empty slots between separators
    pub fn drop_null_placeholders(&mut self) {
        self.drop_null_placeholders = true;
    }

    /// Do not append the final line feed
    pub fn omit_ending_line_feed(&mut self) {
        self.omit_ending_line_feed = true;
    }

    pub fn write(&self, root: &Value) -> String {
        let mut document = String::new();
        self.write_value(&mut document, root);
        if !self.omit_ending_line_feed {
            document.push('\n');
        }
        document
    }

    fn write_value(&self, document: &mut String, value: &Value) {
        match &value.data {
            ValueData::Null => {
                if !self.drop_null_placeholders {
                    document.push_str("null");
                }
            }
            ValueData::Boolean(b) => document.push_str(if *b { "true" } else { "false" }),
            ValueData::Integer(i) => document.push_str(&int_to_string(*i)),
            ValueData::Unsigned(u) => document.push_str(&uint_to_string(*u)),
            ValueData::Float(f) => document.push_str(&float_to_string(*f)),
            ValueData::String(s) => document.push_str(&escape_string(s)),
            ValueData::Array(elements) => {
                document.push('[');
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        document.push(',');
                    }
                    self.write_value(document, element);
                }
                document.push(']');
            }
            ValueData::Object(members) => {
                document.push('{');
                for (index, (name, member)) in members.iter().enumerate() {
                    if index > 0 {
                        document.push(',');
                    }
                    document.push_str(&escape_string(name));
                    document.push_str(if self.yaml_compatibility { ": " } else { ":" });
                    self.write_value(document, member);
                }
                document.push('}');
            }
        }
    }
}

/// Layout engine shared by [PrettyWriter] and [PrettyStreamWriter]
///
/// The indentation string accumulates a leading newline on first use, so a
/// single `write_indent` both terminates the previous line and indents the
/// next one.
struct StyledEngine<'a> {
    out: &'a mut dyn FmtWrite,
    indentation: &'a str,
    right_margin: usize,
    indent_string: String,
    child_values: Vec<String>,
    add_child_values: bool,
}

impl<'a> StyledEngine<'a> {
    fn new(out: &'a mut dyn FmtWrite, indentation: &'a str) -> Self {
        StyledEngine {
            out,
            indentation,
            right_margin: 74,
            indent_string: String::new(),
            child_values: Vec::new(),
            add_child_values: false,
        }
    }

    fn write_document(&mut self, root: &Value) -> fmt::Result {
        self.write_comment_before(root)?;
        self.write_indent()?;
        self.write_value(root)?;
        self.write_comment_after(root)?;
        self.write_indent()
    }

    fn write(&mut self, text: &str) -> fmt::Result {
        self.out.write_str(text)
    }

    fn write_indent(&mut self) -> fmt::Result {
        if self.indent_string.is_empty() {
            // first use establishes the newline prefix without emitting it
            self.indent_string.push('\n');
            return Ok(());
        }
        self.out.write_str(&self.indent_string)
    }

    fn indent(&mut self) {
        self.indent_string.push_str(self.indentation);
    }

    fn unindent(&mut self) {
        let length = self.indent_string.len().saturating_sub(self.indentation.len());
        self.indent_string.truncate(length);
    }

    fn push_value(&mut self, value: String) -> fmt::Result {
        if self.add_child_values {
            self.child_values.push(value);
            Ok(())
        } else {
            self.write(&value)
        }
    }

    fn write_value(&mut self, value: &Value) -> fmt::Result {
        match &value.data {
            ValueData::Null => self.push_value("null".to_owned()),
            ValueData::Boolean(b) => {
                self.push_value(if *b { "true" } else { "false" }.to_owned())
            }
            ValueData::Integer(i) => self.push_value(int_to_string(*i)),
            ValueData::Unsigned(u) => self.push_value(uint_to_string(*u)),
            ValueData::Float(f) => self.push_value(float_to_string(*f)),
            ValueData::String(s) => self.push_value(escape_string(s)),
            ValueData::Array(elements) => self.write_array_value(elements),
            ValueData::Object(members) => {
                if members.is_empty() {
                    return self.push_value("{}".to_owned());
                }
                self.write("{")?;
                self.indent();
                let count = members.len();
                for (index, (name, child)) in members.iter().enumerate() {
                    self.write_comment_before(child)?;
                    self.write_indent()?;
                    self.write(&escape_string(name))?;
                    self.write(" : ")?;
                    self.write_value(child)?;
                    if index + 1 < count {
                        self.write(",")?;
                    }
                    self.write_comment_after(child)?;
                }
                self.unindent();
                self.write_indent()?;
                self.write("}")
            }
        }
    }

    fn write_array_value(&mut self, elements: &[Value]) -> fmt::Result {
        if elements.is_empty() {
            return self.push_value("[]".to_owned());
        }
        let multiline = self.is_multiline_array(elements)?;
        let children = std::mem::take(&mut self.child_values);
        if multiline {
            self.write("[")?;
            self.indent();
            let count = elements.len();
            for (index, child) in elements.iter().enumerate() {
                self.write_comment_before(child)?;
                self.write_indent()?;
                if children.is_empty() {
                    self.write_value(child)?;
                } else {
                    self.write(&children[index])?;
                }
                if index + 1 < count {
                    self.write(",")?;
                }
                self.write_comment_after(child)?;
            }
            self.unindent();
            self.write_indent()?;
            self.write("]")
        } else {
            self.write("[ ")?;
            for (index, text) in children.iter().enumerate() {
                if index > 0 {
                    self.write(", ")?;
                }
                self.write(text)?;
            }
            self.write(" ]")
        }
    }

    /// Decide whether an array needs one line per element. That is the case
    /// when the element count alone approaches the margin, any element is a
    /// non-empty container or carries a comment, or the one-line rendition
    /// (computed by pre-serialising every element) would overrun the margin.
    /// When the length check ran, the pre-serialised elements stay behind in
    /// `child_values` for the caller to reuse.
    fn is_multiline_array(&mut self, elements: &[Value]) -> Result<bool, fmt::Error> {
        let size = elements.len();
        let mut multiline = size * 3 >= self.right_margin;
        self.child_values.clear();
        if !multiline {
            multiline = elements.iter().any(|child| {
                ((child.is_array() || child.is_object()) && !child.is_empty())
                    || child.has_any_comment()
            });
        }
        if !multiline {
            self.child_values.reserve(size);
            self.add_child_values = true;
            let mut line_length = 4 + 2 * (size - 1);
            for child in elements {
                self.write_value(child)?;
            }
            for text in &self.child_values {
                line_length += text.len();
            }
            self.add_child_values = false;
            multiline = line_length >= self.right_margin;
        }
        Ok(multiline)
    }

    fn write_comment_before(&mut self, value: &Value) -> fmt::Result {
        if let Some(comment) = value.comment(CommentPlacement::Before) {
            self.write_comment(comment)?;
        }
        Ok(())
    }

    fn write_comment_after(&mut self, value: &Value) -> fmt::Result {
        if let Some(comment) = value.comment(CommentPlacement::AfterOnSameLine) {
            self.write(" ")?;
            self.write(comment)?;
        }
        if let Some(comment) = value.comment(CommentPlacement::After) {
            self.write_comment(comment)?;
        }
        Ok(())
    }

    /// Re-emit a stored comment, placing each `//` line or `/* */` block on
    /// a fresh indented line
    fn write_comment(&mut self, text: &str) -> fmt::Result {
        let bytes = text.as_bytes();
        let mut search = 0;
        while let Some(start) = find_byte(bytes, b'/', search) {
            let end = if bytes.get(start + 1) == Some(&b'*') {
                match find_subslice(bytes, b"*/", start + 2) {
                    Some(close) => close + 2,
                    None => bytes.len(),
                }
            } else {
                let mut line_end = start + 1;
                while line_end < bytes.len() && bytes[line_end] != b'\r' && bytes[line_end] != b'\n'
                {
                    line_end += 1;
                }
                line_end
            };
            self.write_indent()?;
            self.write(&text[start..end])?;
            search = end.max(start + 1);
        }
        Ok(())
    }
}

fn find_byte(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|found| from + found)
}

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|found| from + found)
}

/// Human-oriented writer: three-space indentation, stored comments
/// re-emitted in place, short scalar arrays kept on one line
#[derive(Debug)]
pub struct PrettyWriter {
    indentation: String,
}

impl PrettyWriter {
    pub fn new() -> Self {
        PrettyWriter {
            indentation: "   ".to_owned(),
        }
    }

    pub fn write(&mut self, root: &Value) -> String {
        let mut document = String::new();
        let mut engine = StyledEngine::new(&mut document, &self.indentation);
        // a String sink cannot fail
        let _ = engine.write_document(root);
        document
    }
}

impl Default for PrettyWriter {
    fn default() -> Self {
        PrettyWriter::new()
    }
}

/// The [PrettyWriter] layout over an arbitrary output sink, with a
/// configurable indentation string. An empty indentation string produces
/// flat output: one value per line with no leading whitespace.
#[derive(Debug)]
pub struct PrettyStreamWriter {
    indentation: String,
}

impl PrettyStreamWriter {
    pub fn new() -> Self {
        PrettyStreamWriter::with_indentation("\t")
    }

    pub fn with_indentation(indentation: impl Into<String>) -> Self {
        PrettyStreamWriter {
            indentation: indentation.into(),
        }
    }

    pub fn write<W: io::Write>(&mut self, sink: &mut W, root: &Value) -> io::Result<()> {
        let mut adapter = IoAdapter {
            inner: sink,
            error: None,
        };
        let result = StyledEngine::new(&mut adapter, &self.indentation).write_document(root);
        if let Some(error) = adapter.error {
            return Err(error);
        }
        result.map_err(|_| io::Error::new(io::ErrorKind::Other, "formatter failure"))
    }
}

impl Default for PrettyStreamWriter {
    fn default() -> Self {
        PrettyStreamWriter::new()
    }
}

/// Carries the first I/O failure out of the fmt-based layout engine
struct IoAdapter<'a, W: io::Write> {
    inner: &'a mut W,
    error: Option<io::Error>,
}

impl<W: io::Write> FmtWrite for IoAdapter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.inner.write_all(s.as_bytes()) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.error = Some(error);
                Err(fmt::Error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::{CommentPlacement, Value};
    use crate::writer::{
        escape_string, float_to_string, int_to_string, uint_to_string, CompactWriter,
        PrettyStreamWriter, PrettyWriter,
    };

    fn sample_object() -> Value {
        let mut root = Value::new_object();
        *root.member_mut("a") = Value::from(1i64);
        let b = root.member_mut("b");
        *b.index_mut(0) = Value::from(true);
        *b.index_mut(1) = Value::default();
        *b.index_mut(2) = Value::from(2.5);
        root
    }

    #[test]
    fn should_format_integers() {
        assert_eq!(int_to_string(0), "0");
        assert_eq!(int_to_string(i64::MIN), "-9223372036854775808");
        assert_eq!(uint_to_string(u64::MAX), "18446744073709551615");
    }

    #[test]
    fn should_format_floats_like_seventeen_digit_g() {
        assert_eq!(float_to_string(0.0), "0");
        assert_eq!(float_to_string(-0.0), "-0");
        assert_eq!(float_to_string(2.5), "2.5");
        assert_eq!(float_to_string(0.1), "0.10000000000000001");
        assert_eq!(float_to_string(1e18), "1e+18");
        assert_eq!(float_to_string(1e100), "1e+100");
        assert_eq!(float_to_string(0.0009765625), "0.0009765625");
        assert_eq!(float_to_string(9.5367431640625e-7), "9.5367431640625e-07");
        assert_eq!(float_to_string(-1234.5), "-1234.5");
    }

    #[test]
    fn should_substitute_for_non_finite_floats() {
        assert_eq!(float_to_string(f64::NAN), "null");
        assert_eq!(float_to_string(f64::INFINITY), "1e+9999");
        assert_eq!(float_to_string(f64::NEG_INFINITY), "-1e+9999");
    }

    #[test]
    fn should_leave_plain_strings_unescaped() {
        assert_eq!(escape_string("plain text"), "\"plain text\"");
        assert_eq!(escape_string("héllo €"), "\"héllo €\"");
    }

    #[test]
    fn should_escape_specials_and_control_characters() {
        assert_eq!(
            escape_string("he said \"hi\"\n"),
            "\"he said \\\"hi\\\"\\n\""
        );
        assert_eq!(escape_string("he said \"hi\"\n").len(), 18);
        assert_eq!(escape_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(escape_string("\u{8}\u{c}\t\r"), "\"\\b\\f\\t\\r\"");
        assert_eq!(escape_string("\u{1}\u{1f}"), "\"\\u0001\\u001F\"");
    }

    #[test]
    fn should_write_compact_documents() {
        let writer = CompactWriter::new();
        assert_eq!(
            writer.write(&sample_object()),
            "{\"a\":1,\"b\":[true,null,2.5]}\n"
        );
    }

    #[test]
    fn should_honour_the_compact_writer_options() {
        let mut writer = CompactWriter::new();
        writer.enable_yaml_compatibility();
        writer.omit_ending_line_feed();
        assert_eq!(
            writer.write(&sample_object()),
            "{\"a\": 1,\"b\": [true,null,2.5]}"
        );

        let mut writer = CompactWriter::new();
        writer.drop_null_placeholders();
        writer.omit_ending_line_feed();
        let mut array = Value::new_array();
        *array.index_mut(0) = Value::from(1i64);
        *array.index_mut(1) = Value::default();
        *array.index_mut(2) = Value::from(2i64);
        assert_eq!(writer.write(&array), "[1,,2]");
    }

    #[test]
    fn should_keep_short_arrays_on_one_line() {
        let mut array = Value::new_array();
        for index in 0..3 {
            *array.index_mut(index) = Value::from(index as i64 + 1);
        }
        assert_eq!(PrettyWriter::new().write(&array), "[ 1, 2, 3 ]\n");
    }

    #[test]
    fn should_break_arrays_with_container_children() {
        let mut array = Value::new_array();
        *array.index_mut(0).index_mut(0) = Value::from(1i64);
        *array.index_mut(1) = Value::from(2i64);
        assert_eq!(
            PrettyWriter::new().write(&array),
            "[\n   [ 1 ],\n   2\n]\n"
        );
    }

    #[test]
    fn should_break_arrays_that_overrun_the_margin() {
        let mut array = Value::new_array();
        for index in 0..8 {
            *array.index_mut(index) = Value::from("a long enough element");
        }
        let document = PrettyWriter::new().write(&array);
        assert!(document.starts_with("[\n"));
        assert!(document.contains("\n   \"a long enough element\","));
    }

    #[test]
    fn should_write_pretty_objects() {
        assert_eq!(
            PrettyWriter::new().write(&sample_object()),
            "{\n   \"a\" : 1,\n   \"b\" : [ true, null, 2.5 ]\n}\n"
        );
    }

    #[test]
    fn should_reindent_stored_comments() {
        let mut root = Value::new_object();
        let count = root.member_mut("count");
        *count = Value::from(1i64);
        count.set_comment("// how many", CommentPlacement::Before);
        count.set_comment("// so far", CommentPlacement::AfterOnSameLine);
        assert_eq!(
            PrettyWriter::new().write(&root),
            "{\n   // how many\n   \"count\" : 1 // so far\n}\n"
        );
    }

    #[test]
    fn should_stream_flat_output_with_empty_indentation() {
        let mut sink = Vec::new();
        PrettyStreamWriter::with_indentation("")
            .write(&mut sink, &sample_object())
            .unwrap();
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "{\n\"a\" : 1,\n\"b\" : [ true, null, 2.5 ]\n}\n"
        );
    }

    #[test]
    fn should_stream_with_tab_indentation_by_default() {
        let mut sink = Vec::new();
        PrettyStreamWriter::new()
            .write(&mut sink, &sample_object())
            .unwrap();
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "{\n\t\"a\" : 1,\n\t\"b\" : [ true, null, 2.5 ]\n}\n"
        );
    }
}
