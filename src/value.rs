//! The annotated value tree produced by the reader
//!
//! A [Value] couples a JSON payload with the bookkeeping the reader leaves
//! behind: up to three free-form comments and the `[offset_start,
//! offset_limit)` byte range of the token(s) that produced it. The payload
//! and the bookkeeping are deliberately independent, so replacing a value's
//! payload (as the reader does while descending) never disturbs comments or
//! offsets that were attached moments earlier.
use std::fmt::{self, Display, Formatter};
use std::ops::Index;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::errors::SyntaxError;
use crate::reader::Reader;
use crate::writer::{float_to_string, int_to_string, uint_to_string, PrettyWriter};

/// Ordered collection of object members. Insertion order is preserved;
/// assigning to an existing name overwrites in place.
pub type Members = IndexMap<String, Value>;

/// The payload of a [Value]
#[derive(Debug, Clone)]
pub enum ValueData {
    Null,
    Boolean(bool),
    /// Signed 64-bit domain
    Integer(i64),
    /// Unsigned 64-bit domain, used when a literal only fits above `i64::MAX`
    Unsigned(u64),
    /// Double domain, used when a literal overflows both integer ranges or
    /// carries a fraction or exponent
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Members),
}

/// Where a comment sits relative to the value that owns it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommentPlacement {
    /// On the line(s) preceding the value
    Before = 0,
    /// After the value, on the same line
    AfterOnSameLine = 1,
    /// After the value, on subsequent lines
    After = 2,
}

/// A node in the parsed tree: payload plus comment slots and source offsets
#[derive(Debug, Clone)]
pub struct Value {
    pub data: ValueData,
    comments: [Option<String>; 3],
    offset_start: usize,
    offset_limit: usize,
}

/// Shared null returned by the read-only indexing operators for missing
/// entries
static NULL_VALUE: Value = Value {
    data: ValueData::Null,
    comments: [None, None, None],
    offset_start: 0,
    offset_limit: 0,
};

impl Default for Value {
    fn default() -> Self {
        Value {
            data: ValueData::Null,
            comments: [None, None, None],
            offset_start: 0,
            offset_limit: 0,
        }
    }
}

impl Value {
    /// A fresh, empty array value
    pub fn new_array() -> Self {
        ValueData::Array(Vec::new()).into()
    }

    /// A fresh, empty object value
    pub fn new_object() -> Self {
        ValueData::Object(Members::new()).into()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.data, ValueData::Boolean(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.data,
            ValueData::Integer(_) | ValueData::Unsigned(_) | ValueData::Float(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.data, ValueData::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data, ValueData::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.data, ValueData::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            ValueData::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.data {
            ValueData::Integer(i) => Some(i),
            ValueData::Unsigned(u) => i64::try_from(u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.data {
            ValueData::Integer(i) => u64::try_from(i).ok(),
            ValueData::Unsigned(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            ValueData::Integer(i) => Some(i as f64),
            ValueData::Unsigned(u) => Some(u as f64),
            ValueData::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) => Some(s),
            _ => None,
        }
    }

    /// String rendition of a scalar payload, matching the writers' textual
    /// forms for numbers. Containers render as the empty string; the reader
    /// only uses this for numeric object keys.
    pub fn as_string(&self) -> String {
        match &self.data {
            ValueData::Null => String::new(),
            ValueData::Boolean(b) => (if *b { "true" } else { "false" }).to_owned(),
            ValueData::Integer(i) => int_to_string(*i),
            ValueData::Unsigned(u) => uint_to_string(*u),
            ValueData::Float(f) => float_to_string(*f),
            ValueData::String(s) => s.clone(),
            ValueData::Array(_) | ValueData::Object(_) => String::new(),
        }
    }

    /// Number of elements or members; zero for scalars
    pub fn len(&self) -> usize {
        match &self.data {
            ValueData::Array(elements) => elements.len(),
            ValueData::Object(members) => members.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable access to the element at `index`, materialising the element
    /// (and any gap before it) as nulls. A non-array payload is replaced by
    /// an empty array first.
    pub fn index_mut(&mut self, index: usize) -> &mut Value {
        if !matches!(self.data, ValueData::Array(_)) {
            self.data = ValueData::Array(Vec::new());
        }
        let ValueData::Array(elements) = &mut self.data else {
            unreachable!()
        };
        while elements.len() <= index {
            elements.push(Value::default());
        }
        &mut elements[index]
    }

    /// Mutable access to the member named `name`, materialising it as null
    /// if absent. A non-object payload is replaced by an empty object first.
    pub fn member_mut(&mut self, name: &str) -> &mut Value {
        if !matches!(self.data, ValueData::Object(_)) {
            self.data = ValueData::Object(Members::new());
        }
        let ValueData::Object(members) = &mut self.data else {
            unreachable!()
        };
        members.entry(name.to_owned()).or_insert_with(Value::default)
    }

    /// Store `text` into the given comment slot, replacing any previous
    /// content. Comments keep their `//` or `/* */` delimiters.
    pub fn set_comment(&mut self, text: impl Into<String>, placement: CommentPlacement) {
        self.comments[placement as usize] = Some(text.into());
    }

    pub fn comment(&self, placement: CommentPlacement) -> Option<&str> {
        self.comments[placement as usize].as_deref()
    }

    pub fn has_comment(&self, placement: CommentPlacement) -> bool {
        self.comments[placement as usize].is_some()
    }

    pub fn has_any_comment(&self) -> bool {
        self.comments.iter().any(Option::is_some)
    }

    /// Byte offset of the first byte of the token(s) that produced this value
    pub fn offset_start(&self) -> usize {
        self.offset_start
    }

    /// Byte offset one past the last byte of the token(s) that produced this
    /// value
    pub fn offset_limit(&self) -> usize {
        self.offset_limit
    }

    pub fn set_offset_start(&mut self, offset: usize) {
        self.offset_start = offset;
    }

    pub fn set_offset_limit(&mut self, offset: usize) {
        self.offset_limit = offset;
    }
}

/// Equality considers payload only: two trees parsed from differently
/// commented or differently spaced documents still compare equal. `Integer`
/// and `Unsigned` compare by value across the two domains.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl PartialEq for ValueData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueData::Null, ValueData::Null) => true,
            (ValueData::Boolean(a), ValueData::Boolean(b)) => a == b,
            (ValueData::Integer(a), ValueData::Integer(b)) => a == b,
            (ValueData::Unsigned(a), ValueData::Unsigned(b)) => a == b,
            (ValueData::Integer(a), ValueData::Unsigned(b))
            | (ValueData::Unsigned(b), ValueData::Integer(a)) => {
                *a >= 0 && *a as u64 == *b
            }
            (ValueData::Float(a), ValueData::Float(b)) => a == b,
            (ValueData::String(a), ValueData::String(b)) => a == b,
            (ValueData::Array(a), ValueData::Array(b)) => a == b,
            (ValueData::Object(a), ValueData::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(name, value)| {
                        b.get(name).map_or(false, |other| value == other)
                    })
            }
            _ => false,
        }
    }
}

impl From<ValueData> for Value {
    fn from(data: ValueData) -> Self {
        Value {
            data,
            ..Value::default()
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        ValueData::Boolean(b).into()
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        ValueData::Integer(i).into()
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        ValueData::Unsigned(u).into()
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        ValueData::Float(f).into()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        ValueData::String(s.to_owned()).into()
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        ValueData::String(s).into()
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        ValueData::Array(elements).into()
    }
}

impl From<Members> for Value {
    fn from(members: Members) -> Self {
        ValueData::Object(members).into()
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Read-only element access; out-of-range or non-array yields a shared
    /// null
    fn index(&self, index: usize) -> &Value {
        match &self.data {
            ValueData::Array(elements) => elements.get(index).unwrap_or(&NULL_VALUE),
            _ => &NULL_VALUE,
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Read-only member access; a missing name or non-object yields a shared
    /// null
    fn index(&self, name: &str) -> &Value {
        match &self.data {
            ValueData::Object(members) => members.get(name).unwrap_or(&NULL_VALUE),
            _ => &NULL_VALUE,
        }
    }
}

impl FromStr for Value {
    type Err = SyntaxError;

    /// Lenient parse of a complete document
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = Reader::new();
        let mut root = Value::default();
        if reader.parse_str(s, &mut root, true) {
            Ok(root)
        } else {
            Err(SyntaxError(reader.formatted_error_messages()))
        }
    }
}

impl Display for Value {
    /// Pretty-printed rendition, comments included
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&PrettyWriter::new().write(self))
    }
}

#[cfg(test)]
mod tests {
    use crate::value::{CommentPlacement, Value, ValueData};

    #[test]
    fn should_materialise_array_elements_on_mutable_access() {
        let mut v = Value::default();
        *v.index_mut(2) = Value::from(true);
        assert!(v.is_array());
        assert_eq!(v.len(), 3);
        assert!(v[0].is_null());
        assert!(v[1].is_null());
        assert_eq!(v[2].as_bool(), Some(true));
    }

    #[test]
    fn should_materialise_members_on_mutable_access() {
        let mut v = Value::default();
        *v.member_mut("a") = Value::from(1i64);
        *v.member_mut("b") = Value::from(2i64);
        *v.member_mut("a") = Value::from(3i64);
        assert!(v.is_object());
        assert_eq!(v.len(), 2);
        assert_eq!(v["a"].as_i64(), Some(3));
        assert_eq!(v["b"].as_i64(), Some(2));
    }

    #[test]
    fn should_preserve_member_insertion_order() {
        let mut v = Value::new_object();
        for name in ["zebra", "aardvark", "mongoose"] {
            *v.member_mut(name) = Value::from(name);
        }
        let ValueData::Object(members) = &v.data else {
            panic!("expected an object")
        };
        let names: Vec<&str> = members.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zebra", "aardvark", "mongoose"]);
    }

    #[test]
    fn should_yield_a_shared_null_for_missing_entries() {
        let v = Value::new_object();
        assert!(v["nowhere"].is_null());
        assert!(v[42].is_null());
    }

    #[test]
    fn should_compare_integer_domains_by_value() {
        assert_eq!(Value::from(7i64), Value::from(7u64));
        assert_ne!(Value::from(-1i64), Value::from(u64::MAX));
        assert_ne!(Value::from(7i64), Value::from(7.0));
    }

    #[test]
    fn should_ignore_comments_and_offsets_in_equality() {
        let mut a = Value::from(1i64);
        let b = Value::from(1i64);
        a.set_comment("// noted", CommentPlacement::Before);
        a.set_offset_start(10);
        a.set_offset_limit(11);
        assert_eq!(a, b);
    }

    #[test]
    fn should_render_scalars_as_strings() {
        assert_eq!(Value::from(-12i64).as_string(), "-12");
        assert_eq!(Value::from(12u64).as_string(), "12");
        assert_eq!(Value::from(true).as_string(), "true");
        assert_eq!(Value::from("x").as_string(), "x");
        assert_eq!(Value::default().as_string(), "");
    }
}
