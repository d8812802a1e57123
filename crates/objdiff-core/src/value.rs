//! Document value model and type classifier.
//!
//! `Value` is a closed sum type: every branch in the differ, the codec and
//! the guide matcher is an exhaustive match on it. A missing field is not a
//! `Value` at all; it is represented as `None` wherever a field may be absent
//! (see [`Field`](crate::diff::model::Field)).

use crate::errors::{DiffError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A mapping of string keys to values.
pub type Map = BTreeMap<String, Value>;

/// A snapshot of document data.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Regex(Pattern),
    /// A key that is present but holds no value; distinct from null and from a missing key
    Undefined,
}

/// Classifier tag assigned to every value and guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Regexp,
    Undefined,
    Function,
}

impl TypeTag {
    /// Canonical lowercase name of the tag.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Regexp => "regexp",
            TypeTag::Undefined => "undefined",
            TypeTag::Function => "function",
        }
    }

    /// Parse a canonical tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => TypeTag::Null,
            "boolean" => TypeTag::Boolean,
            "number" => TypeTag::Number,
            "string" => TypeTag::String,
            "array" => TypeTag::Array,
            "object" => TypeTag::Object,
            "regexp" => TypeTag::Regexp,
            "undefined" => TypeTag::Undefined,
            "function" => TypeTag::Function,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify an optional field; a missing field has no tag.
pub fn classify(field: Option<&Value>) -> Option<TypeTag> {
    field.map(Value::type_tag)
}

impl Value {
    /// The classifier tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
            Value::Regex(_) => TypeTag::Regexp,
            Value::Undefined => TypeTag::Undefined,
        }
    }

    /// Truthiness: empty string, zero, NaN, false, null and undefined are falsy.
    /// Every sequence and mapping is truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Regex(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key on a mapping value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Native ordering used by the LESSER/GREATER guides.
    ///
    /// Defined only between two numbers, two strings or two booleans; any
    /// other pairing, including mixed tags, has no order. Strings order by
    /// Unicode scalar value, not by UTF-16 code unit.
    pub fn native_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Build a value from a plain JSON document (no wire tags are interpreted).
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Deep equality: tags must match, sequences compare pairwise, mappings
/// compare key sets and then every key. NaN equals NaN so that a document
/// always equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Regex(pattern)
    }
}

/// Values serialize through the wire codec so that sentinel-shaped data
/// stays distinguishable from real sequences.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        crate::codec::encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = serde_json::Value::deserialize(deserializer)?;
        crate::codec::decode(&wire).map_err(serde::de::Error::custom)
    }
}

/// A compiled regular expression together with its source and flags.
///
/// Flags follow the interchange format: `g` (ignored for matching), `i`
/// (case-insensitive), `m` (multi-line) and `s` (dot matches newline).
#[derive(Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    compiled: regex::Regex,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for an unsupported flag or a pattern that
    /// does not compile.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let flags = flags.into();
        let invalid = |message: String| DiffError::InvalidPattern {
            pattern: source.clone(),
            flags: flags.clone(),
            message,
        };

        let mut builder = regex::RegexBuilder::new(&source);
        for flag in flags.chars() {
            match flag {
                'g' | 'u' | 'y' => {}
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                other => return Err(invalid(format!("unsupported flag '{}'", other)).into()),
            }
        }
        let compiled = builder.build().map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source,
            flags,
            compiled,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classifier_tags() {
        assert_eq!(Value::Null.type_tag(), TypeTag::Null);
        assert_eq!(Value::from(true).type_tag(), TypeTag::Boolean);
        assert_eq!(Value::from(2.5).type_tag(), TypeTag::Number);
        assert_eq!(Value::from("s").type_tag(), TypeTag::String);
        assert_eq!(Value::Array(vec![]).type_tag(), TypeTag::Array);
        assert_eq!(Value::Object(Map::new()).type_tag(), TypeTag::Object);
        assert_eq!(Value::Undefined.type_tag(), TypeTag::Undefined);
        assert_eq!(classify(None), None);
    }

    #[test]
    fn test_tag_names_round_trip() {
        for tag in [
            TypeTag::Null,
            TypeTag::Boolean,
            TypeTag::Number,
            TypeTag::String,
            TypeTag::Array,
            TypeTag::Object,
            TypeTag::Regexp,
            TypeTag::Undefined,
            TypeTag::Function,
        ] {
            assert_eq!(TypeTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(TypeTag::from_name("String"), None);
    }

    #[test]
    fn test_truthiness() {
        let truthy = [
            Value::from(-1.5),
            Value::from(0.01),
            Value::from("a string"),
            Value::from(true),
            Value::Array(vec![]),
            Value::Object(Map::new()),
        ];
        for v in &truthy {
            assert!(v.is_truthy(), "{:?} should be truthy", v);
        }

        let falsy = [
            Value::from(0),
            Value::from(""),
            Value::Null,
            Value::from(false),
            Value::Undefined,
            Value::Number(f64::NAN),
        ];
        for v in &falsy {
            assert!(!v.is_truthy(), "{:?} should be falsy", v);
        }
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::from_json(&json!({"foo": ["bar", {"baz": "quux"}]}));
        let b = Value::from_json(&json!({"foo": ["bar", {"baz": "quux"}]}));
        let c = Value::from_json(&json!({"foo": ["bar", {"baz": "quuz"}]}));
        assert_eq!(a, b);
        assert_ne!(a, c);

        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from(0), Value::from(false));
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn test_native_cmp_requires_same_tag() {
        assert_eq!(
            Value::from(1).native_cmp(&Value::from(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("Banana").native_cmp(&Value::from("apple")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Array(vec![]).native_cmp(&Value::from(5)), None);
        assert_eq!(Value::from(1).native_cmp(&Value::from("1")), None);
    }

    #[test]
    fn test_strings_order_by_scalar_value() {
        // U+FF5E sorts after the surrogate pair of U+1F600 in UTF-16.
        assert_eq!(
            Value::from("\u{FF5E}").native_cmp(&Value::from("\u{1F600}")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("a\u{1F600}").native_cmp(&Value::from("a\u{E000}")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_pattern_flags() {
        let p = Pattern::new("^HELLO", "i").unwrap();
        assert!(p.is_match("hello world"));
        assert!(Pattern::new("x", "q").is_err());
        assert!(Pattern::new("(", "").is_err());
        assert_eq!(Pattern::new("a", "g").unwrap(), Pattern::new("a", "g").unwrap());
        assert_ne!(Pattern::new("a", "g").unwrap(), Pattern::new("a", "i").unwrap());
    }
}
