//! Wire codec
//!
//! Encodes values, absent fields and guides into a plain `serde_json::Value`
//! tree and back. Every sequence is wrapped in an `["array", [...]]`
//! envelope, so a bare wire array is always a tag form and can never be
//! confused with a document array.
//!
//! Tag forms:
//!
//! - `["array", [..]]`, `["undefined"]`, `["gone"]`
//! - `["any"]`, `["truthy"]`, `["falsy"]`, `["timestamp"]`, `["lesser"]`, `["greater"]`
//! - `["regexp", source, flags]`
//! - `["number", "NaN" | "Infinity" | "-Infinity"]`
//! - `["String"]`, `["Number"]`, `["Boolean"]`, `["Object"]`, `["Array"]`, `["type", tag]`
//! - `["function", name, [params]]`

use crate::errors::{DiffError, Result};
use crate::guide::Sentinel;
use crate::value::{Map, Pattern, TypeTag, Value};
use serde_json::{json, Value as Json};

pub const TAG_ARRAY: &str = "array";
pub const TAG_UNDEFINED: &str = "undefined";
pub const TAG_REGEXP: &str = "regexp";
pub const TAG_NUMBER: &str = "number";
pub const TAG_TYPE: &str = "type";
pub const TAG_FUNCTION: &str = "function";

/// A classified wire value.
///
/// Parsing a wire value into a `WireForm` is the only place that inspects
/// tag strings; everything downstream matches on this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum WireForm<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Object(&'a serde_json::Map<String, Json>),
    Array(&'a [Json]),
    Undefined,
    Gone,
    Sentinel(Sentinel),
    Regexp { source: &'a str, flags: &'a str },
    Type(TypeTag),
    Function { name: &'a str, params: &'a [Json] },
}

fn malformed(wire: &Json) -> DiffError {
    DiffError::MalformedWire {
        wire: wire.to_string(),
    }
}

/// Classify a wire value by its shape and tag.
///
/// # Errors
///
/// Returns an `Encoding` error for an unknown tag or a known tag with the
/// wrong arity.
pub fn parse(wire: &Json) -> Result<WireForm<'_>> {
    let items = match wire {
        Json::Null => return Ok(WireForm::Null),
        Json::Bool(b) => return Ok(WireForm::Bool(*b)),
        Json::Number(n) => return Ok(WireForm::Number(n.as_f64().unwrap_or(f64::NAN))),
        Json::String(s) => return Ok(WireForm::String(s)),
        Json::Object(map) => return Ok(WireForm::Object(map)),
        Json::Array(items) => items,
    };

    let (tag, rest) = match items.split_first() {
        Some((Json::String(tag), rest)) => (tag.as_str(), rest),
        _ => return Err(malformed(wire).into()),
    };

    let form = match (tag, rest) {
        (TAG_ARRAY, [Json::Array(inner)]) => WireForm::Array(inner),
        (TAG_UNDEFINED, []) => WireForm::Undefined,
        (TAG_REGEXP, [Json::String(source), Json::String(flags)]) => WireForm::Regexp {
            source,
            flags,
        },
        (TAG_REGEXP, [Json::String(source)]) => WireForm::Regexp { source, flags: "" },
        (TAG_NUMBER, [Json::String(special)]) => match special.as_str() {
            "NaN" => WireForm::Number(f64::NAN),
            "Infinity" => WireForm::Number(f64::INFINITY),
            "-Infinity" => WireForm::Number(f64::NEG_INFINITY),
            _ => return Err(malformed(wire).into()),
        },
        (TAG_TYPE, [Json::String(name)]) => match TypeTag::from_name(name) {
            Some(tag) => WireForm::Type(tag),
            None => {
                return Err(DiffError::UnknownType {
                    tag: name.to_string(),
                }
                .into())
            }
        },
        (TAG_FUNCTION, [Json::String(name), Json::Array(params)]) => {
            WireForm::Function { name, params }
        }
        // Legacy form carrying the formal parameter list (a string such as
        // "val, other", or an array of names) and a body; only the name is
        // honoured.
        (
            TAG_FUNCTION,
            [Json::String(name), Json::String(_) | Json::Array(_), Json::String(_)],
        ) => WireForm::Function { name, params: &[] },
        (name, []) => {
            if let Some(tag) = type_tag_from_constructor(name) {
                WireForm::Type(tag)
            } else if name == Sentinel::GONE_TAG {
                WireForm::Gone
            } else if let Some(sentinel) = Sentinel::from_tag(name) {
                WireForm::Sentinel(sentinel)
            } else {
                return Err(DiffError::UnknownType {
                    tag: name.to_string(),
                }
                .into());
            }
        }
        (TAG_ARRAY | TAG_UNDEFINED | TAG_REGEXP | TAG_NUMBER | TAG_TYPE | TAG_FUNCTION, _) => {
            return Err(malformed(wire).into())
        }
        (name, _) => {
            return Err(DiffError::UnknownType {
                tag: name.to_string(),
            }
            .into())
        }
    };
    Ok(form)
}

fn type_tag_from_constructor(name: &str) -> Option<TypeTag> {
    Some(match name {
        "String" => TypeTag::String,
        "Number" => TypeTag::Number,
        "Boolean" => TypeTag::Boolean,
        "Object" => TypeTag::Object,
        "Array" => TypeTag::Array,
        _ => return None,
    })
}

/// Wire form of a type guide.
pub fn encode_type(tag: TypeTag) -> Json {
    match tag {
        TypeTag::String => json!(["String"]),
        TypeTag::Number => json!(["Number"]),
        TypeTag::Boolean => json!(["Boolean"]),
        TypeTag::Object => json!(["Object"]),
        TypeTag::Array => json!(["Array"]),
        other => json!([TAG_TYPE, other.name()]),
    }
}

/// Encode a value. Total over `Value`.
pub fn encode(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => encode_number(*n),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => json!([TAG_ARRAY, items.iter().map(encode).collect::<Vec<_>>()]),
        Value::Object(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
        Value::Regex(pattern) => json!([TAG_REGEXP, pattern.source(), pattern.flags()]),
        Value::Undefined => json!([TAG_UNDEFINED]),
    }
}

fn encode_number(n: f64) -> Json {
    match serde_json::Number::from_f64(n) {
        // Integral values keep an integer wire form.
        Some(_) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => json!(n as i64),
        Some(num) => Json::Number(num),
        None if n.is_nan() => json!([TAG_NUMBER, "NaN"]),
        None if n > 0.0 => json!([TAG_NUMBER, "Infinity"]),
        None => json!([TAG_NUMBER, "-Infinity"]),
    }
}

/// Encode a possibly absent field; absence encodes as `["gone"]`.
pub fn encode_field(field: Option<&Value>) -> Json {
    match field {
        Some(value) => encode(value),
        None => json!([Sentinel::GONE_TAG]),
    }
}

/// Decode a document value.
///
/// # Errors
///
/// Returns an `Encoding` error when the wire holds a sentinel, a type guide,
/// a predicate or an unknown tag anywhere in the tree.
pub fn decode(wire: &Json) -> Result<Value> {
    Ok(match parse(wire)? {
        WireForm::Null => Value::Null,
        WireForm::Bool(b) => Value::Bool(b),
        WireForm::Number(n) => Value::Number(n),
        WireForm::String(s) => Value::String(s.to_string()),
        WireForm::Object(map) => Value::Object(decode_map(map)?),
        WireForm::Array(items) => Value::Array(items.iter().map(decode).collect::<Result<_>>()?),
        WireForm::Undefined => Value::Undefined,
        WireForm::Regexp { source, flags } => Value::Regex(Pattern::new(source, flags)?),
        WireForm::Gone
        | WireForm::Sentinel(_)
        | WireForm::Type(_)
        | WireForm::Function { .. } => return Err(malformed(wire).into()),
    })
}

/// Decode a possibly absent field; `["gone"]` decodes to `None`.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_field(wire: &Json) -> Result<Option<Value>> {
    match parse(wire)? {
        WireForm::Gone => Ok(None),
        _ => decode(wire).map(Some),
    }
}

pub(crate) fn decode_map(map: &serde_json::Map<String, Json>) -> Result<Map> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), decode(v)?)))
        .collect()
}
