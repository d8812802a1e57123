//! Guides and sentinels
//!
//! A guide describes an acceptable from- or to-value in a rule. Matching is
//! an exhaustive match over [`Guide`]; the wire form is produced and parsed
//! through the codec.

use crate::codec::{self, WireForm};
use crate::errors::{DiffError, Result};
use crate::predicate::{Predicate, PredicateRegistry};
use crate::value::{classify, Pattern, TypeTag, Value};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Named special guides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The field is absent
    Gone,
    /// Anything, including an absent field
    Any,
    Truthy,
    Falsy,
    /// A string shaped `YYYY-MM-DDTHH:MM:SS.mmmZ`
    Timestamp,
    /// Ordered strictly before the counterpart value
    Lesser,
    /// Ordered strictly after the counterpart value
    Greater,
}

impl Sentinel {
    pub const GONE_TAG: &'static str = "gone";

    pub fn tag(&self) -> &'static str {
        match self {
            Sentinel::Gone => Self::GONE_TAG,
            Sentinel::Any => "any",
            Sentinel::Truthy => "truthy",
            Sentinel::Falsy => "falsy",
            Sentinel::Timestamp => "timestamp",
            Sentinel::Lesser => "lesser",
            Sentinel::Greater => "greater",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            Self::GONE_TAG => Sentinel::Gone,
            "any" => Sentinel::Any,
            "truthy" => Sentinel::Truthy,
            "falsy" => Sentinel::Falsy,
            "timestamp" => Sentinel::Timestamp,
            "lesser" => Sentinel::Lesser,
            "greater" => Sentinel::Greater,
            _ => return None,
        })
    }

    fn matches(&self, element: Option<&Value>, other: Option<&Value>) -> bool {
        match self {
            Sentinel::Any => true,
            Sentinel::Gone => element.is_none(),
            Sentinel::Truthy => element.is_some_and(Value::is_truthy),
            Sentinel::Falsy => !element.is_some_and(Value::is_truthy),
            Sentinel::Timestamp => element
                .and_then(Value::as_str)
                .is_some_and(|s| TIMESTAMP_RE.is_match(s)),
            Sentinel::Lesser => ordering(element, other) == Some(Ordering::Less),
            Sentinel::Greater => ordering(element, other) == Some(Ordering::Greater),
        }
    }
}

static TIMESTAMP_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\d{4}-\d\d-\d\dT\d\d:\d\d:\d\d\.\d{3}Z$")
        .expect("timestamp pattern is valid")
});

fn ordering(element: Option<&Value>, other: Option<&Value>) -> Option<Ordering> {
    element?.native_cmp(other?)
}

pub const GONE: Guide = Guide::Sentinel(Sentinel::Gone);
pub const ANY: Guide = Guide::Sentinel(Sentinel::Any);
pub const TRUTHY: Guide = Guide::Sentinel(Sentinel::Truthy);
pub const FALSY: Guide = Guide::Sentinel(Sentinel::Falsy);
pub const TIMESTAMP: Guide = Guide::Sentinel(Sentinel::Timestamp);
pub const LESSER: Guide = Guide::Sentinel(Sentinel::Lesser);
pub const GREATER: Guide = Guide::Sentinel(Sentinel::Greater);

/// A pattern describing an acceptable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Guide {
    /// Deep equality with a value
    Literal(Value),
    /// Classifier tag equality
    Type(TypeTag),
    /// A string matching the pattern
    Pattern(Pattern),
    Sentinel(Sentinel),
    Predicate(Predicate),
}

impl Guide {
    /// Whether `element` satisfies this guide. `other` is the counterpart
    /// value on the opposite side of the change; only ordering sentinels
    /// and predicates consult it.
    pub fn matches(&self, element: Option<&Value>, other: Option<&Value>) -> bool {
        match self {
            Guide::Literal(expected) => element == Some(expected),
            Guide::Type(tag) => classify(element) == Some(*tag),
            Guide::Pattern(pattern) => element
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
            Guide::Sentinel(sentinel) => sentinel.matches(element, other),
            Guide::Predicate(predicate) => predicate.call(element, other),
        }
    }

    /// Wire form of the guide.
    pub fn to_wire(&self) -> Json {
        match self {
            Guide::Literal(value) => codec::encode(value),
            Guide::Type(tag) => codec::encode_type(*tag),
            Guide::Pattern(pattern) => {
                json!([codec::TAG_REGEXP, pattern.source(), pattern.flags()])
            }
            Guide::Sentinel(sentinel) => json!([sentinel.tag()]),
            Guide::Predicate(predicate) => json!([
                codec::TAG_FUNCTION,
                predicate.name(),
                predicate.params().iter().map(codec::encode).collect::<Vec<_>>()
            ]),
        }
    }

    /// Decode a guide, resolving predicate names through `registry`.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` for unknown tags, `UnknownPredicate` for an
    /// unregistered predicate name and `InvalidPattern` for a bad regex.
    pub fn from_wire(wire: &Json, registry: &PredicateRegistry) -> Result<Self> {
        Ok(match codec::parse(wire)? {
            WireForm::Gone => GONE,
            WireForm::Sentinel(sentinel) => Guide::Sentinel(sentinel),
            WireForm::Type(tag) => Guide::Type(tag),
            WireForm::Regexp { source, flags } => Guide::Pattern(Pattern::new(source, flags)?),
            WireForm::Function { name, params } => {
                let params = params.iter().map(codec::decode).collect::<Result<_>>()?;
                Guide::Predicate(registry.resolve(name, params)?)
            }
            _ => Guide::Literal(codec::decode(wire)?),
        })
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Guide::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl From<Value> for Guide {
    fn from(value: Value) -> Self {
        match value {
            Value::Regex(pattern) => Guide::Pattern(pattern),
            other => Guide::Literal(other),
        }
    }
}

impl From<Sentinel> for Guide {
    fn from(sentinel: Sentinel) -> Self {
        Guide::Sentinel(sentinel)
    }
}

impl From<TypeTag> for Guide {
    fn from(tag: TypeTag) -> Self {
        Guide::Type(tag)
    }
}

impl From<Pattern> for Guide {
    fn from(pattern: Pattern) -> Self {
        Guide::Pattern(pattern)
    }
}

impl From<Predicate> for Guide {
    fn from(predicate: Predicate) -> Self {
        Guide::Predicate(predicate)
    }
}

macro_rules! literal_guide_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Guide {
                fn from(value: $ty) -> Self {
                    Guide::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_guide_from!(bool, f64, i64, i32, &str, String);

/// Decode a required guide field of a rule.
pub(crate) fn guide_from_wire_field(
    wire: Option<&Json>,
    registry: &PredicateRegistry,
    message: &str,
) -> Result<Guide> {
    match wire {
        Some(wire) => Guide::from_wire(wire, registry),
        None => Err(DiffError::IncompleteRule {
            message: message.to_string(),
        }
        .into()),
    }
}
