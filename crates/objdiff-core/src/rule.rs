//! Rules: a path plus a from-guide and a to-guide

use crate::errors::{DiffError, Result};
use crate::guide::{guide_from_wire_field, Guide};
use crate::predicate::PredicateRegistry;
use crate::value::Value;
use serde_json::{json, Value as Json};

/// A single policy statement.
///
/// Immutable once constructed. Construction rejects an empty key and a
/// pair of identical literal guides, since such a rule can never describe a
/// change.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    key: String,
    from: Guide,
    to: Guide,
    reason: Option<String>,
}

impl Rule {
    /// Build a rule without a reason.
    ///
    /// # Errors
    ///
    /// `IncompleteRule` for an empty key, `NoOpRule` for identical literal guides.
    pub fn new(key: impl Into<String>, from: impl Into<Guide>, to: impl Into<Guide>) -> Result<Self> {
        Self::build(key.into(), None, from.into(), to.into())
    }

    /// Build a rule carrying a human-readable reason.
    ///
    /// # Errors
    ///
    /// Same as [`Rule::new`].
    pub fn with_reason(
        key: impl Into<String>,
        reason: impl Into<String>,
        from: impl Into<Guide>,
        to: impl Into<Guide>,
    ) -> Result<Self> {
        Self::build(key.into(), Some(reason.into()), from.into(), to.into())
    }

    fn build(key: String, reason: Option<String>, from: Guide, to: Guide) -> Result<Self> {
        if key.is_empty() {
            return Err(DiffError::IncompleteRule {
                message: "Rule key must not be empty".to_string(),
            }
            .into());
        }
        if let (Some(a), Some(b)) = (from.as_literal(), to.as_literal()) {
            if a == b {
                return Err(DiffError::NoOpRule { key }.into());
            }
        }
        Ok(Self::unchecked(key, reason, from, to))
    }

    /// Construct without validation; for fixed rule sets known to be well formed.
    pub(crate) fn unchecked(key: impl Into<String>, reason: Option<String>, from: Guide, to: Guide) -> Self {
        Self {
            key: key.into(),
            from,
            to,
            reason,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn from_guide(&self) -> &Guide {
        &self.from
    }

    pub fn to_guide(&self) -> &Guide {
        &self.to
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether this rule matches the change `from -> to` at `key`.
    ///
    /// The from-guide sees the to-value as its counterpart and vice versa.
    pub fn matches(&self, key: &str, from: Option<&Value>, to: Option<&Value>) -> bool {
        let result = self.key == key && self.from.matches(from, to) && self.to.matches(to, from);
        tracing::trace!(rule_key = %self.key, path = key, matched = result, "rule match");
        result
    }

    /// Wire form: `{"key", "from", "to", "reason"}` with `reason` omitted when unset.
    pub fn to_wire(&self) -> Json {
        let mut wire = json!({
            "key": self.key,
            "from": self.from.to_wire(),
            "to": self.to.to_wire(),
        });
        if let (Some(reason), Json::Object(map)) = (&self.reason, &mut wire) {
            map.insert("reason".to_string(), Json::String(reason.clone()));
        }
        wire
    }

    /// Decode a rule from its wire form.
    ///
    /// # Errors
    ///
    /// `IncompleteRule` when a field is missing, `Encoding`/`UnknownPredicate`
    /// for bad guides, `NoOpRule` for identical literal guides.
    pub fn from_wire(wire: &Json, registry: &PredicateRegistry) -> Result<Self> {
        const MESSAGE: &str = "Rule must have key, from and to fields";
        let incomplete = || DiffError::IncompleteRule {
            message: MESSAGE.to_string(),
        };

        let map = wire.as_object().ok_or_else(incomplete)?;
        let key = map
            .get("key")
            .and_then(Json::as_str)
            .ok_or_else(incomplete)?;
        let from = guide_from_wire_field(map.get("from"), registry, MESSAGE)?;
        let to = guide_from_wire_field(map.get("to"), registry, MESSAGE)?;
        let reason = match map.get("reason") {
            None | Some(Json::Null) => None,
            Some(Json::String(reason)) => Some(reason.clone()),
            Some(_) => return Err(incomplete().into()),
        };

        Self::build(key.to_string(), reason, from, to)
    }
}
