//! Diff output types.
//!
//! A `Diff` is a flat map from path to `Change`. Paths use `.` for mapping
//! descent and `[i]` for sequence descent; the map is a `BTreeMap`, so
//! iteration (and therefore at-most evaluation order) is sorted by path.

use crate::codec;
use crate::config::EngineConfig;
use crate::errors::{DiffError, ExError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;

/// One side of a change: `None` is an absent field (GONE).
pub type Field = Option<Value>;

/// A single field's before/after pair. `from` and `to` are never equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub struct Change {
    from: Field,
    to: Field,
}

impl Change {
    pub(crate) fn new(from: Field, to: Field) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> Option<&Value> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&Value> {
        self.to.as_ref()
    }

    /// Wire form: `{"from": .., "to": ..}` with absent sides as `["gone"]`.
    pub fn to_wire(&self) -> Json {
        json!({
            "from": codec::encode_field(self.from()),
            "to": codec::encode_field(self.to()),
        })
    }

    /// Decode a change.
    ///
    /// # Errors
    ///
    /// `Encoding` when a side is missing or malformed, or when both sides
    /// are equal.
    pub fn from_wire(wire: &Json) -> Result<Self> {
        let malformed = || DiffError::MalformedWire {
            wire: wire.to_string(),
        };
        let map = wire.as_object().ok_or_else(malformed)?;
        let from = codec::decode_field(map.get("from").ok_or_else(malformed)?)?;
        let to = codec::decode_field(map.get("to").ok_or_else(malformed)?)?;
        if from == to {
            return Err(malformed().into());
        }
        Ok(Self { from, to })
    }
}

impl TryFrom<Json> for Change {
    type Error = ExError;

    fn try_from(wire: Json) -> Result<Self> {
        Change::from_wire(&wire)
    }
}

impl From<Change> for Json {
    fn from(change: Change) -> Self {
        change.to_wire()
    }
}

/// The set of per-path changes between two documents.
///
/// Carries the configuration of the engine that produced it, so policy
/// evaluation honours managed-store rules and strict assertions. Equality
/// compares the changes only.
///
/// Serializes to the bare wire form. The configuration is not part of the
/// wire, so decoding goes through [`Engine::decode_diff`](crate::Engine::decode_diff),
/// which attaches the decoding engine's configuration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(into = "Json")]
pub struct Diff {
    changes: BTreeMap<String, Change>,
    config: EngineConfig,
}

impl Diff {
    pub(crate) fn new(changes: BTreeMap<String, Change>, config: EngineConfig) -> Self {
        Self { changes, config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// The same changes evaluated under a different configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn get(&self, path: &str) -> Option<&Change> {
        self.changes.get(path)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Wire form: `{path: {"from": .., "to": ..}}`.
    pub fn to_wire(&self) -> Json {
        Json::Object(
            self.changes
                .iter()
                .map(|(path, change)| (path.clone(), change.to_wire()))
                .collect(),
        )
    }

    /// Decode a diff that evaluates under `config`.
    ///
    /// # Errors
    ///
    /// `Encoding` when the wire is not a mapping of changes.
    pub fn from_wire(wire: &Json, config: EngineConfig) -> Result<Self> {
        let map = wire.as_object().ok_or_else(|| DiffError::MalformedWire {
            wire: wire.to_string(),
        })?;
        let changes = map
            .iter()
            .map(|(path, change)| Ok((path.clone(), Change::from_wire(change)?)))
            .collect::<Result<_>>()?;
        Ok(Self::new(changes, config))
    }

    /// Hex SHA-256 of the canonical wire JSON.
    pub fn digest(&self) -> String {
        let canonical = self.to_wire().to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.changes == other.changes
    }
}

impl From<Diff> for Json {
    fn from(diff: Diff) -> Self {
        diff.to_wire()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = (&'a String, &'a Change);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
