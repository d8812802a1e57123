//! Structural diff computation.
//!
//! The core entry point is [`compute_diff`], which walks two mappings and
//! records a [`Change`] at every leaf path where they differ.

use crate::config::EngineConfig;
use crate::diff::model::{Change, Diff};
use crate::errors::{DiffError, Result};
use crate::store::OPAQUE_PATHS;
use crate::value::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Paths the walker records as single leaves instead of descending into.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaquePaths<'a>(&'a [&'a str]);

impl<'a> OpaquePaths<'a> {
    pub fn new(paths: &'a [&'a str]) -> Self {
        Self(paths)
    }

    /// The opaque paths implied by a configuration.
    pub fn for_config(config: &EngineConfig) -> OpaquePaths<'static> {
        if config.managed_store {
            OpaquePaths(OPAQUE_PATHS)
        } else {
            OpaquePaths(&[])
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.0.contains(&path)
    }
}

/// Compute the diff between two documents.
///
/// Both inputs must be mappings. Nested values may be anything; a mapping or
/// sequence on both sides is descended into, any other differing pair is
/// recorded as one change.
///
/// # Errors
///
/// - `InvalidArgument` if either document is not a mapping
/// - `InvalidArgument` if two changed fields flatten to the same path, such
///   as a literal key `"a.b"` next to a nested `a` → `b`
pub fn compute_diff(from: &Value, to: &Value, config: EngineConfig) -> Result<Diff> {
    let from_map = from
        .as_object()
        .ok_or_else(|| DiffError::not_a_mapping("first", Some(from.type_tag())))?;
    let to_map = to
        .as_object()
        .ok_or_else(|| DiffError::not_a_mapping("second", Some(to.type_tag())))?;

    let mut walker = Walker {
        opaque: OpaquePaths::for_config(&config),
        changes: BTreeMap::new(),
    };
    walker.mappings("", from_map, to_map)?;

    tracing::debug!(change_count = walker.changes.len(), "diff computed");
    Ok(Diff::new(walker.changes, config))
}

struct Walker<'a> {
    opaque: OpaquePaths<'a>,
    changes: BTreeMap<String, Change>,
}

impl Walker<'_> {
    fn mappings(&mut self, prefix: &str, from: &Map, to: &Map) -> Result<()> {
        let keys: BTreeSet<&String> = from.keys().chain(to.keys()).collect();
        for key in keys {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            self.entry(path, from.get(key), to.get(key))?;
        }
        Ok(())
    }

    fn sequences(&mut self, prefix: &str, from: &[Value], to: &[Value]) -> Result<()> {
        for i in 0..from.len().max(to.len()) {
            self.entry(format!("{}[{}]", prefix, i), from.get(i), to.get(i))?;
        }
        Ok(())
    }

    fn entry(&mut self, path: String, from: Option<&Value>, to: Option<&Value>) -> Result<()> {
        match (from, to) {
            (None, None) => Ok(()),
            (Some(a), Some(b)) if !self.opaque.contains(&path) => match (a, b) {
                (Value::Object(a), Value::Object(b)) => self.mappings(&path, a, b),
                (Value::Array(a), Value::Array(b)) => self.sequences(&path, a, b),
                _ => self.leaf(path, from, to),
            },
            _ => self.leaf(path, from, to),
        }
    }

    fn leaf(&mut self, path: String, from: Option<&Value>, to: Option<&Value>) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.changes.contains_key(&path) {
            return Err(DiffError::AmbiguousPath { path }.into());
        }
        tracing::trace!(path = %path, "change");
        self.changes
            .insert(path, Change::new(from.cloned(), to.cloned()));
        Ok(())
    }
}
