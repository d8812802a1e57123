//! Engine façade
//!
//! Holds the configuration and the predicate registry, and owns lifecycle
//! logging for the operations a host calls:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (differ, guides, policy) use only `tracing::debug!()` and
//! `tracing::trace!()` for internal details.

use crate::config::EngineConfig;
use crate::diff::{compute_diff, Diff};
use crate::errors::{DiffError, Result};
use crate::policy::{Policy, Query};
use crate::predicate::PredicateRegistry;
use crate::rule::Rule;
use crate::value::{Map, Value};
use crate::{log_op_end, log_op_error, log_op_start};
use serde_json::Value as Json;
use std::time::Instant;

/// A configured diff and policy engine.
///
/// Cheap to share between threads: every operation borrows `&self` and
/// performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    registry: PredicateRegistry,
}

impl Engine {
    /// An engine with the built-in predicates.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, PredicateRegistry::with_builtins())
    }

    pub fn with_registry(config: EngineConfig, registry: PredicateRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Diff two documents.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless both documents are mappings.
    pub fn diff(&self, from: &Value, to: &Value) -> Result<Diff> {
        log_op_start!("diff");
        let start = Instant::now();

        let result = compute_diff(from, to, self.config);

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(diff) => log_op_end!("diff", duration_ms = elapsed, change_count = diff.len()),
            Err(e) => log_op_error!("diff", e.clone(), duration_ms = elapsed),
        }
        result
    }

    /// Diff a stored document against its proposed replacement.
    ///
    /// This is the entry point for a store's validation hook. In
    /// managed-store mode a missing old document means the document is
    /// being created and is diffed against an empty mapping.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the old document is missing outside
    /// managed-store mode, or when either document is not a mapping.
    pub fn diff_documents(&self, old: Option<&Value>, new: &Value) -> Result<Diff> {
        match old {
            Some(old) => self.diff(old, new),
            None if self.config.managed_store => self.diff(&Value::Object(Map::new()), new),
            None => {
                let err = DiffError::not_a_mapping("first", None);
                log_op_error!("diff", err.clone(), duration_ms = 0u64);
                Err(err.into())
            }
        }
    }

    /// Answer a policy query, logging the lifecycle of the evaluation.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` when strict assertions are configured and the query fails.
    pub fn evaluate(&self, diff: &Diff, query: Query<'_>) -> Result<bool> {
        let op = query.name();
        log_op_start!(
            op,
            change_count = diff.len(),
            rule_count = query.rule_count()
        );
        let start = Instant::now();

        let result = diff.evaluate_under(query, &self.config);

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(verdict) => log_op_end!(op, duration_ms = elapsed, verdict = *verdict),
            Err(e) => log_op_error!(op, e.clone(), duration_ms = elapsed),
        }
        result
    }

    /// Decode a diff and attach this engine's configuration.
    ///
    /// # Errors
    ///
    /// `Encoding` for malformed wire input.
    pub fn decode_diff(&self, wire: &Json) -> Result<Diff> {
        Diff::from_wire(wire, self.config)
    }

    /// Decode a rule, resolving predicates through this engine's registry.
    ///
    /// # Errors
    ///
    /// See [`Rule::from_wire`].
    pub fn decode_rule(&self, wire: &Json) -> Result<Rule> {
        Rule::from_wire(wire, &self.registry)
    }

    /// Decode a policy, resolving predicates through this engine's registry.
    ///
    /// # Errors
    ///
    /// See [`Policy::from_wire`].
    pub fn decode_policy(&self, wire: &Json) -> Result<Policy> {
        Policy::from_wire(wire, &self.registry)
    }

    /// Build a policy from flat `key, [reason,] from, to` arguments.
    ///
    /// # Errors
    ///
    /// See [`Policy::from_flat`].
    pub fn policy_from_flat(&self, args: &[Json], with_reason: bool) -> Result<Policy> {
        Policy::from_flat(args, with_reason, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use serde_json::json;

    fn doc(json: Json) -> Value {
        Value::from_json(&json)
    }

    #[test]
    fn test_missing_old_document() {
        let plain = Engine::new(EngineConfig::default());
        let err = plain.diff_documents(None, &doc(json!({"a": 1}))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidArgument);

        let managed = Engine::new(EngineConfig::new().with_managed_store(true));
        let diff = managed.diff_documents(None, &doc(json!({"a": 1}))).unwrap();
        assert_eq!(diff.len(), 1);
        assert!(diff.config().managed_store);
    }

    #[test]
    fn test_decode_diff_takes_engine_config() {
        let engine = Engine::new(EngineConfig::new().with_strict_assertions(true));
        let diff = engine
            .decode_diff(&json!({"a": {"from": ["gone"], "to": 1}}))
            .unwrap();
        assert!(diff.config().strict_assertions);
        assert!(diff.evaluate(Query::NoChange).is_err());
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = PredicateRegistry::new();
        registry.register("is_answer", |call: &crate::predicate::PredicateCall<'_>| {
            call.element == Some(&Value::from(42))
        });
        let engine = Engine::with_registry(EngineConfig::default(), registry);
        let rule = engine
            .decode_rule(&json!({"key": "n", "from": ["any"], "to": ["function", "is_answer", []]}))
            .unwrap();
        let diff = engine.diff(&doc(json!({"n": 1})), &doc(json!({"n": 42}))).unwrap();
        assert!(diff.at_most(&[rule]));

        let err = engine
            .decode_rule(&json!({"key": "n", "from": ["any"], "to": ["function", "is_even", []]}))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnknownPredicate);
    }
}
