//! Policy evaluation
//!
//! A policy is an ordered list of rules. A [`Diff`] is judged against it in
//! one of three ways:
//!
//! - **at-most** (allow-list): every change is matched by some rule
//! - **at-least** (require-list): every rule matches some change
//! - **no-change**: at-most with no caller rules
//!
//! The boolean forms never fail. The `assert_*` forms report the first
//! violation as a `PolicyViolation` error: at-most walks the diff in path
//! order, at-least walks the rules in list order.

use crate::config::EngineConfig;
use crate::diff::{Change, Diff};
use crate::errors::{DiffError, ExError, Result};
use crate::guide::Guide;
use crate::predicate::PredicateRegistry;
use crate::rule::Rule;
use crate::store;
use serde_json::{json, Value as Json};
use std::ops::Deref;

/// An ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    rules: Vec<Rule>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn allow(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Build a policy from a flat argument list of `key, [reason,] from, to`
    /// groups, each guide in wire form.
    ///
    /// # Errors
    ///
    /// `IncompleteRule` when the arguments do not divide into complete
    /// groups or a key/reason is not a string; any error from rule
    /// construction or guide decoding.
    pub fn from_flat(args: &[Json], with_reason: bool, registry: &PredicateRegistry) -> Result<Self> {
        let message = if with_reason {
            "Must provide key, reason, old_val, new_val arguments"
        } else {
            "Must provide key, old_val, new_val arguments"
        };
        let incomplete = || DiffError::IncompleteRule {
            message: message.to_string(),
        };

        let group = if with_reason { 4 } else { 3 };
        if args.len() % group != 0 {
            return Err(incomplete().into());
        }

        let mut rules = Vec::with_capacity(args.len() / group);
        for chunk in args.chunks(group) {
            let (key, reason, from, to) = match chunk {
                [key, from, to] => (key, None, from, to),
                [key, reason, from, to] => (key, Some(reason), from, to),
                _ => return Err(incomplete().into()),
            };
            let key = key.as_str().ok_or_else(incomplete)?;
            let reason = match reason {
                None | Some(Json::Null) => None,
                Some(Json::String(reason)) => Some(reason.as_str()),
                Some(_) => return Err(incomplete().into()),
            };
            let from = Guide::from_wire(from, registry)?;
            let to = Guide::from_wire(to, registry)?;
            rules.push(match reason {
                Some(reason) => Rule::with_reason(key, reason, from, to)?,
                None => Rule::new(key, from, to)?,
            });
        }
        Ok(Self { rules })
    }

    /// Wire form: a sequence of rule objects.
    pub fn to_wire(&self) -> Json {
        Json::Array(self.rules.iter().map(Rule::to_wire).collect())
    }

    /// Decode a policy from a sequence of rule objects.
    ///
    /// # Errors
    ///
    /// `Encoding` when the wire is not a sequence; any error from
    /// [`Rule::from_wire`].
    pub fn from_wire(wire: &Json, registry: &PredicateRegistry) -> Result<Self> {
        let items = wire.as_array().ok_or_else(|| DiffError::MalformedWire {
            wire: wire.to_string(),
        })?;
        let rules = items
            .iter()
            .map(|item| Rule::from_wire(item, registry))
            .collect::<Result<_>>()?;
        Ok(Self { rules })
    }
}

impl Deref for Policy {
    type Target = [Rule];

    fn deref(&self) -> &[Rule] {
        &self.rules
    }
}

impl From<Vec<Rule>> for Policy {
    fn from(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

impl FromIterator<Rule> for Policy {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// A policy question asked of a diff.
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    NoChange,
    AtMost(&'a [Rule]),
    AtLeast(&'a [Rule]),
}

impl Query<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Query::NoChange => "no_change",
            Query::AtMost(_) => "at_most",
            Query::AtLeast(_) => "at_least",
        }
    }

    pub fn rule_count(&self) -> usize {
        match self {
            Query::NoChange => 0,
            Query::AtMost(rules) | Query::AtLeast(rules) => rules.len(),
        }
    }
}

impl Diff {
    /// True iff the diff is empty, apart from bookkeeping changes in
    /// managed-store mode.
    pub fn no_change(&self) -> bool {
        self.at_most(&[])
    }

    /// True iff every change is matched by at least one rule.
    pub fn at_most(&self, rules: &[Rule]) -> bool {
        self.first_unmatched_change(rules, &self.config()).is_none()
    }

    /// True iff every rule matches at least one change.
    pub fn at_least(&self, rules: &[Rule]) -> bool {
        self.first_unsatisfied_rule(rules).is_none()
    }

    /// # Errors
    ///
    /// `PolicyViolation` for the first change in path order.
    pub fn assert_no_change(&self) -> Result<()> {
        self.check_at_most(&[], &self.config(), "assert_no_change")
            .map_err(ExError::from)
    }

    /// # Errors
    ///
    /// `PolicyViolation` for the first change no rule matches.
    pub fn assert_at_most(&self, rules: &[Rule]) -> Result<()> {
        self.check_at_most(rules, &self.config(), "assert_at_most")
            .map_err(ExError::from)
    }

    /// # Errors
    ///
    /// `PolicyViolation` for the first rule no change matches.
    pub fn assert_at_least(&self, rules: &[Rule]) -> Result<()> {
        self.check_at_least(rules, "assert_at_least")
            .map_err(ExError::from)
    }

    /// Answer a query. With strict assertions configured, a failing query
    /// returns the violation instead of `Ok(false)`.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` in strict mode only.
    pub fn evaluate(&self, query: Query<'_>) -> Result<bool> {
        self.evaluate_under(query, &self.config())
    }

    /// [`Diff::evaluate`] under an explicit configuration.
    pub(crate) fn evaluate_under(&self, query: Query<'_>, config: &EngineConfig) -> Result<bool> {
        let outcome = match query {
            Query::NoChange => self.check_at_most(&[], config, "no_change"),
            Query::AtMost(rules) => self.check_at_most(rules, config, "at_most"),
            Query::AtLeast(rules) => self.check_at_least(rules, "at_least"),
        };
        match outcome {
            Ok(()) => Ok(true),
            Err(violation) if config.strict_assertions => Err(violation.into()),
            Err(_) => Ok(false),
        }
    }

    fn first_unmatched_change<'d>(
        &'d self,
        rules: &[Rule],
        config: &EngineConfig,
    ) -> Option<(&'d str, &'d Change)> {
        let injected = store::injected_rules(config);
        self.iter().find(|(path, change)| {
            let matched = rules
                .iter()
                .chain(injected)
                .any(|rule| rule.matches(path, change.from(), change.to()));
            if !matched {
                tracing::debug!(path = %path, "change not allowed by any rule");
            }
            !matched
        })
    }

    fn first_unsatisfied_rule<'r>(&self, rules: &'r [Rule]) -> Option<&'r Rule> {
        rules.iter().find(|rule| {
            let satisfied = self
                .iter()
                .any(|(path, change)| rule.matches(path, change.from(), change.to()));
            if !satisfied {
                tracing::debug!(rule_key = %rule.key(), "required change did not occur");
            }
            !satisfied
        })
    }

    fn check_at_most(
        &self,
        rules: &[Rule],
        config: &EngineConfig,
        op: &'static str,
    ) -> std::result::Result<(), DiffError> {
        let Some((path, change)) = self.first_unmatched_change(rules, config) else {
            return Ok(());
        };
        let reason = rules
            .iter()
            .chain(store::injected_rules(config))
            .find(|rule| rule.key() == path)
            .and_then(Rule::reason)
            .map(str::to_string);
        let wire = change.to_wire();
        let message = reason.clone().unwrap_or_else(|| {
            format!("Change must match: {} -> {}", json!(path), wire)
        });
        Err(DiffError::Violation {
            op,
            key: path.to_string(),
            reason,
            from: wire["from"].clone(),
            to: wire["to"].clone(),
            message,
        })
    }

    fn check_at_least(&self, rules: &[Rule], op: &'static str) -> std::result::Result<(), DiffError> {
        let Some(rule) = self.first_unsatisfied_rule(rules) else {
            return Ok(());
        };
        let reason = rule.reason().map(str::to_string);
        let message = reason.clone().unwrap_or_else(|| {
            format!("Required change did not occur: {}", json!(rule.key()))
        });
        Err(DiffError::Violation {
            op,
            key: rule.key().to_string(),
            reason,
            from: rule.from_guide().to_wire(),
            to: rule.to_guide().to_wire(),
            message,
        })
    }
}
