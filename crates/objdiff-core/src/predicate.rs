//! Named predicate registry
//!
//! Predicate guides reference a registered function by name plus a list of
//! captured parameters. The wire form carries only the name and parameters,
//! so decoding a predicate is a registry lookup.

use crate::errors::{DiffError, Result};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Arguments passed to a predicate invocation.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCall<'a> {
    /// The value under test (`None` when the field is absent)
    pub element: Option<&'a Value>,
    /// The counterpart value from the other side of the change
    pub other: Option<&'a Value>,
    /// Parameters captured when the guide was built
    pub params: &'a [Value],
}

/// A registered predicate implementation.
pub type PredicateFn = Arc<dyn Fn(&PredicateCall<'_>) -> bool + Send + Sync>;

pub const NON_EMPTY_ARRAY: &str = "non_empty_array";
pub const IS_EVEN: &str = "is_even";
pub const IS_ODD: &str = "is_odd";
pub const SAME_MEMBERS: &str = "same_members";
pub const NO_LEADING_UNDERSCORE: &str = "no_leading_underscore";
pub const EQUALS_PARAM: &str = "equals_param";
pub const ONE_OF: &str = "one_of";

/// A predicate guide: a resolved function plus its captured parameters.
///
/// Two predicates are equal when their names and parameters are equal.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    params: Vec<Value>,
    func: PredicateFn,
}

impl Predicate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Invoke the predicate.
    pub fn call(&self, element: Option<&Value>, other: Option<&Value>) -> bool {
        (self.func)(&PredicateCall {
            element,
            other,
            params: &self.params,
        })
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Registry of named predicates.
#[derive(Clone)]
pub struct PredicateRegistry {
    entries: BTreeMap<String, PredicateFn>,
}

impl PredicateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in predicates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(NON_EMPTY_ARRAY, non_empty_array);
        registry.register(IS_EVEN, |call: &PredicateCall<'_>| parity(call.element) == Some(0));
        registry.register(IS_ODD, |call: &PredicateCall<'_>| parity(call.element) == Some(1));
        registry.register(SAME_MEMBERS, same_members);
        registry.register(NO_LEADING_UNDERSCORE, no_leading_underscore);
        registry.register(EQUALS_PARAM, |call: &PredicateCall<'_>| {
            matches!((call.element, call.params.first()), (Some(e), Some(p)) if e == p)
        });
        registry.register(ONE_OF, |call: &PredicateCall<'_>| {
            call.element
                .is_some_and(|element| call.params.iter().any(|p| p == element))
        });
        registry
    }

    /// Register a predicate, replacing any existing entry with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&PredicateCall<'_>) -> bool + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(func));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PredicateFn> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Build a predicate guide from a registered name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPredicate` if no predicate is registered under `name`.
    pub fn resolve(&self, name: &str, params: Vec<Value>) -> Result<Predicate> {
        let func = self.get(name).ok_or_else(|| DiffError::UnknownPredicate {
            name: name.to_string(),
        })?;
        Ok(Predicate {
            name: name.to_string(),
            params,
            func: Arc::clone(func),
        })
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// The built-in `non_empty_array` predicate, independent of any registry.
pub(crate) fn non_empty_array_predicate() -> Predicate {
    Predicate {
        name: NON_EMPTY_ARRAY.to_string(),
        params: Vec::new(),
        func: Arc::new(non_empty_array),
    }
}

fn non_empty_array(call: &PredicateCall<'_>) -> bool {
    call.element
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

fn parity(element: Option<&Value>) -> Option<i64> {
    let n = element?.as_f64()?;
    if n.fract() != 0.0 || !n.is_finite() {
        return None;
    }
    // Float remainder is exact, so this holds past the i64 range too.
    Some(if (n % 2.0).abs() == 0.0 { 0 } else { 1 })
}

fn same_members(call: &PredicateCall<'_>) -> bool {
    let (Some(left), Some(right)) = (
        call.element.and_then(Value::as_array),
        call.other.and_then(Value::as_array),
    ) else {
        return false;
    };
    if left.len() != right.len() {
        return false;
    }

    let mut used = vec![false; right.len()];
    left.iter().all(|item| {
        let slot = right
            .iter()
            .enumerate()
            .position(|(i, candidate)| !used[i] && candidate == item);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn no_leading_underscore(call: &PredicateCall<'_>) -> bool {
    match call.element {
        Some(Value::String(s)) => !s.starts_with('_'),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .all(|s| !s.starts_with('_')),
        _ => false,
    }
}
