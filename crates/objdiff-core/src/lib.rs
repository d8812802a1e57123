//! objdiff core - structural document diffs judged against change policies
//!
//! This crate provides:
//! - A closed value model and type classifier
//! - A recursive differ producing flat dotted/bracketed change paths
//! - Guides (literals, type tags, patterns, sentinels, named predicates) and rules
//! - At-most / at-least / no-change policy evaluation with assertion forms
//! - A tagged wire codec for values, diffs, rules and policies
//! - Managed-store bookkeeping rules for document database validation hooks
//!
//! ```
//! use objdiff_core::guide::GONE;
//! use objdiff_core::{Engine, EngineConfig, Rule, TypeTag, Value};
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let diff = engine
//!     .diff(
//!         &Value::from_json(&json!({})),
//!         &Value::from_json(&json!({"name": "bob"})),
//!     )
//!     .unwrap();
//! let rules = [Rule::new("name", GONE, TypeTag::String).unwrap()];
//! assert!(diff.at_most(&rules));
//! assert!(diff.assert_no_change().is_err());
//! ```

pub mod codec;
pub mod config;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod guide;
pub mod logging_facility;
pub mod policy;
pub mod predicate;
pub mod rule;
pub mod store;
pub mod value;

pub use objdiff_core_types as core_types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use diff::{Change, Diff};
pub use engine::Engine;
pub use errors::{DiffError, ExError, ExErrorKind, Result};
pub use guide::{Guide, Sentinel};
pub use policy::{Policy, Query};
pub use predicate::{PredicateCall, PredicateRegistry};
pub use rule::Rule;
pub use value::{Pattern, TypeTag, Value};
