//! Structural document differ.
//!
//! ## Entry point
//!
//! ```
//! use objdiff_core::config::EngineConfig;
//! use objdiff_core::diff::compute_diff;
//! use objdiff_core::value::Value;
//! use serde_json::json;
//!
//! let a = Value::from_json(&json!({"a": {"b": {"c": false}}}));
//! let b = Value::from_json(&json!({"a": {"b": {"c": true}}}));
//! let diff = compute_diff(&a, &b, EngineConfig::default()).unwrap();
//! assert!(diff.get("a.b.c").is_some());
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: the same pair of documents always yields the same diff,
//!   iterated in path order.
//! - **Leaf paths**: structurally identical subtrees never appear; a change
//!   deep in a tree is keyed by its full dotted/bracketed path.
//! - **No no-op changes**: `from` and `to` of every change differ.

pub mod engine;
pub mod model;
pub mod summary;

pub use engine::{compute_diff, OpaquePaths};
pub use model::{Change, Diff, Field};
pub use summary::render_human_summary;
