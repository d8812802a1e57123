//! Managed document store bookkeeping
//!
//! A document store stamps its own fields onto every document (`_id`,
//! `_rev`, and the `_revisions` history). In managed-store mode these
//! allow-rules are appended to every at-most evaluation so caller policies
//! never have to mention them.

use crate::config::EngineConfig;
use crate::guide::{Guide, GONE, GREATER};
use crate::predicate::non_empty_array_predicate;
use crate::rule::Rule;
use crate::value::TypeTag;
use std::sync::LazyLock;

pub const FIELD_ID: &str = "_id";
pub const FIELD_REV: &str = "_rev";
pub const FIELD_REVISIONS: &str = "_revisions";
pub const FIELD_REVISIONS_START: &str = "_revisions.start";
pub const FIELD_REVISIONS_IDS: &str = "_revisions.ids";

/// Paths diffed as a single leaf in managed-store mode.
pub const OPAQUE_PATHS: &[&str] = &[FIELD_REVISIONS_IDS];

static BOOKKEEPING_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let string = || Guide::Type(TypeTag::String);
    let allow = |key: &str, from: Guide, to: Guide| Rule::unchecked(key, None, from, to);
    vec![
        allow(FIELD_ID, GONE, string()),
        allow(FIELD_ID, string(), string()),
        allow(FIELD_REV, GONE, string()),
        allow(FIELD_REV, string(), string()),
        allow(FIELD_REVISIONS, GONE, Guide::Type(TypeTag::Object)),
        allow(FIELD_REVISIONS_START, GONE, Guide::Type(TypeTag::Number)),
        allow(FIELD_REVISIONS_START, Guide::Type(TypeTag::Number), GREATER),
        allow(FIELD_REVISIONS_IDS, GONE, Guide::Type(TypeTag::Array)),
        allow(
            FIELD_REVISIONS_IDS,
            Guide::Type(TypeTag::Array),
            Guide::Predicate(non_empty_array_predicate()),
        ),
    ]
});

/// The fixed bookkeeping allow-rules.
pub fn bookkeeping_rules() -> &'static [Rule] {
    &BOOKKEEPING_RULES
}

/// Bookkeeping rules to append under `config`; empty unless managed-store mode is on.
pub fn injected_rules(config: &EngineConfig) -> &'static [Rule] {
    if config.managed_store {
        bookkeeping_rules()
    } else {
        &[]
    }
}

/// Whether a path belongs to the store's bookkeeping fields.
pub fn is_bookkeeping_path(path: &str) -> bool {
    BOOKKEEPING_RULES.iter().any(|rule| rule.key() == path)
}
