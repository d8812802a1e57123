//! Managed Store Tests
//!
//! This test suite verifies the document store bookkeeping rules: create,
//! update and replication writes pass with only the caller's rules once the
//! engine runs in managed-store mode, and fail without it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{doc, json_round_trip, managed_engine, plain_engine};
use objdiff_core::guide::GONE;
use objdiff_core::store::{self, FIELD_REVISIONS_IDS};
use objdiff_core::{Diff, Engine, ExErrorKind, Guide, Rule, Value};
use serde_json::{json, Value as Json};

struct StoreChange {
    kind: &'static str,
    old: Option<Json>,
    new: Json,
}

fn changes() -> Vec<StoreChange> {
    vec![
        StoreChange {
            kind: "create",
            old: None,
            new: json!({
                "_id": "mydoc",
                "val": "some value",
                "_revisions": {"start": 0, "ids": []}
            }),
        },
        StoreChange {
            kind: "update",
            old: Some(json!({
                "_id": "mydoc",
                "_rev": "1-5c5750951411b5634ed2c478956a7900",
                "val": "some value",
                "_revisions": {"start": 1, "ids": ["5c5750951411b5634ed2c478956a7900"]}
            })),
            new: json!({
                "_id": "mydoc",
                "_rev": "1-5c5750951411b5634ed2c478956a7900",
                "val": "new value",
                "_revisions": {"start": 1, "ids": ["5c5750951411b5634ed2c478956a7900"]}
            }),
        },
        StoreChange {
            kind: "replication",
            old: Some(json!({
                "_id": "mydoc",
                "_rev": "2-8d025da253fcf3927c0b81647dd4813a",
                "val": "new value",
                "_revisions": {
                    "start": 2,
                    "ids": ["8d025da253fcf3927c0b81647dd4813a", "5c5750951411b5634ed2c478956a7900"]
                }
            })),
            new: json!({
                "_id": "mydoc",
                "_rev": "4-2d88d505803f5b351e3b407dbf4ae873",
                "val": "fourth value",
                "_revisions": {
                    "start": 4,
                    "ids": [
                        "2d88d505803f5b351e3b407dbf4ae873",
                        "d9f55f665c2deccad2aa54b796014cf8",
                        "8d025da253fcf3927c0b81647dd4813a",
                        "5c5750951411b5634ed2c478956a7900"
                    ]
                }
            }),
        },
        StoreChange {
            kind: "replication to missing doc id",
            old: None,
            new: json!({
                "_id": "clean",
                "_rev": "3-1a5cf830ad65d6b8cc2963ab9ce0209b",
                "val": "third",
                "_revisions": {
                    "start": 3,
                    "ids": [
                        "1a5cf830ad65d6b8cc2963ab9ce0209b",
                        "32ca7d6ad69aeeae5842dc68e9b959f3",
                        "53f08fe3baccc045611cf9e3809981f3"
                    ]
                }
            }),
        },
    ]
}

impl StoreChange {
    fn diff(&self, engine: &Engine) -> Diff {
        let old = self.old.as_ref().map(|old| doc(old.clone()));
        engine
            .diff_documents(old.as_ref(), &doc(self.new.clone()))
            .unwrap()
    }

    /// The caller's allow-rule for `val`.
    fn val_rule(&self) -> Rule {
        let from: Guide = match &self.old {
            Some(old) => Value::from_json(&old["val"]).into(),
            None => GONE,
        };
        Rule::new("val", from, Value::from_json(&self.new["val"])).unwrap()
    }
}

#[test]
fn test_store_changes_pass_with_only_caller_rules() {
    let engine = managed_engine();
    for change in changes() {
        let d = change.diff(&engine);
        let rules = [change.val_rule()];
        assert!(d.at_most(&rules), "{} passes: {}", change.kind, d.to_wire());
        assert!(d.assert_at_most(&rules).is_ok(), "{} asserts", change.kind);
    }
}

#[test]
fn test_store_changes_fail_with_unrelated_rule() {
    let engine = managed_engine();
    let rules = [Rule::new("otherval", "should", "fail").unwrap()];
    for change in changes() {
        let d = change.diff(&engine);
        assert!(!d.at_most(&rules), "{} fails normally", change.kind);
        let err = d.assert_at_most(&rules).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::PolicyViolation);
        assert_eq!(err.key(), Some("val"), "{}", change.kind);
    }
}

#[test]
fn test_replication_fails_without_managed_store() {
    let engine = plain_engine();
    let replication = changes()
        .into_iter()
        .find(|c| c.kind == "replication")
        .unwrap();
    let d = replication.diff(&engine);
    assert!(!d.at_most(&[replication.val_rule()]));
    assert!(d.get("_revisions.ids[2]").is_some());
}

#[test]
fn test_plain_engine_rejects_missing_old_document() {
    let create = changes().into_iter().next().unwrap();
    let err = plain_engine()
        .diff_documents(None, &doc(create.new))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
}

#[test]
fn test_create_diff_shape() {
    let create = changes().into_iter().next().unwrap();
    let d = create.diff(&managed_engine());
    assert_eq!(d.paths().collect::<Vec<_>>(), vec!["_id", "_revisions", "val"]);
}

#[test]
fn test_revision_ids_diffed_as_one_leaf() {
    let replication = changes()
        .into_iter()
        .find(|c| c.kind == "replication")
        .unwrap();
    let d = replication.diff(&managed_engine());
    assert_eq!(
        d.paths().collect::<Vec<_>>(),
        vec!["_rev", "_revisions.ids", "_revisions.start", "val"]
    );
    assert!(store::is_bookkeeping_path(FIELD_REVISIONS_IDS));
    assert!(!store::is_bookkeeping_path("val"));
}

#[test]
fn test_revision_start_must_increase() {
    let engine = managed_engine();
    let d = engine
        .diff(
            &doc(json!({"_revisions": {"start": 4, "ids": ["a"]}})),
            &doc(json!({"_revisions": {"start": 3, "ids": ["a"]}})),
        )
        .unwrap();
    assert!(!d.no_change());
    assert_eq!(d.assert_no_change().unwrap_err().key(), Some("_revisions.start"));
}

#[test]
fn test_revision_ids_must_stay_non_empty() {
    let engine = managed_engine();
    let d = engine
        .diff(
            &doc(json!({"_revisions": {"start": 1, "ids": ["a"]}})),
            &doc(json!({"_revisions": {"start": 1, "ids": []}})),
        )
        .unwrap();
    assert!(!d.no_change());
}

#[test]
fn test_bookkeeping_rules_do_not_satisfy_at_least() {
    let engine = managed_engine();
    let create = changes().into_iter().next().unwrap();
    let d = create.diff(&engine);
    assert!(d.at_least(&[create.val_rule()]));
    assert!(!d.at_least(&[Rule::new("_rev", GONE, "1-x").unwrap()]));
}

#[test]
fn test_managed_store_from_config_file() {
    let config = objdiff_core::EngineConfig::from_toml_str("managed_store = true\n").unwrap();
    let engine = Engine::new(config);
    let update = changes().into_iter().nth(1).unwrap();
    let d = update.diff(&engine);
    assert!(d.at_most(&[update.val_rule()]));
}

#[test]
fn test_managed_diff_keeps_verdict_through_json() {
    let engine = managed_engine();
    let d = engine
        .diff(
            &doc(json!({"_id": "mydoc", "_rev": "1-a", "val": "x"})),
            &doc(json!({"_id": "mydoc", "_rev": "2-b", "val": "y"})),
        )
        .unwrap();
    let rules = [Rule::new("val", "x", "y").unwrap()];
    assert!(d.at_most(&rules));

    let back = json_round_trip(&engine, &d);
    assert_eq!(back, d);
    assert_eq!(back.config(), d.config());
    assert!(back.at_most(&rules));

    let plain = json_round_trip(&plain_engine(), &d);
    assert!(!plain.at_most(&rules));
}
