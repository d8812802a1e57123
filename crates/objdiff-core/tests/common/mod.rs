use objdiff_core::{Diff, Engine, EngineConfig, Guide, Rule, Value};
use serde_json::{json, Value as Json};

/// Build a document value from a JSON fixture
#[allow(dead_code)]
pub fn doc(json: Json) -> Value {
    Value::from_json(&json)
}

/// An engine with default configuration and the built-in predicates
#[allow(dead_code)]
pub fn plain_engine() -> Engine {
    Engine::new(EngineConfig::default())
}

/// An engine that injects document store bookkeeping rules
#[allow(dead_code)]
pub fn managed_engine() -> Engine {
    Engine::new(EngineConfig::new().with_managed_store(true))
}

/// Diff two JSON fixtures with the plain engine
#[allow(dead_code)]
pub fn diff(from: Json, to: Json) -> Diff {
    plain_engine()
        .diff(&doc(from), &doc(to))
        .expect("fixtures are mappings")
}

/// Send a diff through its JSON text form and back through `engine`
#[allow(dead_code)]
pub fn json_round_trip(engine: &Engine, diff: &Diff) -> Diff {
    let text = serde_json::to_string(diff).expect("diff serializes");
    let wire: Json = serde_json::from_str(&text).expect("wire parses");
    engine.decode_diff(&wire).expect("diff decodes")
}

/// Check a single rule against the single change between two fixtures.
///
/// The diff and the rule both go through the wire format first so every
/// case also exercises storage round-trips.
#[allow(dead_code)]
pub fn rule_matches(
    from: Json,
    to: Json,
    key: &str,
    from_guide: impl Into<Guide>,
    to_guide: impl Into<Guide>,
) -> bool {
    rule_matches_with(&plain_engine(), &doc(from), &doc(to), key, from_guide, to_guide)
}

/// [`rule_matches`] over prepared values with a caller-supplied engine
#[allow(dead_code)]
pub fn rule_matches_with(
    engine: &Engine,
    from: &Value,
    to: &Value,
    key: &str,
    from_guide: impl Into<Guide>,
    to_guide: impl Into<Guide>,
) -> bool {
    let original = engine.diff(from, to).expect("fixtures are mappings");
    let diff = json_round_trip(engine, &original);
    assert_eq!(diff, original, "diff JSON round-trip: {}", original.to_wire());
    assert_eq!(
        diff.len(),
        1,
        "rule fixtures should have exactly one change: {}",
        diff.to_wire()
    );

    let rule = Rule::new(key, from_guide, to_guide).expect("valid rule");
    let decoded = engine.decode_rule(&rule.to_wire()).expect("rule decodes");
    assert_eq!(decoded, rule, "rule JSON round-trip: {}", rule.to_wire());

    let (path, change) = diff.iter().next().expect("one change");
    decoded.matches(path, change.from(), change.to())
}

/// The standard server document used by policy fixtures, with `extra`
/// merged in (mappings merge recursively, anything else replaces).
#[allow(dead_code)]
pub fn server(extra: Json) -> Json {
    let mut base = json!({
        "_id": "Server/foo",
        "_rev": "1-blah",
        "state": "transfer",
        "transfer": {"to": "Manager/somebody"},
        "backups": [
            {"ok": true, "date": "2011-11-13T02:03:08.971Z"},
            {"ok": false, "date": "2011-10-13T02:03:08.971Z"}
        ]
    });
    merge(&mut base, extra);
    base
}

fn merge(base: &mut Json, extra: Json) {
    match (base, extra) {
        (Json::Object(base), Json::Object(extra)) => {
            for (key, value) in extra {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, extra) => *base = extra,
    }
}
