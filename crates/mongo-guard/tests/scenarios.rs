//! End-to-end behaviour of the guard on representative agent input
//!
//! Covers safe and dangerous mode, the absolute deny list, structural
//! limits, the write gate and violation ordering.

use mongo_guard::{
    validate_document, validate_pipeline, Operation, PathSegment, Policy, PolicyConfig,
    ValidationOutcome, Value, ViolationKind,
};
use serde_json::json;

fn doc(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn nested_filter(levels: usize) -> Value {
    let mut value = doc(json!({"$eq": 1}));
    for i in 0..levels {
        value = Value::Object(vec![(format!("f{}", i), value)]);
    }
    value
}

#[test]
fn test_comparison_filter_passes_unmodified() {
    let filter = doc(json!({"price": {"$gt": 100}}));
    let outcome = validate_document(&filter, &Policy::safe());
    assert_eq!(outcome, ValidationOutcome::Valid(filter));
}

#[test]
fn test_where_rejected_in_safe_mode() {
    let filter = doc(json!({"$where": "this.price > 100"}));
    let outcome = validate_document(&filter, &Policy::safe());

    let violations = outcome.violations().expect("should be invalid");
    assert_eq!(violations.len(), 1);
    let violation = &violations.as_slice()[0];
    assert_eq!(violation.kind, ViolationKind::DisallowedOperator);
    assert_eq!(violation.path, vec![PathSegment::key("$where")]);
    assert_eq!(violation.operator.as_deref(), Some("$where"));
}

#[test]
fn test_where_accepted_in_dangerous_mode() {
    let filter = doc(json!({"$where": "this.price > 100"}));
    let outcome = validate_document(&filter, &Policy::dangerous());
    assert_eq!(outcome, ValidationOutcome::Valid(filter));
}

#[test]
fn test_out_stage_rejected_in_dangerous_mode() {
    let pipeline = doc(json!([
        {"$match": {"status": "active"}},
        {"$out": "other_collection"}
    ]));
    let outcome = validate_pipeline(&pipeline, &Policy::dangerous());

    let violations = outcome.violations().expect("should be invalid");
    assert_eq!(violations.kinds(), vec![ViolationKind::DisallowedStage]);
    assert_eq!(
        violations.as_slice()[0].path,
        vec![PathSegment::Index(1), PathSegment::key("$out")]
    );
}

#[test]
fn test_merge_stage_rejected_in_both_modes() {
    let pipeline = doc(json!([{"$merge": {"into": "elsewhere"}}]));
    for policy in [Policy::safe(), Policy::dangerous()] {
        let outcome = validate_pipeline(&pipeline, &policy);
        assert_eq!(
            outcome.violations().unwrap().kinds(),
            vec![ViolationKind::DisallowedStage]
        );
    }
}

#[test]
fn test_deep_filter_rejected_before_classification() {
    let policy = Policy::resolve(&PolicyConfig {
        max_depth: 20,
        ..Default::default()
    });

    // 50 levels, with a disallowed operator at the bottom that must not be reported
    let mut filter = doc(json!({"$where": "1"}));
    for i in 0..50 {
        filter = Value::Object(vec![(format!("f{}", i), filter)]);
    }

    let outcome = validate_document(&filter, &policy);
    assert_eq!(
        outcome.violations().unwrap().kinds(),
        vec![ViolationKind::DepthExceeded]
    );
}

#[test]
fn test_insert_blocked_at_gate_in_safe_mode() {
    let policy = Policy::safe();
    let err = policy
        .authorize(Operation::InsertDocument)
        .expect_err("insert must be gated");
    assert_eq!(err.kind, ViolationKind::WriteDisabled);
}

#[test]
fn test_every_write_gated_in_safe_mode() {
    let policy = Policy::safe();
    for op in [
        Operation::InsertDocument,
        Operation::UpdateDocument,
        Operation::DeleteDocument,
        Operation::CreateIndex,
    ] {
        assert_eq!(
            policy.authorize(op).unwrap_err().kind,
            ViolationKind::WriteDisabled
        );
    }
}

#[test]
fn test_depth_limit_boundary() {
    let policy = Policy::safe();
    // 19 wrappers around {"$eq": 1} is 20 nested objects
    assert!(validate_document(&nested_filter(19), &policy).is_valid());
    assert!(!validate_document(&nested_filter(20), &policy).is_valid());
}

#[test]
fn test_all_violations_reported() {
    let filter = doc(json!({
        "$where": "sleep(100)",
        "name": {"$regex": "^a", "$options": "i"},
        "profile": {"$expr": {"$gt": ["$a", "$b"]}},
        "tags": {"$in": ["x", {"$function": {"body": "f", "args": [], "lang": "js"}}]},
        "$or": [{"age": {"$gte": 18}}, {"$jsonSchema": {}}]
    }));
    let outcome = validate_document(&filter, &Policy::safe());
    let locations: Vec<String> = outcome
        .violations()
        .unwrap()
        .iter()
        .map(|v| v.location())
        .collect();
    assert_eq!(
        locations,
        vec![
            "$where",
            "profile.$expr",
            "tags.$in[1].$function",
            "$or[1].$jsonSchema",
        ]
    );
}

#[test]
fn test_violation_order_is_reproducible() {
    let pipeline = doc(json!([
        {"$match": {"$where": "1", "b": {"$text": {}}}},
        {"$unknownStage": {}},
        {"$project": {"$function": 1}}
    ]));
    let policy = Policy::safe();
    let first = validate_pipeline(&pipeline, &policy);
    let second = validate_pipeline(&pipeline, &policy);
    assert_eq!(first, second);
    assert_eq!(
        first.violations().unwrap().kinds(),
        vec![
            ViolationKind::DisallowedOperator,
            ViolationKind::DisallowedOperator,
            ViolationKind::DisallowedStage,
            ViolationKind::DisallowedOperator,
        ]
    );
}

#[test]
fn test_violations_serialize_for_the_caller() {
    let outcome = validate_document(&doc(json!({"a": {"$where": "1"}})), &Policy::safe());
    let json = serde_json::to_value(outcome.violations().unwrap()).unwrap();
    assert_eq!(
        json,
        json!([{
            "kind": "disallowed_operator",
            "path": ["a", "$where"],
            "operator": "$where",
            "message": "operator '$where' is not allowed in safe mode"
        }])
    );
}

#[test]
fn test_lookup_sub_pipeline() {
    let pipeline = doc(json!([{"$lookup": {
        "from": "orders",
        "let": {"uid": "$_id"},
        "pipeline": [{"$match": {"$expr": {"$eq": ["$user", "$$uid"]}}}],
        "as": "orders"
    }}]));
    // $expr is mode-gated
    assert!(!validate_pipeline(&pipeline, &Policy::safe()).is_valid());
    assert!(validate_pipeline(&pipeline, &Policy::dangerous()).is_valid());
}
