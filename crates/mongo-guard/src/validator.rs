//! Filter and update validation
//!
//! Sanitizes first, then walks the sanitized tree classifying every mapping
//! key. Every violation is collected; the walk never stops early.

use crate::errors::{PathSegment, ValidationOutcome, Violation, ViolationKind, Violations};
use crate::operators::{classify, OperatorClass};
use crate::policy::Policy;
use crate::sanitizer::sanitize;
use crate::value::Value;

/// Validate a query filter, update document or inserted document
///
/// An empty mapping is always valid. A top-level value that is not a mapping
/// is `MalformedInput`. Structural failures (depth, size, key characters)
/// stop validation before any operator is classified.
pub fn validate_document(doc: &Value, policy: &Policy) -> ValidationOutcome {
    if !doc.is_object() {
        return Violation::malformed(
            Vec::new(),
            format!("expected an object, got {}", doc.type_name()),
        )
        .into();
    }

    let sanitized = match sanitize(doc, policy.limits()) {
        Ok(sanitized) => sanitized,
        Err(violation) => return violation.into(),
    };

    let mut violations = Violations::new();
    let mut path = Vec::new();
    check_operators(&sanitized, policy, &mut path, &mut violations);

    ValidationOutcome::from_parts(sanitized, violations)
}

/// Depth-first operator check over an already-sanitized tree
///
/// Recursion depth is bounded by the sanitizer that produced `value`.
pub(crate) fn check_operators(
    value: &Value,
    policy: &Policy,
    path: &mut Vec<PathSegment>,
    violations: &mut Violations,
) {
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                path.push(PathSegment::Key(key.clone()));
                let class = classify(key, policy);
                if !class.is_permitted(policy.dangerous_mode()) {
                    violations.add(disallowed_operator(key, class, path));
                }
                check_operators(child, policy, path, violations);
                path.pop();
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                check_operators(item, policy, path, violations);
                path.pop();
            }
        }
        _ => {}
    }
}

fn disallowed_operator(key: &str, class: OperatorClass, path: &[PathSegment]) -> Violation {
    let message = match class {
        OperatorClass::Dangerous => format!("operator '{}' is denied in every mode", key),
        _ => format!("operator '{}' is not allowed in safe mode", key),
    };
    Violation::new(ViolationKind::DisallowedOperator, path.to_vec(), message).with_operator(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(doc: serde_json::Value, policy: &Policy) -> ValidationOutcome {
        validate_document(&Value::from(doc), policy)
    }

    #[test]
    fn test_simple_filter_is_valid() {
        let doc = json!({"status": "active", "age": {"$gte": 18, "$lt": 65}});
        let outcome = validate(doc.clone(), &Policy::safe());
        assert_eq!(outcome, ValidationOutcome::Valid(Value::from(doc)));
    }

    #[test]
    fn test_empty_document_is_valid() {
        assert!(validate(json!({}), &Policy::safe()).is_valid());
    }

    #[test]
    fn test_non_object_is_malformed() {
        for doc in [json!([]), json!("x"), json!(null), json!(3)] {
            let outcome = validate(doc, &Policy::safe());
            let violations = outcome.violations().unwrap();
            assert_eq!(violations.kinds(), vec![ViolationKind::MalformedInput]);
        }
    }

    #[test]
    fn test_nested_where_in_or() {
        let doc = json!({"$or": [{"a": 1}, {"$where": "sleep(1000)"}]});
        let outcome = validate(doc, &Policy::safe());
        let violations = outcome.violations().unwrap();
        assert_eq!(violations.len(), 1);
        let v = &violations.as_slice()[0];
        assert_eq!(v.kind, ViolationKind::DisallowedOperator);
        assert_eq!(v.operator.as_deref(), Some("$where"));
        assert_eq!(
            v.path,
            vec![
                PathSegment::key("$or"),
                PathSegment::Index(1),
                PathSegment::key("$where"),
            ]
        );
    }

    #[test]
    fn test_denied_operator_in_dangerous_mode() {
        let doc = json!({"$expr": {"$function": {"body": "x", "args": [], "lang": "js"}}});
        let outcome = validate(doc, &Policy::dangerous());
        let violations = outcome.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations.as_slice()[0].message.contains("every mode"));
    }

    #[test]
    fn test_unknown_operator_only_denied_in_safe_mode() {
        let doc = json!({"field": {"$notARealOperator": 1}});
        assert!(!validate(doc.clone(), &Policy::safe()).is_valid());
        assert!(validate(doc, &Policy::dangerous()).is_valid());
    }

    #[test]
    fn test_collects_all_violations_in_order() {
        let doc = json!({
            "$where": "1",
            "a": {"$function": {}},
            "b": [{"$text": {"$search": "x"}}]
        });
        let outcome = validate(doc, &Policy::safe());
        let operators: Vec<_> = outcome
            .violations()
            .unwrap()
            .iter()
            .map(|v| v.operator.clone().unwrap_or_default())
            .collect();
        assert_eq!(operators, vec!["$where", "$function", "$text", "$search"]);
    }

    #[test]
    fn test_update_document() {
        let update = json!({"$set": {"status": "archived"}, "$inc": {"views": 1}});
        assert!(validate(update, &Policy::safe()).is_valid());
    }

    #[test]
    fn test_extended_json_literals_allowed() {
        let doc = json!({"_id": {"$oid": "507f1f77bcf86cd799439011"}, "at": {"$gt": {"$date": "2024-01-01T00:00:00Z"}}});
        assert!(validate(doc, &Policy::safe()).is_valid());
    }

    #[test]
    fn test_sanitized_output_is_forwarded() {
        let outcome = validate(json!({"name": "bob\u{0000}"}), &Policy::safe());
        assert_eq!(
            outcome,
            ValidationOutcome::Valid(Value::from(json!({"name": "bob"})))
        );
    }

    #[test]
    fn test_structural_failure_stops_classification() {
        let policy = Policy::resolve(&crate::PolicyConfig {
            max_string_length: 3,
            ..Default::default()
        });
        let outcome = validate(json!({"$where": "long string"}), &policy);
        assert_eq!(
            outcome.violations().unwrap().kinds(),
            vec![ViolationKind::SizeExceeded]
        );
    }
}
