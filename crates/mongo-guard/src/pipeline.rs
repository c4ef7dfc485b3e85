//! Aggregation pipeline validation

use crate::errors::{PathSegment, ValidationOutcome, Violation, ViolationKind, Violations};
use crate::operators::{classify_stage, is_operator_key, StageVerdict};
use crate::policy::Policy;
use crate::sanitizer::Sanitizer;
use crate::validator::check_operators;
use crate::value::Value;

/// Validate an aggregation pipeline
///
/// The stage count is checked before anything else. Every stage then shares
/// one sanitizer, so the node budget bounds the pipeline as a whole.
/// Violations from all stages are aggregated, each path starting with the
/// stage index.
pub fn validate_pipeline(stages: &Value, policy: &Policy) -> ValidationOutcome {
    let Some(stages) = stages.as_list() else {
        return Violation::malformed(
            Vec::new(),
            format!("pipeline must be an array, got {}", stages.type_name()),
        )
        .into();
    };

    if stages.len() > policy.max_pipeline_stages() {
        return Violation::new(
            ViolationKind::PipelineTooLong,
            Vec::new(),
            format!(
                "pipeline has {} stages, maximum is {}",
                stages.len(),
                policy.max_pipeline_stages()
            ),
        )
        .into();
    }

    let mut sanitizer = Sanitizer::new(policy.limits());
    let mut violations = Violations::new();
    let mut sanitized = Vec::with_capacity(stages.len());

    for (index, stage) in stages.iter().enumerate() {
        let clean = match sanitizer.sanitize(stage) {
            Ok(clean) => clean,
            Err(violation) => {
                violations.add(violation.prefixed([PathSegment::Index(index)]));
                continue;
            }
        };
        check_stage(&clean, index, policy, &mut violations);
        sanitized.push(clean);
    }

    ValidationOutcome::from_parts(Value::List(sanitized), violations)
}

fn check_stage(stage: &Value, index: usize, policy: &Policy, violations: &mut Violations) {
    let mut path = vec![PathSegment::Index(index)];

    let (name, body) = match stage.as_object() {
        Some([(name, body)]) => (name, body),
        Some(entries) => {
            violations.add(Violation::malformed(
                path,
                format!("stage must have exactly one key, found {}", entries.len()),
            ));
            return;
        }
        None => {
            violations.add(Violation::malformed(
                path,
                format!("stage must be an object, got {}", stage.type_name()),
            ));
            return;
        }
    };

    path.push(PathSegment::Key(name.clone()));

    if !is_operator_key(name) {
        violations.add(Violation::malformed(
            path,
            format!("'{}' is not a stage name", name),
        ));
        return;
    }

    if classify_stage(name, policy) == StageVerdict::Denied {
        violations.add(
            Violation::new(
                ViolationKind::DisallowedStage,
                path.clone(),
                format!("stage '{}' is not allowed", name),
            )
            .with_operator(name.as_str()),
        );
    }

    check_operators(body, policy, &mut path, violations);
}
