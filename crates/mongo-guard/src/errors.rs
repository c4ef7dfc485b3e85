//! Violation types
//!
//! Every rejection produced by this crate is a [`Violation`]: a kind from a
//! closed taxonomy, the path to the offending node and, where one is
//! involved, the operator or stage name. A validation call collects all of
//! them into [`Violations`] so a caller can fix every problem in one round
//! trip.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

// ============================================================================
// Violation Kind
// ============================================================================

/// Classification of validation failures
///
/// All kinds are deterministic and local: re-running validation on the same
/// input yields the same kind, so none of them is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Nesting deeper than the configured maximum
    DepthExceeded,
    /// Too many nodes, or a string/key longer than allowed
    SizeExceeded,
    /// Control character in a mapping key
    InvalidCharacter,
    /// Operator key rejected by the active policy
    DisallowedOperator,
    /// Aggregation stage not in the allowed set
    DisallowedStage,
    /// More pipeline stages than allowed
    PipelineTooLong,
    /// Wrong shape (non-mapping filter, multi-key stage, bad name...)
    MalformedInput,
    /// Write-shaped operation while dangerous mode is off
    WriteDisabled,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExceeded => write!(f, "depth_exceeded"),
            Self::SizeExceeded => write!(f, "size_exceeded"),
            Self::InvalidCharacter => write!(f, "invalid_character"),
            Self::DisallowedOperator => write!(f, "disallowed_operator"),
            Self::DisallowedStage => write!(f, "disallowed_stage"),
            Self::PipelineTooLong => write!(f, "pipeline_too_long"),
            Self::MalformedInput => write!(f, "malformed_input"),
            Self::WriteDisabled => write!(f, "write_disabled"),
        }
    }
}

// ============================================================================
// Path
// ============================================================================

/// One step in the path to a node: a mapping key or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Render a path as `a.b[2].$gt`; the empty path renders as `<root>`
pub fn format_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }

    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{}]", index));
            }
        }
    }
    out
}

// ============================================================================
// Single Violation
// ============================================================================

/// A single recorded reason a document failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Error type classification
    pub kind: ViolationKind,

    /// Location of the offending node
    pub path: Vec<PathSegment>,

    /// Operator or stage name involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Human-readable error message
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(kind: ViolationKind, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            operator: None,
            message: message.into(),
        }
    }

    /// Attach the operator or stage name
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Prepend segments to the path (e.g. the stage index of a pipeline)
    pub fn prefixed(mut self, prefix: impl IntoIterator<Item = PathSegment>) -> Self {
        let mut path: Vec<PathSegment> = prefix.into_iter().collect();
        path.append(&mut self.path);
        self.path = path;
        self
    }

    pub fn malformed(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::MalformedInput, path, message)
    }

    pub fn depth_exceeded(path: Vec<PathSegment>, max_depth: usize) -> Self {
        Self::new(
            ViolationKind::DepthExceeded,
            path,
            format!("structure exceeds maximum depth {}", max_depth),
        )
    }

    /// Render the path as a display string
    pub fn location(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.location(), self.message, self.kind)
    }
}

impl std::error::Error for Violation {}

// ============================================================================
// Violations Collection
// ============================================================================

/// Ordered collection of violations from one validation call
///
/// Ordering is depth-first in key-insertion order, so it is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Check if there are any violations
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Get the number of violations
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Add a violation to the collection
    pub fn add(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Merge another collection into this one, keeping order
    pub fn merge(&mut self, other: Violations) {
        self.violations.extend(other.violations);
    }

    /// Get violations as a slice
    pub fn as_slice(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Prepend the same segment to every path (e.g. the argument name)
    pub fn prefixed(self, segment: PathSegment) -> Self {
        self.into_iter()
            .map(|v| v.prefixed([segment.clone()]))
            .collect()
    }

    /// Kinds in order, handy for assertions and logging
    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.violations.iter().map(|v| v.kind).collect()
    }

    /// Convert to Result - Ok if empty, Err otherwise
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Violation> for Violations {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl FromIterator<Violation> for Violations {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation violation(s)", self.violations.len())?;
        for (i, violation) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

// ============================================================================
// Validation Outcome
// ============================================================================

/// Result of validating one filter, update, document or pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Input accepted; carries the sanitized tree to forward to the driver
    Valid(Value),
    /// Input rejected with every violation found
    Invalid(Violations),
}

impl ValidationOutcome {
    /// Valid when no violations were recorded
    pub fn from_parts(sanitized: Value, violations: Violations) -> Self {
        if violations.is_empty() {
            Self::Valid(sanitized)
        } else {
            Self::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Violations, if the outcome is invalid
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(violations) => Some(violations),
        }
    }

    pub fn into_result(self) -> Result<Value, Violations> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(violations) => Err(violations),
        }
    }
}

impl From<Violation> for ValidationOutcome {
    fn from(violation: Violation) -> Self {
        Self::Invalid(violation.into())
    }
}
