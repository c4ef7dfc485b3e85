//! Structural sanitizer
//!
//! Walks any [`Value`] and produces a cleaned copy, knowing nothing about
//! MongoDB. It enforces three bounds so that later stages only ever see
//! small, shallow trees:
//!
//! - nesting depth (the root container is depth 1)
//! - total node count across the traversal
//! - string and key length
//!
//! Control characters are stripped from string scalars. Mapping keys are
//! structure rather than data, so a key carrying a control character is
//! rejected instead of rewritten.

use crate::errors::{PathSegment, Violation, ViolationKind};
use crate::value::Value;

/// Default maximum nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Default maximum number of nodes in one request
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Default maximum length (in characters) of a string scalar or key
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1_000;

/// Structural bounds applied by the sanitizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_string_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
        }
    }
}

/// Characters stripped from string scalars: C0 controls except tab, LF, CR; and DEL
pub fn is_stripped_control(c: char) -> bool {
    (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Remove stripped control characters from a string
pub fn strip_control_chars(s: &str) -> String {
    s.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Depth- and size-bounded sanitizer
///
/// The node budget is shared by every call made on one instance, so a
/// pipeline can run all of its stages through a single sanitizer and be
/// bounded as a whole.
#[derive(Debug)]
pub struct Sanitizer {
    limits: Limits,
    nodes: usize,
}

impl Sanitizer {
    pub fn new(limits: Limits) -> Self {
        Self { limits, nodes: 0 }
    }

    /// Nodes visited so far across all calls
    pub fn nodes_seen(&self) -> usize {
        self.nodes
    }

    /// Sanitize one tree, failing fast on the first bound that is crossed
    pub fn sanitize(&mut self, value: &Value) -> Result<Value, Violation> {
        let mut path = Vec::new();
        self.visit(value, 0, &mut path)
    }

    fn visit(
        &mut self,
        value: &Value,
        depth: usize,
        path: &mut Vec<PathSegment>,
    ) -> Result<Value, Violation> {
        self.count_node(path)?;

        match value {
            Value::String(s) => {
                self.check_length(s, path)?;
                Ok(Value::String(strip_control_chars(s)))
            }
            Value::List(items) => {
                let depth = self.descend(depth, path)?;
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    out.push(self.visit(item, depth, path)?);
                    path.pop();
                }
                Ok(Value::List(out))
            }
            Value::Object(entries) => {
                let depth = self.descend(depth, path)?;
                let mut out = Vec::with_capacity(entries.len());
                for (key, child) in entries {
                    path.push(PathSegment::Key(key.clone()));
                    self.check_key(key, path)?;
                    out.push((key.clone(), self.visit(child, depth, path)?));
                    path.pop();
                }
                Ok(Value::Object(out))
            }
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        }
    }

    fn descend(&self, depth: usize, path: &[PathSegment]) -> Result<usize, Violation> {
        let next = depth + 1;
        if next > self.limits.max_depth {
            return Err(Violation::depth_exceeded(
                path.to_vec(),
                self.limits.max_depth,
            ));
        }
        Ok(next)
    }

    fn count_node(&mut self, path: &[PathSegment]) -> Result<(), Violation> {
        self.nodes += 1;
        if self.nodes > self.limits.max_nodes {
            return Err(Violation::new(
                ViolationKind::SizeExceeded,
                path.to_vec(),
                format!("input exceeds maximum of {} nodes", self.limits.max_nodes),
            ));
        }
        Ok(())
    }

    fn check_length(&self, s: &str, path: &[PathSegment]) -> Result<(), Violation> {
        // Byte length bounds char count from above; skip the count when it can't matter
        if s.len() > self.limits.max_string_length
            && s.chars().count() > self.limits.max_string_length
        {
            return Err(Violation::new(
                ViolationKind::SizeExceeded,
                path.to_vec(),
                format!(
                    "string exceeds maximum length {}",
                    self.limits.max_string_length
                ),
            ));
        }
        Ok(())
    }

    fn check_key(&self, key: &str, path: &[PathSegment]) -> Result<(), Violation> {
        self.check_length(key, path)?;
        if key.chars().any(|c| c.is_ascii_control()) {
            return Err(Violation::new(
                ViolationKind::InvalidCharacter,
                path.to_vec(),
                "key contains control characters",
            ));
        }
        Ok(())
    }
}

/// Sanitize a single tree with a fresh node budget
pub fn sanitize(value: &Value, limits: Limits) -> Result<Value, Violation> {
    Sanitizer::new(limits).sanitize(value)
}
