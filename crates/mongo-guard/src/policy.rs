//! Validation policy
//!
//! A [`Policy`] is built once at startup from a [`PolicyConfig`] and never
//! changes afterwards. Share it behind an `Arc`; every accessor takes `&self`.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::operators::{
    DENIED_OPERATORS, DENIED_STAGES, MODE_GATED_OPERATORS, MODE_GATED_STAGES,
    SAFE_OPERATOR_SET, SAFE_STAGES,
};
use crate::sanitizer::{Limits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DEFAULT_MAX_STRING_LENGTH};

/// Default maximum number of aggregation stages
pub const DEFAULT_MAX_PIPELINE_STAGES: usize = 20;

/// Default maximum number of documents returned by one call
pub const DEFAULT_MAX_DOCUMENTS: usize = 1_000;

/// Raw policy settings, as read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Enables writes and the mode-gated operators/stages
    pub dangerous_mode: bool,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_string_length: usize,
    pub max_pipeline_stages: usize,
    pub max_documents: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dangerous_mode: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_pipeline_stages: DEFAULT_MAX_PIPELINE_STAGES,
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }
}

/// Immutable, process-wide validation policy
#[derive(Debug, Clone)]
pub struct Policy {
    allowed_operators: HashSet<String>,
    denied_operators: HashSet<String>,
    allowed_stages: HashSet<String>,
    dangerous_mode: bool,
    limits: Limits,
    max_pipeline_stages: usize,
    max_documents: usize,
}

impl Policy {
    /// Build the active policy from raw settings
    ///
    /// Dangerous mode adds the mode-gated operators and stages to the allowed
    /// sets. The deny lists are the same in both modes and always win.
    pub fn resolve(config: &PolicyConfig) -> Self {
        let denied_operators: HashSet<String> =
            DENIED_OPERATORS.iter().map(|s| s.to_string()).collect();

        let mut allowed_operators: HashSet<String> =
            SAFE_OPERATOR_SET.iter().map(|s| s.to_string()).collect();
        let mut allowed_stages: HashSet<String> =
            SAFE_STAGES.iter().map(|s| s.to_string()).collect();

        if config.dangerous_mode {
            allowed_operators.extend(MODE_GATED_OPERATORS.iter().map(|s| s.to_string()));
            allowed_operators.extend(MODE_GATED_STAGES.iter().map(|s| s.to_string()));
            allowed_stages.extend(MODE_GATED_STAGES.iter().map(|s| s.to_string()));
        }

        allowed_operators.retain(|op| !denied_operators.contains(op));
        allowed_stages.retain(|stage| !DENIED_STAGES.contains(&stage.as_str()));

        Self {
            allowed_operators,
            denied_operators,
            allowed_stages,
            dangerous_mode: config.dangerous_mode,
            limits: Limits {
                max_depth: config.max_depth,
                max_nodes: config.max_nodes,
                max_string_length: config.max_string_length,
            },
            max_pipeline_stages: config.max_pipeline_stages,
            max_documents: config.max_documents,
        }
    }

    /// Safe-mode policy with default limits
    pub fn safe() -> Self {
        Self::resolve(&PolicyConfig::default())
    }

    /// Dangerous-mode policy with default limits
    pub fn dangerous() -> Self {
        Self::resolve(&PolicyConfig {
            dangerous_mode: true,
            ..PolicyConfig::default()
        })
    }

    pub fn allowed_operators(&self) -> &HashSet<String> {
        &self.allowed_operators
    }

    pub fn denied_operators(&self) -> &HashSet<String> {
        &self.denied_operators
    }

    pub fn allowed_stages(&self) -> &HashSet<String> {
        &self.allowed_stages
    }

    pub fn dangerous_mode(&self) -> bool {
        self.dangerous_mode
    }

    /// Structural bounds handed to the sanitizer
    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn max_pipeline_stages(&self) -> usize {
        self.max_pipeline_stages
    }

    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    /// Sorted, serializable view of the policy (for diagnostics)
    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            mode: if self.dangerous_mode { "dangerous" } else { "safe" },
            allowed_operators: self.allowed_operators.iter().cloned().collect(),
            denied_operators: self.denied_operators.iter().cloned().collect(),
            allowed_stages: self.allowed_stages.iter().cloned().collect(),
            max_depth: self.limits.max_depth,
            max_nodes: self.limits.max_nodes,
            max_string_length: self.limits.max_string_length,
            max_pipeline_stages: self.max_pipeline_stages,
            max_documents: self.max_documents,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::safe()
    }
}

/// Serializable snapshot of a [`Policy`]
#[derive(Debug, Clone, Serialize)]
pub struct PolicySummary {
    pub mode: &'static str,
    pub allowed_operators: BTreeSet<String>,
    pub denied_operators: BTreeSet<String>,
    pub allowed_stages: BTreeSet<String>,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_string_length: usize,
    pub max_pipeline_stages: usize,
    pub max_documents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PolicyConfig::default();
        assert!(!config.dangerous_mode);
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_pipeline_stages, 20);
        assert_eq!(config.max_documents, 1000);
    }

    #[test]
    fn test_resolve_copies_limits() {
        let policy = Policy::resolve(&PolicyConfig {
            dangerous_mode: false,
            max_depth: 7,
            max_nodes: 50,
            max_string_length: 64,
            max_pipeline_stages: 3,
            max_documents: 10,
        });
        assert_eq!(policy.limits().max_depth, 7);
        assert_eq!(policy.limits().max_nodes, 50);
        assert_eq!(policy.limits().max_string_length, 64);
        assert_eq!(policy.max_pipeline_stages(), 3);
        assert_eq!(policy.max_documents(), 10);
    }

    #[test]
    fn test_dangerous_mode_is_superset() {
        let safe = Policy::safe();
        let dangerous = Policy::dangerous();
        assert!(safe.allowed_operators().is_subset(dangerous.allowed_operators()));
        assert!(safe.allowed_stages().is_subset(dangerous.allowed_stages()));
        assert_eq!(safe.denied_operators(), dangerous.denied_operators());
        assert!(dangerous.allowed_operators().contains("$where"));
        assert!(!safe.allowed_operators().contains("$where"));
    }

    #[test]
    fn test_deny_lists_never_allowed() {
        let dangerous = Policy::dangerous();
        assert!(!dangerous.allowed_stages().contains("$out"));
        assert!(!dangerous.allowed_stages().contains("$merge"));
        assert!(dangerous
            .allowed_operators()
            .is_disjoint(dangerous.denied_operators()));
    }

    #[test]
    fn test_summary_is_sorted() {
        let summary = Policy::safe().summary();
        assert_eq!(summary.mode, "safe");
        let first = summary.allowed_stages.iter().next().cloned();
        assert_eq!(first.as_deref(), Some("$addFields"));
    }
}
