//! Mode gate
//!
//! The coarse, operation-level check that runs before any document is looked
//! at: in safe mode, write-shaped operations never reach the validators.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{Violation, ViolationKind};
use crate::policy::Policy;

/// Operations exposed to the calling agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListDatabases,
    GetDatabaseStats,
    ListCollections,
    DescribeCollection,
    GetCollectionStats,
    ListIndexes,
    FindDocuments,
    FindOneDocument,
    CountDocuments,
    AggregatePipeline,
    ExplainAggregation,
    InsertDocument,
    UpdateDocument,
    DeleteDocument,
    CreateIndex,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Self::ListDatabases,
        Self::GetDatabaseStats,
        Self::ListCollections,
        Self::DescribeCollection,
        Self::GetCollectionStats,
        Self::ListIndexes,
        Self::FindDocuments,
        Self::FindOneDocument,
        Self::CountDocuments,
        Self::AggregatePipeline,
        Self::ExplainAggregation,
        Self::InsertDocument,
        Self::UpdateDocument,
        Self::DeleteDocument,
        Self::CreateIndex,
    ];

    /// Tool name as seen by the agent
    pub fn name(self) -> &'static str {
        match self {
            Self::ListDatabases => "list_databases",
            Self::GetDatabaseStats => "get_database_stats",
            Self::ListCollections => "list_collections",
            Self::DescribeCollection => "describe_collection",
            Self::GetCollectionStats => "get_collection_stats",
            Self::ListIndexes => "list_indexes",
            Self::FindDocuments => "find_documents",
            Self::FindOneDocument => "find_one_document",
            Self::CountDocuments => "count_documents",
            Self::AggregatePipeline => "aggregate_pipeline",
            Self::ExplainAggregation => "explain_aggregation",
            Self::InsertDocument => "insert_document",
            Self::UpdateDocument => "update_document",
            Self::DeleteDocument => "delete_document",
            Self::CreateIndex => "create_index",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Whether the operation changes data or schema
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::InsertDocument | Self::UpdateDocument | Self::DeleteDocument | Self::CreateIndex
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| Violation::malformed(Vec::new(), format!("unknown operation '{}'", s)))
    }
}

impl Policy {
    /// Reject write-shaped operations unless dangerous mode is on
    pub fn authorize(&self, operation: Operation) -> Result<(), Violation> {
        if operation.is_write() && !self.dangerous_mode() {
            return Err(Violation::new(
                ViolationKind::WriteDisabled,
                Vec::new(),
                format!(
                    "'{}' is a write operation and dangerous mode is disabled",
                    operation
                ),
            )
            .with_operator(operation.name()));
        }
        Ok(())
    }
}
