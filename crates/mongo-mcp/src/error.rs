//! Tool-call errors
//!
//! Joins the two failure taxonomies at the transport edge: input rejected by
//! the guard, and failures of the database itself. Each renders with a
//! distinct `error` marker so the caller can tell them apart.

use mongo_guard::{Violation, Violations};
use mongo_mcp_common::MongoMcpError;
use serde_json::{json, Value};
use thiserror::Error;

/// JSON-RPC "invalid params"
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Rejected by the gate or a validator; the database was not touched
    #[error("{0}")]
    Rejected(Violations),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Database(#[from] MongoMcpError),
}

impl ToolError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// JSON-RPC error code for errors reported at the protocol level
    ///
    /// `None` means the error is reported as a tool result with `isError`.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            Self::InvalidArguments(_) => Some(INVALID_PARAMS),
            Self::UnknownTool(_) => Some(METHOD_NOT_FOUND),
            Self::Rejected(_) | Self::Database(_) => None,
        }
    }

    /// Payload of an `isError` tool result
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Rejected(violations) => json!({
                "error": "validation_failed",
                "message": violations.to_string(),
                "violations": violations,
            }),
            Self::Database(err) => json!({
                "error": "database_error",
                "category": err.category(),
                "retryable": err.is_retryable(),
                "message": err.to_string(),
            }),
            Self::InvalidArguments(message) => json!({
                "error": "invalid_arguments",
                "message": message,
            }),
            Self::UnknownTool(name) => json!({
                "error": "unknown_tool",
                "message": format!("Tool not found: {}", name),
            }),
        }
    }
}

impl From<Violation> for ToolError {
    fn from(violation: Violation) -> Self {
        Self::Rejected(violation.into())
    }
}

impl From<Violations> for ToolError {
    fn from(violations: Violations) -> Self {
        Self::Rejected(violations)
    }
}

/// Result type for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use mongo_guard::{PathSegment, ViolationKind};

    #[test]
    fn test_rejected_payload() {
        let err = ToolError::from(
            Violation::new(
                ViolationKind::DisallowedOperator,
                vec![PathSegment::key("query"), PathSegment::key("$where")],
                "operator '$where' is not allowed in safe mode",
            )
            .with_operator("$where"),
        );
        assert_eq!(err.rpc_code(), None);

        let payload = err.to_payload();
        assert_eq!(payload["error"], "validation_failed");
        assert_eq!(payload["violations"][0]["kind"], "disallowed_operator");
        assert_eq!(payload["violations"][0]["path"], json!(["query", "$where"]));
    }

    #[test]
    fn test_database_payload() {
        let err = ToolError::from(MongoMcpError::Timeout("server selection".to_string()));
        let payload = err.to_payload();
        assert_eq!(payload["error"], "database_error");
        assert_eq!(payload["category"], "timeout");
        assert_eq!(payload["retryable"], true);
    }

    #[test]
    fn test_protocol_codes() {
        assert_eq!(
            ToolError::invalid_arguments("missing 'database'").rpc_code(),
            Some(INVALID_PARAMS)
        );
        assert_eq!(
            ToolError::UnknownTool("drop_database".to_string()).rpc_code(),
            Some(METHOD_NOT_FOUND)
        );
    }
}
