//! Error types for the MongoDB MCP gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, MongoMcpError>;

/// Unified error type for driver-side and plumbing failures
///
/// These are relayed to the caller as "the database failed", never as
/// "your input was rejected".
#[derive(Error, Debug, Clone)]
pub enum MongoMcpError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// Rejected credentials; retrying with the same ones cannot succeed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Server selection or operation timeout - retryable
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MongoMcpError {
    /// Returns true if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MongoMcpError::Timeout(_) | MongoMcpError::Connection(_)
        )
    }

    /// Short machine-readable category, used in tool results
    pub fn category(&self) -> &'static str {
        match self {
            MongoMcpError::MongoDB(_) => "mongodb",
            MongoMcpError::Connection(_) => "connection",
            MongoMcpError::Authentication(_) => "authentication",
            MongoMcpError::Timeout(_) => "timeout",
            MongoMcpError::Serialization(_) => "serialization",
            MongoMcpError::Config(_) => "config",
            MongoMcpError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for MongoMcpError {
    fn from(err: serde_json::Error) -> Self {
        MongoMcpError::Serialization(err.to_string())
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for MongoMcpError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } => MongoMcpError::Timeout(err.to_string()),
            ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => MongoMcpError::Connection(err.to_string()),
            ErrorKind::Authentication { .. } => MongoMcpError::Authentication(err.to_string()),
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                MongoMcpError::Serialization(err.to_string())
            }
            ErrorKind::Internal { .. } => MongoMcpError::Internal(err.to_string()),
            _ => MongoMcpError::MongoDB(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for MongoMcpError {
    fn from(err: bson::ser::Error) -> Self {
        MongoMcpError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for MongoMcpError {
    fn from(err: bson::de::Error) -> Self {
        MongoMcpError::Serialization(format!("BSON deserialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::extjson::de::Error> for MongoMcpError {
    fn from(err: bson::extjson::de::Error) -> Self {
        MongoMcpError::Serialization(format!("Extended JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_mongodb() {
        let err = MongoMcpError::MongoDB("command failed".to_string());
        assert_eq!(err.to_string(), "MongoDB error: command failed");
    }

    #[test]
    fn test_error_display_connection() {
        let err = MongoMcpError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = MongoMcpError::Timeout("server selection".to_string());
        assert_eq!(err.to_string(), "Timeout: server selection");
    }

    #[test]
    fn test_error_display_config() {
        let err = MongoMcpError::Config("MONGODB_PORT is not a number".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: MONGODB_PORT is not a number"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: MongoMcpError = json_err.into();
        assert!(matches!(err, MongoMcpError::Serialization(_)));
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_is_retryable() {
        assert!(MongoMcpError::Timeout("t".to_string()).is_retryable());
        assert!(MongoMcpError::Connection("c".to_string()).is_retryable());
        assert!(!MongoMcpError::MongoDB("m".to_string()).is_retryable());
        assert!(!MongoMcpError::Serialization("s".to_string()).is_retryable());
        assert!(!MongoMcpError::Config("x".to_string()).is_retryable());
    }

    #[test]
    fn test_authentication_not_retryable() {
        let err = MongoMcpError::Authentication("bad credentials".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.category(), "authentication");
        assert_eq!(err.to_string(), "Authentication error: bad credentials");
    }
}
