//! Database, collection and index field name validation
//!
//! Names are not part of the filter tree, but they are agent-supplied too and
//! travel to the driver unchanged, so they get the same violation taxonomy.
//! Failures are `MalformedInput` at the argument's path.

use std::fmt;

use crate::errors::{PathSegment, Violation};

/// Maximum database name length
pub const MAX_DATABASE_NAME_LENGTH: usize = 64;

/// Maximum collection name length
pub const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Maximum field name length used in index keys
pub const MAX_FIELD_NAME_LENGTH: usize = 1024;

fn invalid(argument: &str, message: String) -> Violation {
    Violation::malformed(vec![PathSegment::key(argument)], message)
}

/// Validated database name
///
/// # Guarantees
/// - 1 to 64 characters
/// - Only ASCII letters, digits, `_` and `-`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    pub fn new(name: &str) -> Result<Self, Violation> {
        if name.is_empty() {
            return Err(invalid("database", "database name cannot be empty".to_string()));
        }

        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(invalid(
                "database",
                format!(
                    "database name exceeds maximum length of {} characters",
                    MAX_DATABASE_NAME_LENGTH
                ),
            ));
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(invalid(
                "database",
                format!("database name contains invalid character {:?}", c),
            ));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedDatabaseName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated collection name
///
/// # Guarantees
/// - 1 to 120 characters
/// - No null bytes and no `$`
/// - Does not start with the reserved `system.` prefix
/// - Only ASCII letters, digits, `_`, `.` and `-`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    pub fn new(name: &str) -> Result<Self, Violation> {
        if name.is_empty() {
            return Err(invalid("collection", "collection name cannot be empty".to_string()));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(invalid(
                "collection",
                format!(
                    "collection name exceeds maximum length of {} characters",
                    MAX_COLLECTION_NAME_LENGTH
                ),
            ));
        }

        if name.contains('\0') {
            return Err(invalid(
                "collection",
                "collection name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with("system.") {
            return Err(invalid(
                "collection",
                format!("collection name cannot start with 'system.' (reserved): '{}'", name),
            ));
        }

        if name.contains('$') {
            return Err(invalid(
                "collection",
                format!("collection name cannot contain '$': '{}'", name),
            ));
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(invalid(
                "collection",
                format!("collection name contains invalid character {:?}", c),
            ));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Check a field name used as an index key
///
/// Index keys are plain field paths: never operators, never empty.
pub fn validate_index_field(name: &str, path: Vec<PathSegment>) -> Result<(), Violation> {
    if name.is_empty() {
        return Err(Violation::malformed(path, "index field name cannot be empty"));
    }
    if name.len() > MAX_FIELD_NAME_LENGTH {
        return Err(Violation::malformed(
            path,
            format!(
                "index field name exceeds maximum length of {} characters",
                MAX_FIELD_NAME_LENGTH
            ),
        ));
    }
    if name.contains('\0') {
        return Err(Violation::malformed(path, "index field name cannot contain null bytes"));
    }
    if name.starts_with('$') {
        return Err(Violation::malformed(
            path,
            format!("index field name cannot start with '$': '{}'", name),
        ));
    }
    Ok(())
}
