//! MCP tool definitions

use mongo_guard::Operation;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Tool schema for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Schema for the `database` argument
fn database_property() -> Value {
    json!({
        "type": "string",
        "description": "Database name"
    })
}

/// Schema for the `collection` argument
fn collection_property() -> Value {
    json!({
        "type": "string",
        "description": "Collection name"
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    let mut props = Map::new();
    props.insert("database".to_string(), database_property());
    if required.contains(&"collection") {
        props.insert("collection".to_string(), collection_property());
    }
    if let Value::Object(extra) = properties {
        props.extend(extra);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

/// MongoDB MCP tools
pub struct MongoTools;

impl MongoTools {
    /// Get all available tools
    pub fn list() -> Vec<ToolSchema> {
        Operation::ALL.into_iter().map(Self::schema).collect()
    }

    /// Schema of one tool
    pub fn schema(operation: Operation) -> ToolSchema {
        let (description, input_schema) = match operation {
            Operation::ListDatabases => (
                "List all databases on the server",
                json!({"type": "object", "properties": {}}),
            ),
            Operation::GetDatabaseStats => (
                "Get statistics for a database (collections, objects, data and index sizes)",
                object_schema(json!({}), &["database"]),
            ),
            Operation::ListCollections => (
                "List the collections in a database",
                object_schema(json!({}), &["database"]),
            ),
            Operation::DescribeCollection => (
                "Describe a collection: indexes, statistics and field types from a small sample",
                object_schema(json!({}), &["database", "collection"]),
            ),
            Operation::GetCollectionStats => (
                "Get statistics for a collection",
                object_schema(json!({}), &["database", "collection"]),
            ),
            Operation::ListIndexes => (
                "List the indexes of a collection",
                object_schema(json!({}), &["database", "collection"]),
            ),
            Operation::FindDocuments => (
                "Find documents matching a query filter",
                object_schema(
                    json!({
                        "query": {
                            "type": "object",
                            "description": "Query filter, e.g. {\"price\": {\"$gt\": 100}}"
                        },
                        "projection": {
                            "type": "object",
                            "description": "Fields to include or exclude"
                        },
                        "sort": {
                            "type": "object",
                            "description": "Sort order, e.g. {\"created_at\": -1}"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum documents to return (default 100, capped by server)",
                            "default": 100
                        },
                        "skip": {
                            "type": "integer",
                            "description": "Documents to skip",
                            "default": 0
                        }
                    }),
                    &["database", "collection"],
                ),
            ),
            Operation::FindOneDocument => (
                "Find a single document matching a query filter",
                object_schema(
                    json!({
                        "query": {"type": "object", "description": "Query filter"},
                        "projection": {"type": "object", "description": "Fields to include or exclude"}
                    }),
                    &["database", "collection"],
                ),
            ),
            Operation::CountDocuments => (
                "Count documents matching a query filter",
                object_schema(
                    json!({
                        "query": {"type": "object", "description": "Query filter"}
                    }),
                    &["database", "collection"],
                ),
            ),
            Operation::AggregatePipeline => (
                "Run an aggregation pipeline (read-only stages; output is capped with a trailing $limit)",
                object_schema(
                    json!({
                        "pipeline": {
                            "type": "array",
                            "items": {"type": "object"},
                            "description": "Aggregation stages, e.g. [{\"$match\": {...}}, {\"$group\": {...}}]"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum results to return (default 100, capped by server)",
                            "default": 100
                        }
                    }),
                    &["database", "collection", "pipeline"],
                ),
            ),
            Operation::ExplainAggregation => (
                "Explain the execution plan of an aggregation pipeline",
                object_schema(
                    json!({
                        "pipeline": {
                            "type": "array",
                            "items": {"type": "object"},
                            "description": "Aggregation stages"
                        }
                    }),
                    &["database", "collection", "pipeline"],
                ),
            ),
            Operation::InsertDocument => (
                "Insert a document (requires dangerous mode)",
                object_schema(
                    json!({
                        "document": {"type": "object", "description": "Document to insert"}
                    }),
                    &["database", "collection", "document"],
                ),
            ),
            Operation::UpdateDocument => (
                "Update every document matching a filter (requires dangerous mode)",
                object_schema(
                    json!({
                        "query": {"type": "object", "description": "Query filter"},
                        "update": {
                            "type": "object",
                            "description": "Update operators, e.g. {\"$set\": {\"status\": \"done\"}}"
                        },
                        "upsert": {
                            "type": "boolean",
                            "description": "Insert when nothing matches",
                            "default": false
                        }
                    }),
                    &["database", "collection", "query", "update"],
                ),
            ),
            Operation::DeleteDocument => (
                "Delete every document matching a filter (requires dangerous mode)",
                object_schema(
                    json!({
                        "query": {"type": "object", "description": "Query filter"}
                    }),
                    &["database", "collection", "query"],
                ),
            ),
            Operation::CreateIndex => (
                "Create an index on a collection (requires dangerous mode)",
                object_schema(
                    json!({
                        "keys": {
                            "type": "object",
                            "description": "Index keys, e.g. {\"email\": 1}"
                        },
                        "name": {"type": "string", "description": "Index name"},
                        "unique": {
                            "type": "boolean",
                            "description": "Enforce uniqueness",
                            "default": false
                        }
                    }),
                    &["database", "collection", "keys"],
                ),
            ),
        };

        ToolSchema {
            name: operation.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}
