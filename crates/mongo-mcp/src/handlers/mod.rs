//! Tool handlers
//!
//! [`Gateway::call`] is the single entry point: resolve the tool name, run
//! the mode gate, then hand the arguments to the matching handler. Handlers
//! validate every agent-supplied name, filter, update and pipeline before
//! the store sees it.

mod aggregation;
mod collection;
mod database;
mod document;

use std::sync::Arc;

use bson::Document;
use mongo_guard::{
    validate_document, validate_pipeline, Operation, PathSegment, Policy,
    ValidatedCollectionName, ValidatedDatabaseName, Value, Violation,
};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::convert::to_document;
use crate::error::{ToolError, ToolResult};
use crate::store::DocumentStore;

/// Default `limit` for find and aggregate when the caller gives none
pub const DEFAULT_LIMIT: i64 = 100;

/// Limit sent to the driver for a bounded read
///
/// One past `limit` so a full page shows whether more documents match.
/// Saturates instead of overflowing for huge configured maximums.
pub(crate) fn fetch_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX).saturating_add(1)
}

/// Validated entry point from tool calls to the store
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
    policy: Arc<Policy>,
}

impl Gateway {
    pub fn new(store: Arc<dyn DocumentStore>, policy: Arc<Policy>) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Run one tool call
    pub async fn call(&self, name: &str, arguments: Option<JsonValue>) -> ToolResult<JsonValue> {
        let operation =
            Operation::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        self.policy.authorize(operation)?;

        let args = Arguments::new(arguments)?;
        debug!(tool = %operation, "dispatching tool call");

        match operation {
            Operation::ListDatabases => database::list_databases(self).await,
            Operation::GetDatabaseStats => database::get_database_stats(self, &args).await,
            Operation::ListCollections => database::list_collections(self, &args).await,
            Operation::DescribeCollection => collection::describe_collection(self, &args).await,
            Operation::GetCollectionStats => collection::get_collection_stats(self, &args).await,
            Operation::ListIndexes => collection::list_indexes(self, &args).await,
            Operation::FindDocuments => document::find_documents(self, &args).await,
            Operation::FindOneDocument => document::find_one_document(self, &args).await,
            Operation::CountDocuments => document::count_documents(self, &args).await,
            Operation::InsertDocument => document::insert_document(self, &args).await,
            Operation::UpdateDocument => document::update_document(self, &args).await,
            Operation::DeleteDocument => document::delete_document(self, &args).await,
            Operation::CreateIndex => collection::create_index(self, &args).await,
            Operation::AggregatePipeline => aggregation::aggregate_pipeline(self, &args).await,
            Operation::ExplainAggregation => aggregation::explain_aggregation(self, &args).await,
        }
    }
}

/// Named tool arguments
///
/// `null` is treated the same as an absent argument.
#[derive(Debug, Default)]
pub struct Arguments {
    map: Map<String, JsonValue>,
}

impl Arguments {
    pub fn new(arguments: Option<JsonValue>) -> ToolResult<Self> {
        match arguments {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(JsonValue::Object(map)) => Ok(Self { map }),
            Some(other) => Err(ToolError::invalid_arguments(format!(
                "arguments must be an object, got {}",
                Value::from(other).type_name()
            ))),
        }
    }

    fn raw(&self, key: &str) -> Option<&JsonValue> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> ToolResult<&JsonValue> {
        self.raw(key)
            .ok_or_else(|| ToolError::invalid_arguments(format!("missing required argument '{}'", key)))
    }

    pub fn required_str(&self, key: &str) -> ToolResult<&str> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' must be a string", key)))
    }

    pub fn optional_str(&self, key: &str) -> ToolResult<Option<&str>> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' must be a string", key))),
        }
    }

    pub fn optional_i64(&self, key: &str) -> ToolResult<Option<i64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' must be an integer", key))),
        }
    }

    pub fn optional_bool(&self, key: &str) -> ToolResult<Option<bool>> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' must be a boolean", key))),
        }
    }

    pub fn database(&self) -> ToolResult<ValidatedDatabaseName> {
        Ok(ValidatedDatabaseName::new(self.required_str("database")?)?)
    }

    pub fn collection(&self) -> ToolResult<ValidatedCollectionName> {
        Ok(ValidatedCollectionName::new(self.required_str("collection")?)?)
    }

    /// Validate and convert an optional filter/update/projection/sort
    ///
    /// Violation paths start with the argument name.
    pub fn document(&self, key: &str, policy: &Policy) -> ToolResult<Option<Document>> {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };

        let sanitized = validate_document(&Value::from(raw.clone()), policy)
            .into_result()
            .map_err(|violations| violations.prefixed(PathSegment::key(key)))?;

        Ok(Some(to_document(sanitized, key)?))
    }

    pub fn required_document(&self, key: &str, policy: &Policy) -> ToolResult<Document> {
        self.require(key)?;
        self.document(key, policy)?
            .ok_or_else(|| ToolError::invalid_arguments(format!("missing required argument '{}'", key)))
    }

    /// Validate and convert a required aggregation pipeline
    pub fn pipeline(&self, key: &str, policy: &Policy) -> ToolResult<Vec<Document>> {
        let raw = self.require(key)?;

        let sanitized = validate_pipeline(&Value::from(raw.clone()), policy)
            .into_result()
            .map_err(|violations| violations.prefixed(PathSegment::key(key)))?;

        let Value::List(stages) = sanitized else {
            return Err(Violation::malformed(
                vec![PathSegment::key(key)],
                "pipeline must be an array",
            )
            .into());
        };

        let mut pipeline = Vec::with_capacity(stages.len());
        for (index, stage) in stages.into_iter().enumerate() {
            let stage = to_document(stage, key).map_err(|mut violation| {
                violation.path.push(PathSegment::Index(index));
                violation
            })?;
            pipeline.push(stage);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use mongo_guard::ViolationKind;
    use serde_json::json;

    fn args(value: JsonValue) -> Arguments {
        Arguments::new(Some(value)).unwrap()
    }

    fn rejected_kinds(err: ToolError) -> Vec<ViolationKind> {
        match err {
            ToolError::Rejected(violations) => violations.kinds(),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_arguments_must_be_object() {
        assert!(Arguments::new(None).is_ok());
        assert!(Arguments::new(Some(JsonValue::Null)).is_ok());
        assert!(matches!(
            Arguments::new(Some(json!([1]))),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_scalar_accessors() {
        let a = args(json!({"limit": 5, "upsert": true, "name": "idx", "skip": null}));
        assert_eq!(a.optional_i64("limit").unwrap(), Some(5));
        assert_eq!(a.optional_bool("upsert").unwrap(), Some(true));
        assert_eq!(a.optional_str("name").unwrap(), Some("idx"));
        assert_eq!(a.optional_i64("skip").unwrap(), None);
        assert!(a.optional_i64("name").is_err());
        assert!(a.required_str("missing").is_err());
    }

    #[test]
    fn test_names_are_validated() {
        let a = args(json!({"database": "shop", "collection": "system.users"}));
        assert_eq!(a.database().unwrap().as_str(), "shop");
        assert_eq!(
            rejected_kinds(a.collection().unwrap_err()),
            vec![ViolationKind::MalformedInput]
        );
    }

    #[test]
    fn test_document_is_validated_and_prefixed() {
        let a = args(json!({"query": {"$where": "1"}}));
        match a.document("query", &Policy::safe()).unwrap_err() {
            ToolError::Rejected(violations) => {
                assert_eq!(violations.as_slice()[0].location(), "query.$where");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_document_converts() {
        let a = args(json!({"query": {"age": {"$gte": 21}}}));
        let document = a.document("query", &Policy::safe()).unwrap();
        assert_eq!(document, Some(doc! { "age": { "$gte": 21 } }));
        assert_eq!(a.document("projection", &Policy::safe()).unwrap(), None);
    }

    #[test]
    fn test_required_document() {
        let a = args(json!({}));
        assert!(matches!(
            a.required_document("update", &Policy::dangerous()),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_pipeline_is_validated() {
        let a = args(json!({"pipeline": [{"$match": {}}, {"$out": "x"}]}));
        let err = a.pipeline("pipeline", &Policy::dangerous()).unwrap_err();
        assert_eq!(rejected_kinds(err), vec![ViolationKind::DisallowedStage]);

        let a = args(json!({"pipeline": [{"$match": {"a": 1}}, {"$limit": 3}]}));
        let pipeline = a.pipeline("pipeline", &Policy::safe()).unwrap();
        assert_eq!(pipeline, vec![doc! { "$match": { "a": 1 } }, doc! { "$limit": 3 }]);
    }

    #[test]
    fn test_fetch_limit_saturates() {
        assert_eq!(fetch_limit(0), 1);
        assert_eq!(fetch_limit(100), 101);
        assert_eq!(fetch_limit(i64::MAX as usize), i64::MAX);
        assert_eq!(fetch_limit(usize::MAX), i64::MAX);
    }
}
