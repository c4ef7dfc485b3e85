//! Collection-level tools: metadata, statistics and indexes

use bson::{doc, Bson, Document};
use mongo_guard::names::validate_index_field;
use mongo_guard::{PathSegment, Violation, Violations};
use serde_json::{json, Value as JsonValue};

use super::{Arguments, Gateway};
use crate::convert::{sample_schema, stat, to_json};
use crate::error::ToolResult;
use crate::store::IndexSpec;

/// Documents sampled by `describe_collection`
const SCHEMA_SAMPLE_SIZE: i32 = 5;

pub(super) async fn describe_collection(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let store = gateway.store();

    let indexes = store.list_indexes(&db, &coll).await?;
    let stats = store.collection_stats(&db, &coll).await?;
    let samples = store
        .aggregate(&db, &coll, vec![doc! { "$sample": { "size": SCHEMA_SAMPLE_SIZE } }])
        .await?;

    Ok(json!({
        "database": db.as_str(),
        "collection": coll.as_str(),
        "indexes": indexes.into_iter().map(to_json).collect::<Vec<_>>(),
        "stats": {
            "count": stat(&stats, "count"),
            "size": stat(&stats, "size"),
            "storageSize": stat(&stats, "storageSize"),
            "avgObjSize": stat(&stats, "avgObjSize"),
        },
        "sampleSize": samples.len(),
        "sampleSchema": sample_schema(&samples),
    }))
}

pub(super) async fn get_collection_stats(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let stats = gateway.store().collection_stats(&db, &coll).await?;

    Ok(json!({
        "database": db.as_str(),
        "collection": coll.as_str(),
        "count": stat(&stats, "count"),
        "size": stat(&stats, "size"),
        "storageSize": stat(&stats, "storageSize"),
        "avgObjSize": stat(&stats, "avgObjSize"),
        "indexCount": stat(&stats, "nindexes"),
        "indexSize": stat(&stats, "totalIndexSize"),
    }))
}

pub(super) async fn list_indexes(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let indexes = gateway.store().list_indexes(&db, &coll).await?;

    Ok(json!({
        "database": db.as_str(),
        "collection": coll.as_str(),
        "count": indexes.len(),
        "indexes": indexes.into_iter().map(to_json).collect::<Vec<_>>(),
    }))
}

pub(super) async fn create_index(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let keys = args.required_document("keys", gateway.policy())?;
    check_index_keys(&keys)?;

    let index = IndexSpec {
        keys,
        name: args.optional_str("name")?.map(str::to_string),
        unique: args.optional_bool("unique")?.unwrap_or(false),
    };
    let index_name = gateway.store().create_index(&db, &coll, index).await?;

    Ok(json!({
        "database": db.as_str(),
        "collection": coll.as_str(),
        "indexName": index_name,
    }))
}

/// Index keys are field paths mapped to a direction (1/-1) or an index type
fn check_index_keys(keys: &Document) -> Result<(), Violations> {
    let mut violations = Violations::new();

    if keys.is_empty() {
        violations.add(Violation::malformed(
            vec![PathSegment::key("keys")],
            "index needs at least one key",
        ));
    }

    for (field, direction) in keys {
        let path = vec![PathSegment::key("keys"), PathSegment::key(field.as_str())];
        if let Err(violation) = validate_index_field(field, path.clone()) {
            violations.add(violation);
            continue;
        }

        let valid = match direction {
            Bson::Int32(n) => *n == 1 || *n == -1,
            Bson::Int64(n) => *n == 1 || *n == -1,
            Bson::Double(n) => *n == 1.0 || *n == -1.0,
            Bson::String(kind) => matches!(kind.as_str(), "text" | "2d" | "2dsphere" | "hashed"),
            _ => false,
        };
        if !valid {
            violations.add(Violation::malformed(
                path,
                "index direction must be 1, -1, \"text\", \"2d\", \"2dsphere\" or \"hashed\"",
            ));
        }
    }

    violations.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_keys() {
        assert!(check_index_keys(&doc! { "email": 1 }).is_ok());
        assert!(check_index_keys(&doc! { "a": -1, "b": "text" }).is_ok());

        let violations = check_index_keys(&doc! { "$where": 1, "b": 5, "c": "sideways" }).unwrap_err();
        assert_eq!(violations.len(), 3);
        assert_eq!(violations.as_slice()[1].location(), "keys.b");

        assert!(check_index_keys(&doc! {}).is_err());
    }
}
