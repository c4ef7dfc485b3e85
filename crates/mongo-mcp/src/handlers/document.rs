//! Document tools: find, count and, in dangerous mode, writes

use bson::{Bson, Document};
use mongo_guard::{bound, effective_limit};
use serde_json::{json, Value as JsonValue};

use super::{fetch_limit, Arguments, Gateway, DEFAULT_LIMIT};
use crate::convert::{bson_to_json, to_json};
use crate::error::{ToolError, ToolResult};
use crate::store::FindQuery;

fn echo(document: &Document) -> JsonValue {
    Bson::Document(document.clone()).into_relaxed_extjson()
}

pub(super) async fn find_documents(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let policy = gateway.policy();
    let db = args.database()?;
    let coll = args.collection()?;
    let filter = args.document("query", policy)?.unwrap_or_default();
    let projection = args.document("projection", policy)?;
    let sort = args.document("sort", policy)?;

    let skip = args.optional_i64("skip")?.unwrap_or(0);
    let skip = u64::try_from(skip)
        .map_err(|_| ToolError::invalid_arguments("'skip' must not be negative"))?;

    let requested = args.optional_i64("limit")?.unwrap_or(DEFAULT_LIMIT);
    let limit = effective_limit(Some(requested), policy.max_documents());

    let mut query = FindQuery::new().filter(filter.clone()).skip(skip);
    if let Some(projection) = projection {
        query = query.projection(projection);
    }
    if let Some(sort) = sort {
        query = query.sort(sort);
    }
    // One extra row tells us whether more documents match
    query = query.limit(fetch_limit(limit));

    let documents = gateway.store().find(&db, &coll, query).await?;
    let bounded = bound(documents, limit);

    let count = bounded.len();
    let has_more = bounded.truncated;

    Ok(json!({
        "documents": bounded.items.into_iter().map(to_json).collect::<Vec<_>>(),
        "count": count,
        "hasMore": has_more,
        "limit": limit,
        "query": echo(&filter),
    }))
}

pub(super) async fn find_one_document(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let policy = gateway.policy();
    let db = args.database()?;
    let coll = args.collection()?;
    let filter = args.document("query", policy)?.unwrap_or_default();
    let projection = args.document("projection", policy)?;

    let document = gateway.store().find_one(&db, &coll, filter, projection).await?;

    Ok(json!({
        "found": document.is_some(),
        "document": document.map(to_json),
    }))
}

pub(super) async fn count_documents(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let filter = args.document("query", gateway.policy())?.unwrap_or_default();

    let count = gateway.store().count(&db, &coll, filter.clone()).await?;

    Ok(json!({
        "count": count,
        "query": echo(&filter),
    }))
}

pub(super) async fn insert_document(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let document = args.required_document("document", gateway.policy())?;

    let inserted_id = gateway.store().insert_one(&db, &coll, document).await?;

    Ok(json!({
        "insertedId": bson_to_json(inserted_id),
        "acknowledged": true,
    }))
}

pub(super) async fn update_document(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let policy = gateway.policy();
    let db = args.database()?;
    let coll = args.collection()?;
    let filter = args.required_document("query", policy)?;
    let update = args.required_document("update", policy)?;
    let upsert = args.optional_bool("upsert")?.unwrap_or(false);

    let summary = gateway
        .store()
        .update_many(&db, &coll, filter, update, upsert)
        .await?;

    Ok(json!({
        "matchedCount": summary.matched_count,
        "modifiedCount": summary.modified_count,
        "upsertedId": summary.upserted_id.map(bson_to_json),
        "acknowledged": true,
    }))
}

pub(super) async fn delete_document(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let filter = args.required_document("query", gateway.policy())?;

    let deleted_count = gateway.store().delete_many(&db, &coll, filter).await?;

    Ok(json!({
        "deletedCount": deleted_count,
        "acknowledged": true,
    }))
}
