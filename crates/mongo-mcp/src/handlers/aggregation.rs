//! Aggregation tools

use bson::{doc, Bson, Document};
use mongo_guard::{bound, effective_limit};
use serde_json::{json, Value as JsonValue};

use super::{fetch_limit, Arguments, Gateway, DEFAULT_LIMIT};
use crate::convert::to_json;
use crate::error::ToolResult;

/// Cap the pipeline output with a trailing `$limit`
///
/// Appended even when the caller has its own `$limit`, which may be larger
/// than the server maximum.
fn with_limit(mut pipeline: Vec<Document>, limit: i64) -> Vec<Document> {
    pipeline.push(doc! { "$limit": limit });
    pipeline
}

pub(super) async fn aggregate_pipeline(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let policy = gateway.policy();
    let db = args.database()?;
    let coll = args.collection()?;
    let pipeline = args.pipeline("pipeline", policy)?;

    let requested = args.optional_i64("limit")?.unwrap_or(DEFAULT_LIMIT);
    let limit = effective_limit(Some(requested), policy.max_documents());
    let pipeline = with_limit(pipeline, fetch_limit(limit));

    let executed: Vec<JsonValue> = pipeline
        .iter()
        .map(|stage| Bson::Document(stage.clone()).into_relaxed_extjson())
        .collect();

    let results = gateway.store().aggregate(&db, &coll, pipeline).await?;
    let bounded = bound(results, limit);

    let count = bounded.len();
    let has_more = bounded.truncated;

    Ok(json!({
        "results": bounded.items.into_iter().map(to_json).collect::<Vec<_>>(),
        "count": count,
        "hasMore": has_more,
        "limit": limit,
        "pipeline": executed,
    }))
}

pub(super) async fn explain_aggregation(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let coll = args.collection()?;
    let pipeline = args.pipeline("pipeline", gateway.policy())?;

    let plan = gateway.store().explain_aggregate(&db, &coll, pipeline).await?;

    Ok(json!({
        "database": db.as_str(),
        "collection": coll.as_str(),
        "plan": to_json(plan),
    }))
}
