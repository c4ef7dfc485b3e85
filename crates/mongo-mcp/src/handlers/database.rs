//! Database-level tools

use serde_json::{json, Value as JsonValue};

use super::{Arguments, Gateway};
use crate::convert::stat;
use crate::error::ToolResult;

pub(super) async fn list_databases(gateway: &Gateway) -> ToolResult<JsonValue> {
    let databases = gateway.store().list_databases().await?;
    let entries: Vec<JsonValue> = databases
        .iter()
        .map(|db| {
            json!({
                "name": db.name,
                "sizeOnDisk": db.size_on_disk,
                "empty": db.empty,
            })
        })
        .collect();

    Ok(json!({
        "databases": entries,
        "count": databases.len(),
    }))
}

pub(super) async fn get_database_stats(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let stats = gateway.store().database_stats(&db).await?;

    Ok(json!({
        "database": db.as_str(),
        "collections": stat(&stats, "collections"),
        "objects": stat(&stats, "objects"),
        "avgObjSize": stat(&stats, "avgObjSize"),
        "dataSize": stat(&stats, "dataSize"),
        "storageSize": stat(&stats, "storageSize"),
        "indexes": stat(&stats, "indexes"),
        "indexSize": stat(&stats, "indexSize"),
    }))
}

pub(super) async fn list_collections(gateway: &Gateway, args: &Arguments) -> ToolResult<JsonValue> {
    let db = args.database()?;
    let mut names = gateway.store().list_collections(&db).await?;
    names.sort();

    let collections: Vec<JsonValue> = names
        .iter()
        .map(|name| json!({"name": name, "type": "collection"}))
        .collect();

    Ok(json!({
        "database": db.as_str(),
        "collections": collections,
        "count": names.len(),
    }))
}
