//! JSON <-> BSON conversion at the tool boundary

use std::collections::{BTreeMap, BTreeSet};

use bson::{Bson, Document};
use mongo_guard::{PathSegment, Value, Violation};
use serde_json::{json, Value as JsonValue};

/// Convert a sanitized tree into a BSON document
///
/// Extended JSON wrappers such as `{"$oid": "..."}` become the matching BSON
/// types. Bad wrapper payloads, or a top level that is itself a wrapper, are
/// the caller's fault and come back as a `MalformedInput` violation at
/// `argument`.
pub fn to_document(value: Value, argument: &str) -> Result<Document, Violation> {
    let json = JsonValue::from(value);
    match Bson::try_from(json) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(Violation::malformed(
            vec![PathSegment::key(argument)],
            format!("expected an object, got {}", bson_type_name(&other)),
        )),
        Err(e) => Err(Violation::malformed(
            vec![PathSegment::key(argument)],
            format!("invalid extended JSON: {}", e),
        )),
    }
}

/// Render a document for the caller as relaxed extended JSON
///
/// A top-level ObjectId `_id` is flattened to its hex string.
pub fn to_json(mut document: Document) -> JsonValue {
    if let Some(Bson::ObjectId(oid)) = document.get("_id") {
        let hex = oid.to_hex();
        document.insert("_id", hex);
    }
    Bson::Document(document).into_relaxed_extjson()
}

/// Render a bare BSON value (an inserted or upserted id, a stat)
pub fn bson_to_json(value: Bson) -> JsonValue {
    match value {
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

/// Numeric statistic from a `dbStats`/`collStats` reply, 0 when absent
pub fn stat(stats: &Document, key: &str) -> JsonValue {
    match stats.get(key) {
        Some(value) => value.clone().into_relaxed_extjson(),
        None => json!(0),
    }
}

/// BSON type name as reported to the caller
pub fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binary",
        Bson::ObjectId(_) => "objectid",
        Bson::DateTime(_) => "datetime",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal128",
        Bson::RegularExpression(_) => "regex",
        _ => "unknown",
    }
}

/// Top-level field types seen across sample documents
pub fn sample_schema(samples: &[Document]) -> BTreeMap<String, BTreeSet<&'static str>> {
    let mut schema: BTreeMap<String, BTreeSet<&'static str>> = BTreeMap::new();
    for document in samples {
        for (field, value) in document {
            schema
                .entry(field.clone())
                .or_default()
                .insert(bson_type_name(value));
        }
    }
    schema
}
