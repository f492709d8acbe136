//! Test builders: canned service responses and accessors for inspecting
//! the query documents the client submitted.
//!
//! These are designed for readability in test assertions, not for
//! production use. They panic on unexpected document shapes rather than
//! returning `Result`.

use scope::QueryResponse;
use scope_core::QueryDocument;
use serde_json::{json, Map, Value};

use super::fixtures::{CLASSIFICATIONS, FEATURES};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Successful single-centre cone response.
pub fn cone_response(features: Vec<Value>, classifications: Vec<Value>) -> QueryResponse {
    QueryResponse::success(json!({
        FEATURES: { "center": features },
        CLASSIFICATIONS: { "center": classifications },
    }))
}

/// Successful multi-centre cone response, one `(key, features, classes)`
/// triple per position, in the order given.
pub fn multi_cone_response(per_position: Vec<(&str, Vec<Value>, Vec<Value>)>) -> QueryResponse {
    let mut features = Map::new();
    let mut classes = Map::new();
    for (key, f, c) in per_position {
        features.insert(key.to_string(), Value::Array(f));
        classes.insert(key.to_string(), Value::Array(c));
    }
    QueryResponse::success(json!({ FEATURES: features, CLASSIFICATIONS: classes }))
}

pub fn rows_response(rows: Vec<Value>) -> QueryResponse {
    QueryResponse::success(Value::Array(rows))
}

// ---------------------------------------------------------------------------
// Document accessors
// ---------------------------------------------------------------------------

/// Catalog an aggregate or info document targets.
pub fn doc_catalog(doc: &QueryDocument) -> &str {
    doc.query["catalog"]
        .as_str()
        .expect("document has no catalog")
}

pub fn doc_pipeline(doc: &QueryDocument) -> &Vec<Value> {
    doc.query["pipeline"]
        .as_array()
        .expect("document has no pipeline")
}

/// The field a field-batched sub-query is pinned to.
pub fn doc_field(doc: &QueryDocument) -> Value {
    doc_pipeline(doc)[0]["$match"]["field"]["$in"][0].clone()
}

/// Values of a `{key: {"$in": [...]}}` match anywhere in the pipeline.
pub fn doc_in_values(doc: &QueryDocument, key: &str) -> Option<Vec<Value>> {
    doc_pipeline(doc).iter().find_map(|stage| {
        stage["$match"][key]["$in"].as_array().cloned()
    })
}

/// The `$match` of the filter stage that follows the field pin.
pub fn doc_filter(doc: &QueryDocument) -> Value {
    doc_pipeline(doc)[1]["$match"].clone()
}
