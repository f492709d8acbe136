//! Query documents for the Kowalski query API.
//!
//! A [`QueryDocument`] is built fresh for every call and serialised as-is:
//!
//! ```text
//! { "query_type": "cone_search" | "aggregate" | "info",
//!   "query":      { ...type-specific... },
//!   "kwargs":     { ... } }            // optional
//! ```
//!
//! Aggregate pipelines are MongoDB-shaped lists of `$match` / `$project`
//! stages; the helpers here only assemble them, the service evaluates them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{ConeUnit, FieldId, Position};

/// Column name holding the survey field of a classification row.
pub const FIELD_KEY: &str = "field";

/// Key of the single centre in a one-position cone search.
pub const CENTER_KEY: &str = "center";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    ConeSearch,
    Aggregate,
    Info,
}

/// A request descriptor sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub query_type: QueryType,
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Value>,
}

/// The set of fields requested from a catalog, serialised as `{field: 1}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection(Map<String, Value>);

impl Projection {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection(keys.into_iter().map(|k| (k.into(), Value::from(1))).collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl QueryDocument {
    /// Cone search around one or more named centres, against every catalog in
    /// `catalogs` with its projection.
    pub fn cone_search(
        radius: f64,
        unit: ConeUnit,
        radec: Map<String, Value>,
        catalogs: &[(&str, &Projection)],
    ) -> Self {
        let catalogs: Map<String, Value> = catalogs
            .iter()
            .map(|(name, projection)| {
                (name.to_string(), json!({ "projection": projection.to_value() }))
            })
            .collect();

        QueryDocument {
            query_type: QueryType::ConeSearch,
            query: json!({
                "object_coordinates": {
                    "cone_search_radius": radius,
                    "cone_search_unit": unit.as_str(),
                    "radec": radec,
                },
                "catalogs": catalogs,
            }),
            kwargs: Some(json!({ "filter_first": false })),
        }
    }

    pub fn aggregate(catalog: &str, pipeline: Vec<Value>) -> Self {
        QueryDocument {
            query_type: QueryType::Aggregate,
            query: json!({ "catalog": catalog, "pipeline": pipeline }),
            kwargs: None,
        }
    }

    pub fn info(catalog: &str, command: &str) -> Self {
        QueryDocument {
            query_type: QueryType::Info,
            query: json!({ "catalog": catalog, "command": command }),
            kwargs: None,
        }
    }
}

/// `{"center": [ra, dec]}`
pub fn single_center(position: Position) -> Map<String, Value> {
    let mut radec = Map::new();
    radec.insert(CENTER_KEY.to_string(), json!([position.0, position.1]));
    radec
}

/// `{"0": [ra, dec], "1": [ra, dec], ...}` keyed by positional index.
pub fn indexed_centers(positions: &[Position]) -> Map<String, Value> {
    positions
        .iter()
        .enumerate()
        .map(|(i, (ra, dec))| (i.to_string(), json!([ra, dec])))
        .collect()
}

pub fn match_stage(filter: Value) -> Value {
    json!({ "$match": filter })
}

pub fn project_stage(projection: &Projection) -> Value {
    json!({ "$project": projection.to_value() })
}

/// `{key: {"$in": values}}`
pub fn in_filter(key: &str, values: Vec<Value>) -> Value {
    json!({ key: { "$in": values } })
}

/// One aggregate query per field: `[{"$match": {"field": {"$in": [f]}}}] + stages`.
/// The returned documents are in `fields` order.
pub fn field_batched_pipelines(
    catalog: &str,
    fields: &[FieldId],
    stages: &[Value],
) -> Vec<QueryDocument> {
    fields
        .iter()
        .map(|field| {
            let mut pipeline = Vec::with_capacity(stages.len() + 1);
            pipeline.push(match_stage(in_filter(FIELD_KEY, vec![field.value().clone()])));
            pipeline.extend(stages.iter().cloned());
            QueryDocument::aggregate(catalog, pipeline)
        })
        .collect()
}
