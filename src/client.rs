//! The query client: builds documents, dispatches them and stitches the
//! features and classifications catalogs back together on `_id`.
//!
//! Remote failures never surface as errors. Single-query methods log them and
//! return `None`; field-batched methods drop the failed sub-query, log it, and
//! report it in [`BatchOutcome::failures`]. Only argument validation returns
//! `Err`.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use scope_core::config::Config;
use scope_core::query::{
    field_batched_pipelines, in_filter, indexed_centers, match_stage, project_stage,
    single_center, CENTER_KEY,
};
use scope_core::{
    Catalog, ConeUnit, FieldId, IdType, Ids, Position, Projection, QueryDocument, Record,
    ScopeError, Table, ID_KEY,
};
use scope_kowalski::{Kowalski, QueryResponse, QueryService, ServiceError, ServiceResponse};

/// Info command returning a catalog's index metadata.
const INDEX_INFO_COMMAND: &str = "index_info";

/// A sub-query of a field-batched search that did not contribute records.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQueryFailure {
    pub field: FieldId,
    pub catalog: String,
    pub message: String,
}

impl std::fmt::Display for SubQueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "query failed for field {} on {}: {}",
            self.field, self.catalog, self.message
        )
    }
}

/// Result of a field-batched search: whatever joined, plus the sub-queries
/// that were lost along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub table: Table,
    pub failures: Vec<SubQueryFailure>,
}

pub struct ScopeClient<S = Kowalski> {
    service: S,
    config: Config,
    features_projection: Projection,
    classification_projection: Projection,
}

impl ScopeClient<Kowalski> {
    /// Connect to `hosts` (each needs an entry in `tokens`) using the default
    /// protocol, port and domain conventions. Responses are read from the
    /// first host.
    pub fn new(
        tokens: &HashMap<String, String>,
        hosts: &[String],
        timeout: Duration,
        max_n_threads: usize,
    ) -> Result<Self, ServiceError> {
        let mut config = Config::defaults();
        config.service.hosts = hosts.to_vec();
        config.service.set_timeout(timeout);
        config.service.max_n_threads = max_n_threads;
        if let Some(first) = hosts.first() {
            config.service.response_key = first.clone();
        }
        Self::from_config(config, tokens)
    }

    pub fn from_config(config: Config, tokens: &HashMap<String, String>) -> Result<Self, ServiceError> {
        let service = Kowalski::from_config(&config.service, tokens)?;
        Ok(Self::with_service(service, config))
    }
}

impl<S: QueryService> ScopeClient<S> {
    /// Use any [`QueryService`]; projections come from `config.projection`.
    pub fn with_service(service: S, config: Config) -> Self {
        let keys = |catalog: Catalog| config.projection.keys(catalog).iter().cloned();
        let features_projection = Projection::from_keys(keys(Catalog::Features));
        let classification_projection = Projection::from_keys(keys(Catalog::Classifications));
        Self {
            service,
            config,
            features_projection,
            classification_projection,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn features_projection(&self) -> &Projection {
        &self.features_projection
    }

    pub fn classification_projection(&self) -> &Projection {
        &self.classification_projection
    }

    /// Change the columns fetched from the features catalog.
    pub fn set_features_keys(&mut self, keys: Vec<String>) {
        self.features_projection = Projection::from_keys(keys.iter().cloned());
        self.config.projection.features = keys;
    }

    /// Change the columns fetched from the classifications catalog.
    pub fn set_classification_keys(&mut self, keys: Vec<String>) {
        self.classification_projection = Projection::from_keys(keys.iter().cloned());
        self.config.projection.classifications = keys;
    }

    fn catalog_name(&self, catalog: Catalog) -> &str {
        self.config.catalogs.name(catalog)
    }

    fn projection(&self, catalog: Catalog) -> &Projection {
        match catalog {
            Catalog::Features => &self.features_projection,
            Catalog::Classifications => &self.classification_projection,
        }
    }

    // -----------------------------------------------------------------------
    // Cone searches
    // -----------------------------------------------------------------------

    /// All sources within `radius` of `(ra, dec)`, joined across both catalogs.
    ///
    /// Returns `Ok(None)` when the query fails or either catalog has no
    /// sources in the cone.
    pub async fn cone_search(
        &self,
        ra: f64,
        dec: f64,
        radius: f64,
        unit: ConeUnit,
    ) -> Result<Option<Table>, ScopeError> {
        validate_radius(radius)?;
        let doc = self.cone_document(radius, unit, single_center((ra, dec)));

        let Some(data) = self.run_single(&doc).await else {
            return Ok(None);
        };
        let extract = |per: &Value| records_at(per, CENTER_KEY);
        let (Some(features), Some(classifications)) = (
            self.cone_records(&data, Catalog::Features, extract),
            self.cone_records(&data, Catalog::Classifications, extract),
        ) else {
            return Ok(None);
        };
        Ok(join_nonempty(features, classifications))
    }

    /// One cone per position, all in a single query. Per-position results are
    /// concatenated in the order the service returned them before joining.
    pub async fn cone_searches(
        &self,
        positions: &[Position],
        radius: f64,
        unit: ConeUnit,
    ) -> Result<Option<Table>, ScopeError> {
        if positions.is_empty() {
            return Err(ScopeError::EmptyPositions);
        }
        validate_radius(radius)?;
        let doc = self.cone_document(radius, unit, indexed_centers(positions));

        let Some(data) = self.run_single(&doc).await else {
            return Ok(None);
        };
        let (Some(features), Some(classifications)) = (
            self.cone_records(&data, Catalog::Features, concat_positions),
            self.cone_records(&data, Catalog::Classifications, concat_positions),
        ) else {
            return Ok(None);
        };
        Ok(join_nonempty(features, classifications))
    }

    fn cone_document(
        &self,
        radius: f64,
        unit: ConeUnit,
        radec: serde_json::Map<String, Value>,
    ) -> QueryDocument {
        QueryDocument::cone_search(
            radius,
            unit,
            radec,
            &[
                (self.catalog_name(Catalog::Features), &self.features_projection),
                (
                    self.catalog_name(Catalog::Classifications),
                    &self.classification_projection,
                ),
            ],
        )
    }

    /// One catalog's records from a cone response. A missing catalog or a
    /// wrongly shaped position entry fails the whole search.
    fn cone_records(
        &self,
        data: &Value,
        catalog: Catalog,
        extract: impl Fn(&Value) -> Option<Vec<Record>>,
    ) -> Option<Vec<Record>> {
        let name = self.catalog_name(catalog);
        let Some(per_position) = data.get(name) else {
            warn!(catalog = name, "catalog absent from cone response");
            return None;
        };
        let records = extract(per_position);
        if records.is_none() {
            warn!(catalog = name, "malformed cone payload");
        }
        records
    }

    // -----------------------------------------------------------------------
    // Identifier lookup
    // -----------------------------------------------------------------------

    /// Look sources up by survey or cross-match identifier.
    ///
    /// The features catalog is queried first because only it carries the
    /// cross-match columns; its `_id`s then select the classifications.
    /// Unlike the cone searches, an empty match yields an empty table rather
    /// than `None`.
    pub async fn ids_search(
        &self,
        ids: impl Into<Ids>,
        id_type: IdType,
    ) -> Result<Option<Table>, ScopeError> {
        let ids = ids.into();
        debug!(n = ids.len(), id_type = %id_type, "looking up ids");

        let features_doc = QueryDocument::aggregate(
            self.catalog_name(Catalog::Features),
            vec![
                match_stage(in_filter(id_type.column(), ids.into_vec())),
                project_stage(&self.features_projection),
            ],
        );
        let Some(features) = self.run_single(&features_doc).await.and_then(|d| {
            self.flat_records(d, Catalog::Features)
        }) else {
            return Ok(None);
        };
        let features = Table::from_records(features);

        let classes_doc = QueryDocument::aggregate(
            self.catalog_name(Catalog::Classifications),
            vec![
                match_stage(in_filter(ID_KEY, features.ids())),
                project_stage(&self.classification_projection),
            ],
        );
        let Some(classifications) = self.run_single(&classes_doc).await.and_then(|d| {
            self.flat_records(d, Catalog::Classifications)
        }) else {
            return Ok(None);
        };

        Ok(Some(features.inner_join(&Table::from_records(classifications), ID_KEY)))
    }

    // -----------------------------------------------------------------------
    // Field-batched searches
    // -----------------------------------------------------------------------

    /// Filter the classifications catalog field by field, then fetch the
    /// features of every surviving source.
    pub async fn search_by_classification<I>(
        &self,
        fields: I,
        filter_stage: Value,
    ) -> Result<BatchOutcome, ScopeError>
    where
        I: IntoIterator,
        I::Item: Into<FieldId>,
    {
        self.two_phase_search(fields, filter_stage, Catalog::Classifications)
            .await
    }

    /// Filter the features catalog field by field, then fetch the
    /// classifications of every surviving source.
    pub async fn search_by_feature<I>(
        &self,
        fields: I,
        filter_stage: Value,
    ) -> Result<BatchOutcome, ScopeError>
    where
        I: IntoIterator,
        I::Item: Into<FieldId>,
    {
        self.two_phase_search(fields, filter_stage, Catalog::Features)
            .await
    }

    async fn two_phase_search<I>(
        &self,
        fields: I,
        filter_stage: Value,
        first: Catalog,
    ) -> Result<BatchOutcome, ScopeError>
    where
        I: IntoIterator,
        I::Item: Into<FieldId>,
    {
        let fields: Vec<FieldId> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(ScopeError::EmptyFields);
        }
        let mut failures = Vec::new();

        let first_stages = [match_stage(filter_stage), project_stage(self.projection(first))];
        let first_records = self
            .batched_records(&fields, &first_stages, first, &mut failures)
            .await;
        let first_table = Table::from_records(first_records);

        // Phase 2 is re-batched by the same fields even though it filters on
        // `_id`; each sub-query still scans only one field's sources.
        let second = first.other();
        let second_stages = [
            match_stage(in_filter(ID_KEY, first_table.ids())),
            project_stage(self.projection(second)),
        ];
        let second_table = Table::from_records(
            self.batched_records(&fields, &second_stages, second, &mut failures)
                .await,
        );

        let table = match first {
            Catalog::Features => first_table.inner_join(&second_table, ID_KEY),
            Catalog::Classifications => second_table.inner_join(&first_table, ID_KEY),
        };
        Ok(BatchOutcome { table, failures })
    }

    /// Issue one aggregate per field (`[match field] + stages`) as a single
    /// batch, bounded by the configured thread cap. Returns the raw
    /// per-sub-query responses in `fields` order, or `None` if the batch as a
    /// whole could not be dispatched.
    pub async fn batch_over_fields_aggregate(
        &self,
        fields: &[FieldId],
        stages: &[Value],
        catalog: Catalog,
    ) -> Option<Vec<QueryResponse>> {
        let docs = field_batched_pipelines(self.catalog_name(catalog), fields, stages);
        let result = self
            .service
            .batch_query(&docs, self.config.service.max_n_threads)
            .await;
        match result {
            Ok(resp) => self.take_response(resp),
            Err(e) => {
                warn!(catalog = self.catalog_name(catalog), error = %e, "batch query failed");
                None
            }
        }
    }

    /// Flatten a batch into records in dispatch order, skipping (and
    /// recording) every sub-query that failed.
    async fn batched_records(
        &self,
        fields: &[FieldId],
        stages: &[Value],
        catalog: Catalog,
        failures: &mut Vec<SubQueryFailure>,
    ) -> Vec<Record> {
        let catalog_name = self.catalog_name(catalog);
        let mut fail = |field: &FieldId, message: String| {
            warn!(field = %field, catalog = catalog_name, reason = %message, "query failed for field");
            failures.push(SubQueryFailure {
                field: field.clone(),
                catalog: catalog_name.to_string(),
                message,
            });
        };

        let Some(responses) = self.batch_over_fields_aggregate(fields, stages, catalog).await
        else {
            for field in fields {
                fail(field, "batch could not be dispatched".to_string());
            }
            return Vec::new();
        };

        let mut records = Vec::new();
        let mut responses = responses.into_iter();
        for field in fields {
            match responses.next() {
                Some(resp) if resp.is_success() => match resp.data.as_ref().and_then(as_records) {
                    Some(mut batch) => records.append(&mut batch),
                    None => fail(field, "malformed data payload".to_string()),
                },
                Some(resp) => fail(field, resp.message_or_default().to_string()),
                None => fail(field, "no response for sub-query".to_string()),
            }
        }
        debug!(catalog = catalog_name, n = records.len(), "flattened batch");
        records
    }

    // -----------------------------------------------------------------------
    // Index metadata
    // -----------------------------------------------------------------------

    /// Raw index metadata, `(classifications, features)`. Each side is `None`
    /// if its query failed.
    pub async fn get_indices(&self) -> (Option<Value>, Option<Value>) {
        let classes = QueryDocument::info(
            self.catalog_name(Catalog::Classifications),
            INDEX_INFO_COMMAND,
        );
        let features = QueryDocument::info(self.catalog_name(Catalog::Features), INDEX_INFO_COMMAND);
        (
            self.run_single(&classes).await,
            self.run_single(&features).await,
        )
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    /// Run one query; `Some(data)` only on a successful response.
    async fn run_single(&self, doc: &QueryDocument) -> Option<Value> {
        let resp = match self.service.query(doc).await {
            Ok(resp) => self.take_response(resp)?,
            Err(e) => {
                warn!(error = %e, query_type = ?doc.query_type, "query failed");
                return None;
            }
        };
        if !resp.is_success() {
            warn!(reason = resp.message_or_default(), query_type = ?doc.query_type, "query failed");
            return None;
        }
        match resp.data {
            Some(data) => Some(data),
            None => {
                warn!(query_type = ?doc.query_type, "successful response carried no data");
                None
            }
        }
    }

    fn take_response<T>(&self, mut resp: ServiceResponse<T>) -> Option<T> {
        let key = &self.config.service.response_key;
        let taken = resp.remove(key);
        if taken.is_none() {
            warn!(instance = %key, "no response from instance");
        }
        taken
    }

    fn flat_records(&self, data: Value, catalog: Catalog) -> Option<Vec<Record>> {
        let records = as_records(&data);
        if records.is_none() {
            warn!(catalog = self.catalog_name(catalog), "malformed data payload");
        }
        records
    }
}

fn validate_radius(radius: f64) -> Result<(), ScopeError> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(ScopeError::InvalidArgument(format!(
            "cone radius must be a finite non-negative number, got {radius}"
        )))
    }
}

/// A JSON array of objects as records. Anything else is malformed.
fn as_records(value: &Value) -> Option<Vec<Record>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_object().cloned())
        .collect()
}

fn records_at(per_position: &Value, key: &str) -> Option<Vec<Record>> {
    as_records(per_position.get(key)?)
}

/// Every position's records, concatenated in response order. One malformed
/// position makes the whole payload malformed.
fn concat_positions(per_position: &Value) -> Option<Vec<Record>> {
    let mut records = Vec::new();
    for batch in per_position.as_object()?.values() {
        records.append(&mut as_records(batch)?);
    }
    Some(records)
}

fn join_nonempty(features: Vec<Record>, classifications: Vec<Record>) -> Option<Table> {
    if features.is_empty() || classifications.is_empty() {
        info!("no sources found");
        return None;
    }
    Some(Table::from_records(features).inner_join(&Table::from_records(classifications), ID_KEY))
}
