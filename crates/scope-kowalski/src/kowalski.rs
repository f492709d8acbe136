//! HTTPS client for Kowalski instances.
//!
//! Every document is `POST`ed as JSON to `/api/queries` with a bearer token.
//! Batches are dispatched through a bounded `buffered` stream, so at most
//! `max_n_threads` requests are in flight and results are yielded in
//! dispatch order.

use futures::stream::{self, StreamExt};
use scope_core::config::ServiceConfig;
use scope_core::QueryDocument;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::ServiceError;
use crate::response::{QueryResponse, ServiceResponse};
use crate::QueryService;

/// Handle onto one or more Kowalski instances sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct Kowalski {
    http: reqwest::Client,
    endpoints: Vec<Endpoint>,
    /// Index into `endpoints` of the instance queries are sent to.
    default: usize,
}

impl Kowalski {
    pub fn new(endpoints: Vec<Endpoint>, timeout: Duration) -> Result<Self, ServiceError> {
        if endpoints.is_empty() {
            return Err(ServiceError::NoInstances);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoints,
            default: 0,
        })
    }

    /// Build from the `[service]` configuration, one endpoint per host.
    pub fn from_config(
        service: &ServiceConfig,
        tokens: &HashMap<String, String>,
    ) -> Result<Self, ServiceError> {
        let endpoints = Endpoint::from_config(service, tokens)?;
        Self::new(endpoints, service.timeout())?.with_default_instance(&service.response_key)
    }

    /// Send queries to the named instance instead of the first one.
    pub fn with_default_instance(mut self, name: &str) -> Result<Self, ServiceError> {
        self.default = self
            .endpoints
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| ServiceError::UnknownInstance(name.to_string()))?;
        Ok(self)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn default_instance(&self) -> &Endpoint {
        &self.endpoints[self.default]
    }

    async fn post(&self, endpoint: &Endpoint, query: &QueryDocument) -> Result<QueryResponse, ServiceError> {
        let resp = self
            .http
            .post(endpoint.queries_url())
            .bearer_auth(&endpoint.token)
            .json(query)
            .send()
            .await?;

        let code = resp.status();
        let body = resp.text().await?;
        if !code.is_success() {
            // Kowalski reports query errors with a JSON envelope and a 4xx/5xx
            // status; anything else is a transport-level failure.
            return match serde_json::from_str::<QueryResponse>(&body) {
                Ok(parsed) => Ok(parsed),
                Err(_) => Err(ServiceError::Status {
                    code: code.as_u16(),
                    body,
                }),
            };
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl QueryService for Kowalski {
    async fn query(
        &self,
        query: &QueryDocument,
    ) -> Result<ServiceResponse<QueryResponse>, ServiceError> {
        let endpoint = self.default_instance();
        debug!(instance = %endpoint.name, query_type = ?query.query_type, "dispatching query");
        let response = self.post(endpoint, query).await?;
        Ok(HashMap::from([(endpoint.name.clone(), response)]))
    }

    async fn batch_query(
        &self,
        queries: &[QueryDocument],
        max_n_threads: usize,
    ) -> Result<ServiceResponse<Vec<QueryResponse>>, ServiceError> {
        let endpoint = self.default_instance();
        let limit = max_n_threads.max(1);
        debug!(instance = %endpoint.name, n = queries.len(), limit, "dispatching batch");

        let pending: Vec<_> = queries
            .iter()
            .enumerate()
            .map(|(i, query)| async move {
                match self.post(endpoint, query).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(instance = %endpoint.name, index = i, error = %e, "batched query failed");
                        QueryResponse::failure(e.to_string())
                    }
                }
            })
            .collect();
        let responses: Vec<QueryResponse> = stream::iter(pending).buffered(limit).collect().await;

        Ok(HashMap::from([(endpoint.name.clone(), responses)]))
    }
}
