//! Scripted in-memory query service.
//!
//! Every submitted document is answered by a caller-supplied handler and
//! recorded for later inspection. Batched sub-queries can be given per-query
//! delays so they complete out of dispatch order; run such tests under
//! `#[tokio::test(start_paused = true)]`.
//!
//! # Example
//!
//! ```rust,no_run
//! let stub = StubService::new(|doc| rows_response(vec![feature_row(1)]));
//! let client = ScopeClient::with_service(stub, test_config());
//! ```

use futures::future::join_all;
use scope::{QueryResponse, QueryService, ServiceError};
use scope_core::QueryDocument;
use scope_kowalski::ServiceResponse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::fixtures::INSTANCE;

type Handler = Box<dyn Fn(&QueryDocument) -> QueryResponse + Send + Sync>;
type Delay = Box<dyn Fn(&QueryDocument) -> Duration + Send + Sync>;

/// What the stub saw, shared so tests can keep a handle after the stub is
/// moved into a client.
#[derive(Debug, Default)]
pub struct Recorded {
    pub queries: Vec<QueryDocument>,
    /// One entry per batch call: (batch size, max_n_threads).
    pub batches: Vec<(usize, usize)>,
    /// Batched sub-query indices in completion order.
    pub completion_order: Vec<usize>,
}

pub struct StubService {
    instance: String,
    handler: Handler,
    delay: Option<Delay>,
    unreachable: bool,
    recorded: Arc<Mutex<Recorded>>,
}

impl StubService {
    pub fn new(handler: impl Fn(&QueryDocument) -> QueryResponse + Send + Sync + 'static) -> Self {
        Self {
            instance: INSTANCE.to_string(),
            handler: Box::new(handler),
            delay: None,
            unreachable: false,
            recorded: Arc::default(),
        }
    }

    /// A service every call to which fails at the transport level.
    pub fn unreachable() -> Self {
        let mut stub = Self::new(|_| QueryResponse::failure("unreachable"));
        stub.unreachable = true;
        stub
    }

    /// Answer under a different instance name than the client reads from.
    pub fn answering_as(mut self, instance: &str) -> Self {
        self.instance = instance.to_string();
        self
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&QueryDocument) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn recorded(&self) -> Arc<Mutex<Recorded>> {
        Arc::clone(&self.recorded)
    }

    fn transport_error() -> ServiceError {
        ServiceError::Status {
            code: 503,
            body: "service unavailable".to_string(),
        }
    }
}

impl QueryService for StubService {
    async fn query(
        &self,
        query: &QueryDocument,
    ) -> Result<ServiceResponse<QueryResponse>, ServiceError> {
        self.recorded.lock().unwrap().queries.push(query.clone());
        if self.unreachable {
            return Err(Self::transport_error());
        }
        Ok(HashMap::from([(self.instance.clone(), (self.handler)(query))]))
    }

    async fn batch_query(
        &self,
        queries: &[QueryDocument],
        max_n_threads: usize,
    ) -> Result<ServiceResponse<Vec<QueryResponse>>, ServiceError> {
        {
            let mut rec = self.recorded.lock().unwrap();
            rec.queries.extend(queries.iter().cloned());
            rec.batches.push((queries.len(), max_n_threads));
        }
        if self.unreachable {
            return Err(Self::transport_error());
        }

        let pending = queries.iter().enumerate().map(|(i, query)| async move {
            if let Some(delay) = &self.delay {
                tokio::time::sleep(delay(query)).await;
            }
            self.recorded.lock().unwrap().completion_order.push(i);
            (self.handler)(query)
        });
        let responses = join_all(pending).await;
        Ok(HashMap::from([(self.instance.clone(), responses)]))
    }
}
