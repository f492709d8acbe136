//! scope-kowalski — the remote query service boundary for scope.
//!
//! The query client only ever sees the [`QueryService`] trait: submit one
//! document, or a batch of independent documents fanned out over at most
//! `max_n_threads` concurrent requests. [`Kowalski`] is the HTTPS
//! implementation; tests substitute scripted stubs.

pub mod endpoint;
pub mod error;
pub mod kowalski;
pub mod response;

pub use endpoint::Endpoint;
pub use error::ServiceError;
pub use kowalski::Kowalski;
pub use response::{QueryResponse, ServiceResponse, STATUS_SUCCESS};

use scope_core::QueryDocument;
use std::future::Future;

/// Narrow interface onto a remote query service.
///
/// Both calls return responses keyed by instance name. Within a batch the
/// response vector is in dispatch order, whatever order the sub-queries
/// completed in, and a failed sub-query occupies its slot as a failed
/// [`QueryResponse`] rather than aborting the batch.
pub trait QueryService: Send + Sync {
    fn query(
        &self,
        query: &QueryDocument,
    ) -> impl Future<Output = Result<ServiceResponse<QueryResponse>, ServiceError>> + Send;

    fn batch_query(
        &self,
        queries: &[QueryDocument],
        max_n_threads: usize,
    ) -> impl Future<Output = Result<ServiceResponse<Vec<QueryResponse>>, ServiceError>> + Send;
}
