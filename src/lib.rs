//! scope — query client for the ZTF SCoPe catalogs served by Kowalski.
//!
//! Every public operation builds query documents, submits them through a
//! [`QueryService`](scope_kowalski::QueryService), and joins the features and
//! classifications catalogs on `_id` into a [`Table`].
//!
//! # Architecture
//!
//! ```text
//! scope-core ──► ScopeClient ──► scope-kowalski ──► Kowalski (HTTPS)
//!  (documents,      (fan-out,        (transport,
//!   join, config)    reassembly)      batching)
//! ```
//!
//! The client holds only immutable configuration and projections, so one
//! instance can be shared across tasks.

pub mod client;

pub use client::{BatchOutcome, ScopeClient, SubQueryFailure};
pub use scope_core::config::Config;
pub use scope_core::{Catalog, ConeUnit, FieldId, IdType, Ids, Position, ScopeError, Table};
pub use scope_kowalski::{Endpoint, Kowalski, QueryResponse, QueryService, ServiceError};
