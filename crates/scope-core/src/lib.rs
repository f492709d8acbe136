//! scope-core — data model for the SCoPe catalog client.
//!
//! This crate holds everything that does not touch the network: query
//! document construction, the projection configuration, argument types and
//! the table join used to merge the two catalogs.
//!
//! # Data flow
//!
//! ```text
//! Config ──► Projection ──► QueryDocument ──► (service) ──► Records ──► Table::inner_join
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod table;
pub mod types;

pub use error::ScopeError;
pub use query::{Projection, QueryDocument, QueryType};
pub use table::Table;
pub use types::{Catalog, ConeUnit, FieldId, IdType, Ids, Position, Record, ID_KEY};
