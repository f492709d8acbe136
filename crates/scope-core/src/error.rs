//! Argument-validation errors.
//!
//! These are the only errors the query client hands back to its caller.
//! Remote failures are logged and folded into absent or partial results
//! instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("unit must be \"deg\", \"arcmin\" or \"arcsec\", got {0:?}")]
    InvalidUnit(String),

    #[error("id_type must be one of [\"_id\", \"AllWISE___id\", \"Gaia_EDR3___id\", \"PS1_DR1___id\"], got {0:?}")]
    InvalidIdType(String),

    #[error("fields must be a non-empty list")]
    EmptyFields,

    #[error("positions must be a non-empty list")]
    EmptyPositions,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
