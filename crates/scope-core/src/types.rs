//! Core types for scope-core.
//!
//! This module defines the argument types shared by every query shape: the
//! cone-search [`ConeUnit`], the cross-match [`IdType`], the astronomical
//! [`FieldId`] used as a batching key, and the [`Catalog`] discriminant.

use crate::error::ScopeError;
use serde_json::Value;
use std::str::FromStr;

/// One catalog row as returned by the service: field name to scalar value.
pub type Record = serde_json::Map<String, Value>;

/// Join key shared by both catalogs.
pub const ID_KEY: &str = "_id";

/// Sky position in degrees, `(ra, dec)`.
pub type Position = (f64, f64);

/// Default cone radius used by the single-position search.
pub const DEFAULT_CONE_RADIUS: f64 = 2.0;

/// Angular unit of a cone-search radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConeUnit {
    Deg,
    Arcmin,
    #[default]
    Arcsec,
}

impl ConeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConeUnit::Deg => "deg",
            ConeUnit::Arcmin => "arcmin",
            ConeUnit::Arcsec => "arcsec",
        }
    }
}

impl std::fmt::Display for ConeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConeUnit {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deg" => Ok(ConeUnit::Deg),
            "arcmin" => Ok(ConeUnit::Arcmin),
            "arcsec" => Ok(ConeUnit::Arcsec),
            other => Err(ScopeError::InvalidUnit(other.to_string())),
        }
    }
}

/// Identifier column an `ids_search` matches against.
///
/// Only the features catalog carries the cross-match identifiers, so every
/// lookup goes through it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdType {
    /// Survey-assigned source id.
    #[default]
    Ztf,
    AllWise,
    GaiaEdr3,
    Ps1Dr1,
}

impl IdType {
    /// Column name in the features catalog.
    pub fn column(&self) -> &'static str {
        match self {
            IdType::Ztf => "_id",
            IdType::AllWise => "AllWISE___id",
            IdType::GaiaEdr3 => "Gaia_EDR3___id",
            IdType::Ps1Dr1 => "PS1_DR1___id",
        }
    }
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for IdType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_id" => Ok(IdType::Ztf),
            "AllWISE___id" => Ok(IdType::AllWise),
            "Gaia_EDR3___id" => Ok(IdType::GaiaEdr3),
            "PS1_DR1___id" => Ok(IdType::Ps1Dr1),
            other => Err(ScopeError::InvalidIdType(other.to_string())),
        }
    }
}

/// One or more source identifiers. A scalar is normalised to a
/// single-element list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ids(Vec<Value>);

impl Ids {
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for Ids {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Ids(items),
            scalar => Ids(vec![scalar]),
        }
    }
}

impl From<i64> for Ids {
    fn from(id: i64) -> Self {
        Ids(vec![Value::from(id)])
    }
}

impl From<u64> for Ids {
    fn from(id: u64) -> Self {
        Ids(vec![Value::from(id)])
    }
}

impl From<&str> for Ids {
    fn from(id: &str) -> Self {
        Ids(vec![Value::from(id)])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Ids {
    fn from(ids: Vec<T>) -> Self {
        Ids(ids.into_iter().map(Into::into).collect())
    }
}

/// Survey sky-tiling field, used only as a batching key.
///
/// ZTF fields are integers, but the service accepts whatever value the
/// `field` column holds, so any JSON scalar is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldId(Value);

impl FieldId {
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<i64> for FieldId {
    fn from(field: i64) -> Self {
        FieldId(Value::from(field))
    }
}

impl From<u32> for FieldId {
    fn from(field: u32) -> Self {
        FieldId(Value::from(field))
    }
}

impl From<&str> for FieldId {
    fn from(field: &str) -> Self {
        FieldId(Value::from(field))
    }
}

impl From<String> for FieldId {
    fn from(field: String) -> Self {
        FieldId(Value::from(field))
    }
}

/// Which of the two remote catalogs a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Catalog {
    Features,
    Classifications,
}

impl Catalog {
    /// The catalog queried in the second phase of a two-phase search.
    pub fn other(&self) -> Catalog {
        match self {
            Catalog::Features => Catalog::Classifications,
            Catalog::Classifications => Catalog::Features,
        }
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Catalog::Features => write!(f, "features"),
            Catalog::Classifications => write!(f, "classifications"),
        }
    }
}
