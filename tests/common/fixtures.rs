//! Catalog names, configuration and canned rows used across harnesses.

use scope::Config;
use serde_json::{json, Value};

pub const FEATURES: &str = "ZTF_source_features_DR16";
pub const CLASSIFICATIONS: &str = "ZTF_source_classifications_DR16";

/// Instance name the stub and fake services answer under.
pub const INSTANCE: &str = "gloria";

/// Built-in defaults; the projections are the full catalog key lists.
pub fn test_config() -> Config {
    Config::defaults()
}

/// A features row with a Gaia cross-match id of `id + 1_000_000`.
pub fn feature_row(id: i64) -> Value {
    json!({
        "_id": id,
        "mean": 15.0 + id as f64 / 100.0,
        "period_ELS": 0.5,
        "AllWISE___id": format!("wise-{id}"),
        "Gaia_EDR3___id": id + 1_000_000,
        "PS1_DR1___id": null,
    })
}

/// A classifications row in the given survey field.
pub fn class_row(id: i64, field: impl Into<Value>) -> Value {
    json!({
        "_id": id,
        "ra": 10.0,
        "dec": 20.0,
        "field": field.into(),
        "vnv_dnn": 0.97,
        "vnv_xgb": 0.91,
    })
}
