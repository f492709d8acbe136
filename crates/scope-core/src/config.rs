//! Configuration types for scope.
//!
//! [`Config::load`] reads `~/.config/scope/config.toml`, creating it with the
//! built-in defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).
//!
//! The projection key lists live in the embedded TOML rather than in code so
//! a user file can narrow or extend the columns fetched from either catalog.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::Catalog;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[service]
hosts         = ["gloria"]
response_key  = "gloria"
protocol      = "https"
port          = 443
domain        = "caltech.edu"
timeout_ms    = 120000
max_n_threads = 4

[catalogs]
features        = "ZTF_source_features_DR16"
classifications = "ZTF_source_classifications_DR16"

[projection]
features = [
    "_id", "mean", "amplitude",
    "period_ELS", "significance_ELS",
    "period_ECE", "significance_ECE",
    "period_EAOV", "significance_EAOV",
    "period_ELS_ECE_EAOV", "significance_ELS_ECE_EAOV",
    "AllWISE___id", "AllWISE__w1mpro",
    "AllWISE__w1sigmpro", "AllWISE__w2mpro",
    "AllWISE__w2sigmpro", "AllWISE__w3mpro",
    "AllWISE__w3sigmpro", "AllWISE__w4mpro",
    "AllWISE__w4sigmpro", "AllWISE__ph_qual",
    "Gaia_EDR3___id", "Gaia_EDR3__phot_g_mean_mag",
    "Gaia_EDR3__phot_bp_mean_mag", "Gaia_EDR3__phot_rp_mean_mag",
    "Gaia_EDR3__parallax", "Gaia_EDR3__parallax_error",
    "Gaia_EDR3__pmra", "Gaia_EDR3__pmra_error", "Gaia_EDR3__pmdec",
    "Gaia_EDR3__pmdec_error", "Gaia_EDR3__astrometric_excess_noise",
    "Gaia_EDR3__phot_bp_rp_excess_factor",
    "PS1_DR1___id", "PS1_DR1__gMeanPSFMag",
    "PS1_DR1__gMeanPSFMagErr", "PS1_DR1__rMeanPSFMag",
    "PS1_DR1__rMeanPSFMagErr", "PS1_DR1__iMeanPSFMag",
    "PS1_DR1__iMeanPSFMagErr", "PS1_DR1__zMeanPSFMag",
    "PS1_DR1__zMeanPSFMagErr", "PS1_DR1__yMeanPSFMag",
    "PS1_DR1__yMeanPSFMagErr", "PS1_DR1__qualityFlag",
]
classifications = [
    "_id", "ra", "dec", "period", "field", "ccd", "quad", "filter",
    "e_dnn", "dscu_dnn", "dp_dnn", "mir_dnn", "rrc_dnn", "agn_dnn", "puls_dnn",
    "bogus_dnn", "rscvn_dnn", "wvir_dnn", "lpv_dnn", "rrlyr_dnn", "rrd_dnn", "emsms_dnn",
    "mp_dnn", "ew_dnn", "bis_dnn", "blher_dnn", "srv_dnn", "fla_dnn", "i_dnn", "ceph2_dnn",
    "ea_dnn", "wuma_dnn", "rrblz_dnn", "ceph_dnn", "osarg_dnn", "ext_dnn", "bright_dnn",
    "el_dnn", "dip_dnn", "vnv_dnn", "cv_dnn", "pnp_dnn", "sin_dnn", "blend_dnn", "eb_dnn",
    "wp_dnn", "rrab_dnn", "hp_dnn", "blyr_dnn", "saw_dnn", "longt_dnn", "yso_dnn",
    "blend_xgb", "hp_xgb", "bis_xgb", "wp_xgb", "eb_xgb", "ceph_xgb", "bright_xgb",
    "wuma_xgb", "longt_xgb", "rrd_xgb", "ceph2_xgb", "osarg_xgb", "rrblz_xgb", "blyr_xgb",
    "ea_xgb", "lpv_xgb", "agn_xgb", "el_xgb", "e_xgb", "rrab_xgb", "cv_xgb", "mir_xgb",
    "rrc_xgb", "mp_xgb", "yso_xgb", "wvir_xgb", "saw_xgb", "puls_xgb", "ew_xgb", "sin_xgb",
    "blher_xgb", "dscu_xgb", "dp_xgb", "vnv_xgb", "pnp_xgb", "bogus_xgb", "dip_xgb",
    "i_xgb", "rscvn_xgb", "ext_xgb", "emsms_xgb", "srv_xgb", "rrlyr_xgb", "fla_xgb",
]
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/scope/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub catalogs: CatalogsConfig,
    pub projection: ProjectionConfig,
}

/// `[service]` section: where the Kowalski instances live and how to talk to them.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    /// Instance name the query responses are read from.
    #[serde(default = "default_response_key")]
    pub response_key: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Appended to each host name: `<host>.<domain>`. Empty means use the
    /// host name as-is.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_n_threads")]
    pub max_n_threads: usize,
}

fn default_hosts() -> Vec<String> { vec!["gloria".to_string()] }
fn default_response_key() -> String { "gloria".to_string() }
fn default_protocol() -> String { "https".to_string() }
fn default_port() -> u16 { 443 }
fn default_domain() -> String { "caltech.edu".to_string() }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_max_n_threads() -> usize { 4 }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            response_key: default_response_key(),
            protocol: default_protocol(),
            port: default_port(),
            domain: default_domain(),
            timeout_ms: default_timeout_ms(),
            max_n_threads: default_max_n_threads(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Store `timeout`, rounding any sub-millisecond remainder up so a
    /// non-zero timeout never becomes zero.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout_ms = u64::try_from(timeout.as_micros().div_ceil(1000)).unwrap_or(u64::MAX);
    }

    /// Fully qualified host name for a configured instance.
    pub fn qualified_host(&self, host: &str) -> String {
        if self.domain.is_empty() {
            host.to_string()
        } else {
            format!("{host}.{}", self.domain)
        }
    }
}

/// `[catalogs]` section: remote collection names.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogsConfig {
    #[serde(default = "default_features_catalog")]
    pub features: String,
    #[serde(default = "default_classifications_catalog")]
    pub classifications: String,
}

fn default_features_catalog() -> String { "ZTF_source_features_DR16".to_string() }
fn default_classifications_catalog() -> String { "ZTF_source_classifications_DR16".to_string() }

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            features: default_features_catalog(),
            classifications: default_classifications_catalog(),
        }
    }
}

impl CatalogsConfig {
    pub fn name(&self, catalog: Catalog) -> &str {
        match catalog {
            Catalog::Features => &self.features,
            Catalog::Classifications => &self.classifications,
        }
    }
}

/// `[projection]` section: the field names requested from each catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionConfig {
    pub features: Vec<String>,
    pub classifications: Vec<String>,
}

impl ProjectionConfig {
    pub fn keys(&self, catalog: Catalog) -> &[String] {
        match catalog {
            Catalog::Features => &self.features,
            Catalog::Classifications => &self.classifications,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/scope/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Layer an explicit file over the built-in defaults. A missing file is
    /// an error here, unlike [`Config::load`].
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("scope")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
