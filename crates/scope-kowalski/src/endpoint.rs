//! Connection details for one Kowalski instance.

use scope_core::config::ServiceConfig;
use std::collections::HashMap;

use crate::error::ServiceError;

/// Path the query API is served under.
const QUERIES_PATH: &str = "/api/queries";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Short instance name, e.g. `gloria`. Responses are keyed by it.
    pub name: String,
    pub protocol: String,
    /// Fully qualified host, e.g. `gloria.caltech.edu`.
    pub host: String,
    pub port: u16,
    pub token: String,
}

impl Endpoint {
    pub fn queries_url(&self) -> String {
        format!("{}://{}:{}{}", self.protocol, self.host, self.port, QUERIES_PATH)
    }

    /// One endpoint per configured host, following the service's
    /// protocol/port/domain conventions. Every host needs a token.
    pub fn from_config(
        service: &ServiceConfig,
        tokens: &HashMap<String, String>,
    ) -> Result<Vec<Endpoint>, ServiceError> {
        service
            .hosts
            .iter()
            .map(|host| {
                let token = tokens
                    .get(host)
                    .ok_or_else(|| ServiceError::MissingToken(host.clone()))?;
                Ok(Endpoint {
                    name: host.clone(),
                    protocol: service.protocol.clone(),
                    host: service.qualified_host(host),
                    port: service.port,
                    token: token.clone(),
                })
            })
            .collect()
    }
}
