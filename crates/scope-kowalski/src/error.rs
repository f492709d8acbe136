use thiserror::Error;

/// Failures talking to a Kowalski instance. None of these escape the query
/// client; they are logged and turned into absent or partial results.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no Kowalski instances configured")]
    NoInstances,

    #[error("unknown Kowalski instance: {0}")]
    UnknownInstance(String),

    #[error("no access token for host {0}")]
    MissingToken(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not decode service response: {0}")]
    Decode(#[from] serde_json::Error),
}
