use hyper::StatusCode;
use thiserror::Error;

/// Reasons a click-tracking request is rejected
///
/// Every variant is a client error local to the request.
#[derive(Error, Debug)]
pub enum ClickError {
    #[error("Missing payload")]
    MissingPayload,

    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("invalid payload envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("invalid redirect descriptor: {0}")]
    InvalidDescriptor(#[source] serde_json::Error),

    #[error("invalid redirect url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Domain in route does not match domain in payload")]
    DomainMismatch,

    #[error("URL in payload is not considered safe")]
    UnsafeHost,
}

impl ClickError {
    /// Short, stable name used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ClickError::MissingPayload => "missing_payload",
            ClickError::InvalidEncoding(_) => "invalid_encoding",
            ClickError::InvalidEnvelope(_) => "invalid_envelope",
            ClickError::InvalidDescriptor(_) => "invalid_descriptor",
            ClickError::InvalidUrl(_) => "invalid_url",
            ClickError::DomainMismatch => "domain_mismatch",
            ClickError::UnsafeHost => "unsafe_host",
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
