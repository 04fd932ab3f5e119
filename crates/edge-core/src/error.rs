//! # Edge Error Types
//!
//! Typed error handling for the payment edge router.
//! Every handler returns `Result<T, EdgeError>`; the dispatcher turns any
//! failure into a 500 whose body is the error's `Display` text. Client
//! mistakes a handler can answer itself (an unknown product) are ordinary
//! responses, not errors.

use thiserror::Error;

/// Core error type for routing and forwarding
#[derive(Debug, Error)]
pub enum EdgeError {
    /// Configuration errors (bad catalog, invalid values)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A route pattern that does not compile
    #[error("Invalid route pattern `{pattern}`: {message}")]
    InvalidRoutePattern { pattern: String, message: String },

    /// Request body is not the JSON the handler expects
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    /// Request body could not be read
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A required environment binding (SERVICE, APIKEY, ASSETS) is not configured
    #[error("Missing environment binding: {0}")]
    MissingBinding(&'static str),

    /// Network/HTTP error talking to the upstream payment service
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// Upstream answered with something that is not JSON
    #[error("Invalid upstream response: {0}")]
    UpstreamResponse(String),

    /// Static asset collaborator failure
    #[error("Asset error: {0}")]
    Asset(String),
}

impl From<serde_json::Error> for EdgeError {
    fn from(err: serde_json::Error) -> Self {
        EdgeError::InvalidJson(err.to_string())
    }
}

/// Result type alias for edge operations
pub type EdgeResult<T> = Result<T, EdgeError>;
