//! Error types for the tile proxy services.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile operations.
#[derive(Debug, Error)]
pub enum TileError {
    // === Request / Catalog Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer '{0}' requires a date (query ?date=YYYY-MM-DD)")]
    MissingRequiredDate(String),

    #[error("Malformed layer key '{0}': trek layers must follow 'trek:Body:Layer'")]
    MalformedLayerKey(String),

    #[error("Unsupported layer kind: {0}")]
    UnsupportedLayerKind(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    // === Upstream Errors ===
    #[error("Upstream timed out fetching {url}: {message}")]
    UpstreamTimeout { url: String, message: String },

    #[error("Upstream unreachable at {url}: {message}")]
    UpstreamUnreachable { url: String, message: String },

    #[error("Upstream rejected request with HTTP {status}: {url}")]
    UpstreamRejected { status: u16, url: String },

    // === Storage Errors ===
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl TileError {
    /// Machine-readable code reported to API clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            TileError::LayerNotFound(_) => "layer_not_found",
            TileError::MissingRequiredDate(_) => "missing_date",
            TileError::MalformedLayerKey(_) => "invalid_layer_key",
            TileError::UnsupportedLayerKind(_) => "unknown_layer_kind",
            TileError::InvalidParameter { .. } => "invalid_parameter",
            TileError::RateLimited => "too_many_requests",
            TileError::UpstreamTimeout { .. } => "nasa_timeout",
            TileError::UpstreamUnreachable { .. } => "nasa_connection_error",
            TileError::UpstreamRejected { .. } => "nasa_bad_response",
            _ => "internal_error",
        }
    }

    /// Coarse status label used alongside the code in error bodies.
    pub fn status_label(&self) -> &'static str {
        match self {
            TileError::LayerNotFound(_) => "not_found",
            TileError::MissingRequiredDate(_)
            | TileError::MalformedLayerKey(_)
            | TileError::UnsupportedLayerKind(_)
            | TileError::InvalidParameter { .. } => "invalid",
            TileError::RateLimited => "rate_limited",
            TileError::UpstreamTimeout { .. } => "timeout",
            _ => "error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            TileError::MissingRequiredDate(_)
            | TileError::MalformedLayerKey(_)
            | TileError::UnsupportedLayerKind(_)
            | TileError::InvalidParameter { .. } => 400,

            TileError::LayerNotFound(_) => 404,

            TileError::RateLimited => 429,

            TileError::UpstreamUnreachable { .. } | TileError::UpstreamRejected { .. } => 502,
            TileError::UpstreamTimeout { .. } => 504,

            _ => 500,
        }
    }

    /// True for failures caused by the upstream tile provider.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            TileError::UpstreamTimeout { .. }
                | TileError::UpstreamUnreachable { .. }
                | TileError::UpstreamRejected { .. }
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for TileError {
    fn from(err: std::io::Error) -> Self {
        TileError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        TileError::CacheError(format!("JSON error: {}", err))
    }
}
