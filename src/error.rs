use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The subject entity itself could not be read. The only error that
    /// aborts an aggregation.
    #[error("entity {entity_id} is unavailable")]
    EntityUnavailable { entity_id: String },

    #[error("record not found")]
    NotFound,

    /// A secondary source failed and its fallback value was used instead.
    /// Never surfaced past the fetcher boundary. The field is `name`, not
    /// `source`, so thiserror does not treat it as an error chain.
    #[error("source {name} degraded: {message}")]
    SourceDegraded {
        name: &'static str,
        message: String,
    },

    #[error("identity lookup degraded: {message}")]
    IdentityLookupDegraded { message: String },

    /// A single raw record failed normalization. The batch continues
    /// without it.
    #[error("malformed record {record_id}: {reason}")]
    MalformedRecord { record_id: String, reason: String },

    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("upstream request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn entity_unavailable(entity_id: impl Into<String>, cause: &AppError) -> Self {
        let entity_id = entity_id.into();
        error!(target: "app::fetch", %entity_id, cause = %cause, "entity detail read failed");
        AppError::EntityUnavailable { entity_id }
    }

    pub fn not_found() -> Self {
        AppError::NotFound
    }

    pub fn source_degraded(source: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::fetch", source, %message, "source degraded");
        AppError::SourceDegraded {
            name: source,
            message,
        }
    }

    pub fn identity_lookup_degraded(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::identity", %message, "identity lookup degraded");
        AppError::IdentityLookupDegraded { message }
    }

    pub fn malformed_record(record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let record_id = record_id.into();
        let reason = reason.into();
        warn!(target: "app::normalize", %record_id, %reason, "malformed record skipped");
        AppError::MalformedRecord { record_id, reason }
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::backend", status, %message, "upstream error");
        AppError::Upstream { status, message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "unexpected error");
        AppError::Other(message)
    }

    /// True for failures worth retrying at the caller (transient I/O),
    /// false for definitive ones.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::Network(_))
            || matches!(self, AppError::Upstream { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AppError::Timeout(error.to_string())
        } else if error.is_connect() {
            AppError::Network(error.to_string())
        } else if let Some(status) = error.status() {
            AppError::Upstream {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            AppError::Other(error.to_string())
        }
    }
}
