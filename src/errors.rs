use thiserror::Error;

/// Error type shared by the service and store layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input rejected before any write was attempted.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The referenced row no longer exists. Distinct from validation.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Generic backend or transport failure; the caller may retry.
    #[error("backend failure: {0}")]
    Backend(String),
    /// A compound write ended up half applied and could not be undone.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
    /// A history record for this (budget, period start) already exists.
    #[error("period already archived")]
    AlreadyArchived,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
