use thiserror::Error;
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures of the relationship and pin engines.
///
/// Expected no-ops, such as a missing pending request, are not
/// errors; those operations return `Ok(false)`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("requesting user does not exist: {0}")]
    RequesterNotFound(Uuid),

    #[error("target user does not exist: {0}")]
    TargetNotFound(Uuid),

    #[error("user does not exist: {0}")]
    UserNotFound(Uuid),

    #[error("operation cannot target the caller")]
    SelfReference,

    #[error("invalid visibility '{0}', expected public, friends or private")]
    InvalidVisibility(String),

    #[error("invalid geo parameter: {0}")]
    InvalidGeoParameter(String),

    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}
