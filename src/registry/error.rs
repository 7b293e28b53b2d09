use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("alias already exists")]
    AliasConflict,
    #[error("alias '{0}' is reserved")]
    ReservedAlias(String),
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),
    #[error("link not found")]
    NotFound,
    #[error("link has expired")]
    Expired,
    #[error("password required")]
    PasswordRequired,
    #[error("not allowed to modify this link")]
    Unauthorized,
    #[error("link target cannot be used as a redirect location")]
    UnusableTarget,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// HTTP status the routing layer answers with for this outcome.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::InvalidUrl(_)
            | RegistryError::InvalidAlias(_)
            | RegistryError::ReservedAlias(_)
            | RegistryError::InvalidExpiry(_) => StatusCode::BAD_REQUEST,
            RegistryError::AliasConflict => StatusCode::CONFLICT,
            RegistryError::NotFound => StatusCode::NOT_FOUND,
            RegistryError::Expired => StatusCode::GONE,
            RegistryError::PasswordRequired => StatusCode::UNAUTHORIZED,
            RegistryError::Unauthorized => StatusCode::FORBIDDEN,
            RegistryError::UnusableTarget | RegistryError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
