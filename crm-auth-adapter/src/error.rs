//! Error types for the auth adapter.

use crm_auth_common::RedirectSignal;

/// Error types for auth operations.
///
/// `Redirect` is not a failure of the system: it tells the router to
/// navigate elsewhere and is surfaced through the error channel so that
/// route guards stop on it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Redirect to {0}")]
    Redirect(RedirectSignal),

    #[error("Invalid Supabase session")]
    InvalidSession,

    #[error("No sale found for user")]
    SaleNotFound,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid login credentials: {0}")]
    InvalidCredentials(String),

    #[error("Missing access_token or refresh_token for {0}")]
    MissingRecoveryTokens(String),

    #[error("No identity available")]
    NoIdentity,

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend communication error: {0}")]
    Communication(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status carried by the error, if it came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            Error::InvalidCredentials(_) => Some(400),
            Error::Unauthenticated => Some(401),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Error::Redirect(_))
    }

    pub fn redirect_signal(&self) -> Option<&RedirectSignal> {
        match self {
            Error::Redirect(signal) => Some(signal),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
