//! Error handling for the prepbase data layer

use std::fmt;
use thiserror::Error;

/// Classification of a backend error, derived from the PostgREST error body
/// and the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The target table does not exist (missing migration)
    TableMissing,
    /// Row-level security or grant rejected the operation
    AccessDenied,
    /// Unique constraint violation
    DuplicateKey,
    /// The access token was missing, expired, or malformed
    InvalidCredentials,
    /// Anything the classifier does not recognize
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::TableMissing => "table missing",
            RemoteErrorKind::AccessDenied => "access denied",
            RemoteErrorKind::DuplicateKey => "duplicate key",
            RemoteErrorKind::InvalidCredentials => "invalid credentials",
            RemoteErrorKind::Other => "remote error",
        };
        f.write_str(label)
    }
}

/// Unified error type for the prepbase data layer.
///
/// The enum is `Clone` because in-flight results are shared between
/// concurrent callers of the same operation key; transport and
/// serialization sources are captured as message text for that reason.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A required field was missing or invalid, detected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutating operation was attempted without an active identity
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// The pre-flight reachability check failed
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// A backend error, reclassified for the caller
    #[error("{kind}: {message}")]
    Remote {
        kind: RemoteErrorKind,
        message: String,
        /// Original backend error code, preserved for logging
        code: Option<String>,
    },

    /// Network or HTTP transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization or deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration or URL assembly errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new authentication-required error
    pub fn auth_required<T: fmt::Display>(msg: T) -> Self {
        Error::AuthRequired(msg.to_string())
    }

    /// Create a new connection-unavailable error
    pub fn connection<T: fmt::Display>(msg: T) -> Self {
        Error::ConnectionUnavailable(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Reclassify a backend error body into a [`Error::Remote`].
    ///
    /// Inspects the PostgREST error code (SQLSTATE) first, then falls back
    /// to message text and HTTP status.
    pub fn from_remote(status: reqwest::StatusCode, code: Option<String>, message: String) -> Self {
        let lowered = message.to_lowercase();
        let kind = match code.as_deref() {
            Some("42P01") => RemoteErrorKind::TableMissing,
            Some("42501") => RemoteErrorKind::AccessDenied,
            Some("23505") => RemoteErrorKind::DuplicateKey,
            Some("PGRST301") => RemoteErrorKind::InvalidCredentials,
            _ if lowered.contains("does not exist") && lowered.contains("relation") => {
                RemoteErrorKind::TableMissing
            }
            _ if lowered.contains("row-level security") || lowered.contains("policy") => {
                RemoteErrorKind::AccessDenied
            }
            _ if lowered.contains("duplicate key") => RemoteErrorKind::DuplicateKey,
            _ if lowered.contains("jwt") || lowered.contains("invalid token") => {
                RemoteErrorKind::InvalidCredentials
            }
            _ if status == reqwest::StatusCode::UNAUTHORIZED => RemoteErrorKind::InvalidCredentials,
            _ if status == reqwest::StatusCode::FORBIDDEN => RemoteErrorKind::AccessDenied,
            _ if status == reqwest::StatusCode::NOT_FOUND => RemoteErrorKind::TableMissing,
            _ => RemoteErrorKind::Other,
        };

        let message = match kind {
            RemoteErrorKind::TableMissing => format!("table not found ({message})"),
            RemoteErrorKind::AccessDenied => format!("operation rejected by policy ({message})"),
            RemoteErrorKind::DuplicateKey => format!("record already exists ({message})"),
            RemoteErrorKind::InvalidCredentials => format!("session token rejected ({message})"),
            RemoteErrorKind::Other => message,
        };

        Error::Remote { kind, message, code }
    }

    /// The classification of this error, if it is a remote error.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Error::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn classifies_missing_table_by_sqlstate() {
        let err = Error::from_remote(
            StatusCode::NOT_FOUND,
            Some("42P01".to_string()),
            "relation \"public.prep_lists\" does not exist".to_string(),
        );
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::TableMissing));
    }

    #[test]
    fn classifies_policy_violation_by_message() {
        let err = Error::from_remote(
            StatusCode::FORBIDDEN,
            None,
            "new row violates row-level security policy".to_string(),
        );
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::AccessDenied));
    }

    #[test]
    fn classifies_duplicate_key() {
        let err = Error::from_remote(
            StatusCode::CONFLICT,
            Some("23505".to_string()),
            "duplicate key value violates unique constraint".to_string(),
        );
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::DuplicateKey));
    }

    #[test]
    fn preserves_original_code() {
        let err = Error::from_remote(
            StatusCode::UNAUTHORIZED,
            Some("PGRST301".to_string()),
            "JWT expired".to_string(),
        );
        match err {
            Error::Remote { code, .. } => assert_eq!(code.as_deref(), Some("PGRST301")),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_errors_fall_through_to_other() {
        let err = Error::from_remote(
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "backend exploded".to_string(),
        );
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::Other));
    }
}
