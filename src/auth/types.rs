//! Types for authentication and session state

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The authenticated caller's principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// The user ID assigned by the auth service
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// Free-form metadata attached at sign-up (display name, avatar, ...)
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

impl Identity {
    /// The display name from sign-up metadata, if one was provided.
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type (always "bearer")
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    /// The session principal
    pub user: Identity,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or(Duration::from_secs(0))
                    .as_secs() as i64;
                now >= expires_at
            }
            None => false,
        }
    }
}

/// Response from the auth endpoints.
///
/// Token fields are flat in the wire shape; [`AuthResponse::session`]
/// assembles them into a [`Session`] when credentials were accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// The access token, present when credentials were accepted
    pub access_token: Option<String>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The token type
    pub token_type: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    /// The user data; present on its own for sign-up without auto-confirm
    pub user: Option<Identity>,
}

impl AuthResponse {
    /// The session carried by this response, if credentials were accepted.
    pub fn session(&self) -> Option<Session> {
        match (&self.access_token, &self.refresh_token, &self.user) {
            (Some(access_token), Some(refresh_token), Some(user)) => Some(Session {
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
                token_type: self
                    .token_type
                    .clone()
                    .unwrap_or_else(|| "bearer".to_string()),
                expires_in: self.expires_in.unwrap_or(3600),
                expires_at: self.expires_at,
                user: user.clone(),
            }),
            _ => None,
        }
    }
}

/// An auth-state transition observed by the session manager.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A user signed in (or a session was restored)
    SignedIn(Session),

    /// The current user signed out
    SignedOut,

    /// The access token was refreshed for the same identity
    TokenRefreshed(Session),
}
