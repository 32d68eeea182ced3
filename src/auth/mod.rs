//! Authentication pass-through to the backend auth service
//!
//! Stateless HTTP delegation only; session state lives in
//! [`crate::session::SessionManager`].

mod types;

use reqwest::Client;
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Fetch;

pub use types::*;

const CLIENT_INFO: &str = "prepbase/0.2.0";

/// Client for the backend auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    url: String,
    key: String,
    client: Client,
}

impl AuthClient {
    /// Create a new AuthClient
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.auth_url("/signup");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.auth_url("/token?grant_type=password");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
    }

    /// Sign out the session behind the given access token
    pub async fn sign_out(&self, access_token: &str) -> Result<(), Error> {
        let url = self.auth_url("/logout");

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(access_token)
            .execute_no_return()
            .await
    }

    /// Fetch the user behind the given access token
    pub async fn get_user(&self, access_token: &str) -> Result<Identity, Error> {
        let url = self.auth_url("/user");

        Fetch::get(&self.client, &url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(access_token)
            .execute::<Identity>()
            .await
    }
}
