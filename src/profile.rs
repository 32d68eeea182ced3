//! Lazy fetch-or-create cache for the caller's profile row

use std::sync::Mutex;

use crate::auth::Identity;
use crate::error::Error;
use crate::models::{Record, UserProfile, UserProfileRow};
use crate::rest::RestClient;

/// Single-slot profile cache, keyed implicitly by the current identity.
///
/// Profile absence is never fatal to the caller: remote failures during
/// fetch or creation are logged and surface as `Ok(None)`.
pub struct ProfileCache {
    rest: RestClient,
    cache: Mutex<Option<UserProfile>>,
}

impl ProfileCache {
    /// Create an empty cache
    pub fn new(rest: RestClient) -> Self {
        Self {
            rest,
            cache: Mutex::new(None),
        }
    }

    /// Return the profile for the given identity, fetching or creating it
    /// on first use.
    pub async fn ensure(
        &self,
        identity: Option<&Identity>,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, Error> {
        let Some(identity) = identity else {
            log::warn!("profile requested without an identity");
            return Ok(None);
        };

        {
            let cached = self.cache.lock().unwrap();
            if let Some(profile) = cached.as_ref() {
                if profile.id == identity.id {
                    return Ok(Some(profile.clone()));
                }
            }
        }

        let mut select = self
            .rest
            .table(UserProfile::TABLE)
            .select("*")
            .eq("id", &identity.id);
        if let Some(token) = token {
            select = select.auth(token);
        }

        match select.execute_one::<UserProfileRow>().await {
            Ok(Some(row)) if UserProfile::row_is_valid(&row) => {
                let profile = UserProfile::from_row(row);
                self.store(profile.clone());
                Ok(Some(profile))
            }
            Ok(_) => self.create_default(identity, token).await,
            Err(err) => {
                log::warn!("profile fetch failed for {}: {}", identity.id, err);
                self.create_default(identity, token).await
            }
        }
    }

    /// Create the profile with identity-derived defaults.
    ///
    /// Upsert keyed by id, so concurrent creation attempts converge to one
    /// row.
    async fn create_default(
        &self,
        identity: &Identity,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, Error> {
        let defaults = UserProfile::defaults_for(identity);
        let row = match defaults.to_row() {
            Ok(row) => row,
            Err(err) => {
                log::warn!("cannot build default profile for {}: {}", identity.id, err);
                return Ok(None);
            }
        };

        let mut upsert = self
            .rest
            .table(UserProfile::TABLE)
            .upsert(row)
            .on_conflict("id");
        if let Some(token) = token {
            upsert = upsert.auth(token);
        }

        match upsert.execute::<UserProfileRow>().await {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => {
                    let profile = UserProfile::from_row(row);
                    self.store(profile.clone());
                    Ok(Some(profile))
                }
                None => {
                    log::warn!("profile creation for {} returned no row", identity.id);
                    Ok(None)
                }
            },
            Err(err) => {
                log::error!("profile creation failed for {}: {}", identity.id, err);
                Ok(None)
            }
        }
    }

    fn store(&self, profile: UserProfile) {
        *self.cache.lock().unwrap() = Some(profile);
    }

    /// Drop the cached profile. Called on auth transitions.
    pub fn clear(&self) {
        *self.cache.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.into(),
            email: Some(format!("{id}@example.com")),
            user_metadata: HashMap::new(),
        }
    }

    fn cache_for(uri: &str) -> ProfileCache {
        ProfileCache::new(RestClient::new(uri, "fake-key", Client::new()))
    }

    #[tokio::test]
    async fn no_identity_yields_none() {
        let cache = cache_for("http://127.0.0.1:9");
        let profile = cache.ensure(None, None).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn existing_profile_is_fetched_then_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "u1",
                "email": "u1@example.com",
                "role": "admin"
            }])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = cache_for(&mock_server.uri());
        let id = identity("u1");

        let first = cache.ensure(Some(&id), None).await.unwrap().unwrap();
        assert_eq!(first.role, crate::models::ProfileRole::Admin);

        // Served from the cache, no second request.
        let second = cache.ensure(Some(&id), None).await.unwrap().unwrap();
        assert_eq!(second.id, "u1");
    }

    #[tokio::test]
    async fn missing_profile_is_created_with_defaults() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("on_conflict", "id"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": "u1",
                "email": "u1@example.com",
                "role": "user"
            }])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = cache_for(&mock_server.uri());
        let profile = cache.ensure(Some(&identity("u1")), None).await.unwrap();
        assert_eq!(profile.unwrap().email, "u1@example.com");
    }

    #[tokio::test]
    async fn creation_failure_is_not_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy"
            })))
            .mount(&mock_server)
            .await;

        let cache = cache_for(&mock_server.uri());
        let profile = cache.ensure(Some(&identity("u1")), None).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn clear_forces_a_refetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "u1",
                "email": "u1@example.com"
            }])))
            .expect(2)
            .mount(&mock_server)
            .await;

        let cache = cache_for(&mock_server.uri());
        let id = identity("u1");
        cache.ensure(Some(&id), None).await.unwrap();
        cache.clear();
        cache.ensure(Some(&id), None).await.unwrap();
    }
}
