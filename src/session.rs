//! Session manager: identity tracking and the memoized connection probe

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::auth::{AuthClient, AuthEvent, Identity, Session};
use crate::error::Error;
use crate::rest::RestClient;

/// Table used for the reachability probe.
const PROBE_TABLE: &str = "prep_lists";

type SharedProbe = Shared<BoxFuture<'static, Result<bool, Error>>>;

/// Tracks the current authenticated identity and memoizes the
/// "connection is usable" probe.
///
/// Concurrent callers of [`SessionManager::ensure_connected`] during an
/// in-flight probe all await the same future. A successful result stays
/// memoized until the next auth transition; a failed probe clears the memo
/// so the next caller retries.
pub struct SessionManager {
    auth: AuthClient,
    rest: RestClient,
    session: Mutex<Option<Session>>,
    connection_memo: Mutex<Option<SharedProbe>>,
    initialized: AtomicBool,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(auth: AuthClient, rest: RestClient) -> Self {
        Self {
            auth,
            rest,
            session: Mutex::new(None),
            connection_memo: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Validate any restored session against the auth service, once.
    ///
    /// The first successful call marks the manager initialized; later calls
    /// are no-ops. A failed remote fetch surfaces the error and leaves the
    /// manager uninitialized so a later call can retry.
    pub async fn initialize(&self) -> Result<Option<Identity>, Error> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(self.current_identity());
        }

        let token = self.access_token();
        if let Some(token) = token {
            let user = self.auth.get_user(&token).await.map_err(|err| {
                log::error!("session initialization failed: {}", err);
                err
            })?;
            let mut session = self.session.lock().unwrap();
            if let Some(current) = session.as_mut() {
                current.user = user;
            }
        }

        self.initialized.store(true, Ordering::SeqCst);
        Ok(self.current_identity())
    }

    /// The current authenticated identity, if any
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.lock().unwrap().as_ref().map(|s| s.user.clone())
    }

    /// The current access token, if a session is active
    pub fn access_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Restore a session without going through a sign-in flow
    pub fn set_session(&self, session: Session) {
        self.apply_auth_change(&AuthEvent::SignedIn(session));
    }

    /// Check that the backend is reachable, coalescing concurrent checks.
    pub async fn ensure_connected(&self) -> Result<bool, Error> {
        let (shared, started_here) = {
            let mut memo = self.connection_memo.lock().unwrap();
            match memo.as_ref() {
                Some(existing) => (existing.clone(), false),
                None => {
                    let rest = self.rest.clone();
                    let token = self.access_token();
                    let probe = async move {
                        rest.table(PROBE_TABLE)
                            .probe(token.as_deref())
                            .await
                            .map(|_| true)
                            .map_err(|err| Error::connection(err))
                    }
                    .boxed()
                    .shared();
                    *memo = Some(probe.clone());
                    (probe, true)
                }
            }
        };

        let result = shared.await;

        if result.is_err() && started_here {
            let mut memo = self.connection_memo.lock().unwrap();
            *memo = None;
        }

        result
    }

    /// Apply an auth-state transition: replace the identity and clear the
    /// connection memo.
    pub fn apply_auth_change(&self, event: &AuthEvent) {
        {
            let mut session = self.session.lock().unwrap();
            match event {
                AuthEvent::SignedIn(new_session) | AuthEvent::TokenRefreshed(new_session) => {
                    *session = Some(new_session.clone());
                }
                AuthEvent::SignedOut => {
                    *session = None;
                }
            }
        }
        let mut memo = self.connection_memo.lock().unwrap();
        *memo = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(uri: &str) -> SessionManager {
        let client = Client::new();
        SessionManager::new(
            AuthClient::new(uri, "fake-key", client.clone()),
            RestClient::new(uri, "fake-key", client),
        )
    }

    fn test_session(id: &str) -> Session {
        Session {
            access_token: format!("token-{id}"),
            refresh_token: "refresh".into(),
            token_type: "bearer".into(),
            expires_in: 3600,
            expires_at: None,
            user: Identity {
                id: id.into(),
                email: Some(format!("{id}@example.com")),
                user_metadata: HashMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn concurrent_probes_share_one_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/prep_lists"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(std::time::Duration::from_millis(30)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server.uri());
        let (a, b) = tokio::join!(manager.ensure_connected(), manager.ensure_connected());
        assert!(a.unwrap() && b.unwrap());
    }

    #[tokio::test]
    async fn successful_probe_stays_memoized_until_auth_change() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/prep_lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server.uri());
        manager.ensure_connected().await.unwrap();
        manager.ensure_connected().await.unwrap();

        manager.apply_auth_change(&AuthEvent::SignedIn(test_session("u1")));
        manager.ensure_connected().await.unwrap();
    }

    #[tokio::test]
    async fn failed_probe_is_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/prep_lists"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server.uri());
        let first = manager.ensure_connected().await;
        assert!(matches!(first, Err(Error::ConnectionUnavailable(_))));

        let second = manager.ensure_connected().await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn initialize_validates_restored_session_once() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "email": "u1@example.com",
                "user_metadata": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server.uri());
        manager.set_session(test_session("u1"));

        let identity = manager.initialize().await.unwrap();
        assert_eq!(identity.map(|i| i.id).as_deref(), Some("u1"));

        // No second remote fetch.
        manager.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn failed_initialization_is_retryable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "JWT expired"
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server.uri());
        manager.set_session(test_session("u1"));

        assert!(manager.initialize().await.is_err());
        // Not poisoned: the next call probes again.
        assert!(manager.initialize().await.is_err());
    }

    #[tokio::test]
    async fn sign_out_clears_identity() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server.uri());

        manager.set_session(test_session("u1"));
        assert!(manager.current_identity().is_some());

        manager.apply_auth_change(&AuthEvent::SignedOut);
        assert!(manager.current_identity().is_none());
        assert!(manager.access_token().is_none());
    }
}
