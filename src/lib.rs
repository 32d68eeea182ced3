//! prepbase
//!
//! A typed data-access layer for kitchen prep records (prep lists, events,
//! recipes, methods, containers, user profiles) stored on a hosted
//! Supabase-style backend. The backend owns the data and the row-level
//! security policies; this crate shapes requests and responses, guards
//! mutating operations against duplicate and overlapping calls, and keeps a
//! few short-lived caches that reset on every auth transition.

pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod models;
pub mod profile;
pub mod realtime;
pub mod rest;
pub mod session;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{AuthClient, AuthEvent, AuthResponse, Identity, Session};
use crate::config::Config;
use crate::diagnostics::DiagnosisReport;
use crate::error::Error;
use crate::guard::OperationGuard;
use crate::models::{Container, Event, Method, PrepList, Recipe, UserProfile};
use crate::profile::ProfileCache;
use crate::realtime::RealtimeClient;
use crate::rest::RestClient;
use crate::session::SessionManager;
use crate::store::Collection;

/// Shared service state behind a configured client.
pub(crate) struct ServiceCore {
    pub(crate) rest: RestClient,
    pub(crate) auth: AuthClient,
    pub(crate) session: SessionManager,
    pub(crate) profile: ProfileCache,
    pub(crate) guard: OperationGuard,
}

/// The entry point for the prepbase data layer.
///
/// One instance is created at process start and passed to callers; all
/// mutable state (identity, profile cache, connection memo, operation guard)
/// lives inside it. Construction never fails: with missing configuration the
/// client stays usable for [`PrepbaseClient::diagnose_connection`], and data
/// operations report a configuration error.
///
/// # Example
///
/// ```no_run
/// use prepbase::{config::Config, PrepbaseClient};
///
/// let client = PrepbaseClient::new(Config::new(
///     "https://your-project.supabase.co",
///     "your-anon-key",
/// ));
/// ```
pub struct PrepbaseClient {
    config: Config,
    core: Option<Arc<ServiceCore>>,
}

impl PrepbaseClient {
    /// Create a client from explicit configuration.
    pub fn new(config: Config) -> Self {
        let core = match (&config.url, &config.anon_key) {
            (Some(url), Some(key)) => {
                let mut builder = Client::builder();
                if let Some(timeout) = config.request_timeout {
                    builder = builder.timeout(timeout);
                }
                let http = builder.build().unwrap_or_default();

                let rest = RestClient::new(url, key, http.clone());
                let auth = AuthClient::new(url, key, http);
                let session = SessionManager::new(auth.clone(), rest.clone());
                let profile = ProfileCache::new(rest.clone());
                let guard = OperationGuard::new(config.dedupe_window);

                Some(Arc::new(ServiceCore {
                    rest,
                    auth,
                    session,
                    profile,
                    guard,
                }))
            }
            _ => {
                log::warn!("prepbase client created without backend configuration");
                None
            }
        };

        Self { config, core }
    }

    /// Create a client from the environment.
    pub fn from_env() -> Self {
        Self::new(Config::from_env())
    }

    fn core(&self) -> Result<&Arc<ServiceCore>, Error> {
        self.core.as_ref().ok_or_else(|| {
            Error::config("backend is not configured; set SUPABASE_URL and SUPABASE_ANON_KEY")
        })
    }

    /// Validate any restored session against the auth service. Call once
    /// from the process entry point; later calls are no-ops.
    pub async fn initialize(&self) -> Result<Option<Identity>, Error> {
        self.core()?.session.initialize().await
    }

    /// The current authenticated identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.core.as_ref()?.session.current_identity()
    }

    /// Restore a previously persisted session.
    pub fn set_session(&self, session: Session) -> Result<(), Error> {
        let core = self.core()?;
        core.session.set_session(session.clone());
        self.reset_caches(core);
        Ok(())
    }

    /// Check that the backend answers, coalescing concurrent checks.
    pub async fn ensure_connected(&self) -> Result<bool, Error> {
        self.core()?.session.ensure_connected().await
    }

    /// Sign up a new user. A returned session becomes the active identity.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let core = self.core()?;
        let response = core.auth.sign_up(email, password).await?;
        if let Some(session) = response.session() {
            self.apply_auth_change(core, AuthEvent::SignedIn(session));
        }
        Ok(response)
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let core = self.core()?;
        let response = core.auth.sign_in(email, password).await?;
        if let Some(session) = response.session() {
            self.apply_auth_change(core, AuthEvent::SignedIn(session));
        }
        Ok(response)
    }

    /// Sign out the current user.
    ///
    /// The local identity and caches are cleared even when the remote logout
    /// fails; the error is still reported.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let core = self.core()?;
        let token = core.session.access_token();
        let result = match token {
            Some(token) => core.auth.sign_out(&token).await,
            None => Ok(()),
        };
        self.apply_auth_change(core, AuthEvent::SignedOut);
        result
    }

    /// Fetch or create the current user's profile.
    pub async fn ensure_profile(&self) -> Result<Option<UserProfile>, Error> {
        let core = self.core()?;
        let identity = core.session.current_identity();
        let token = core.session.access_token();
        core.profile
            .ensure(identity.as_ref(), token.as_deref())
            .await
    }

    /// Prep list records
    pub fn prep_lists(&self) -> Result<Collection<PrepList>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// Event records
    pub fn events(&self) -> Result<Collection<Event>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// Recipe records
    pub fn recipes(&self) -> Result<Collection<Recipe>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// Method records
    pub fn methods(&self) -> Result<Collection<Method>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// Container records
    pub fn containers(&self) -> Result<Collection<Container>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// User profile records
    pub fn profiles(&self) -> Result<Collection<UserProfile>, Error> {
        Ok(Collection::new(self.core()?.clone()))
    }

    /// Change-subscription helper for the realtime endpoint.
    pub fn realtime(&self) -> Result<RealtimeClient, Error> {
        self.core()?;
        // Both values are present when a core exists.
        let url = self.config.url.as_deref().unwrap_or_default();
        let key = self.config.anon_key.as_deref().unwrap_or_default();
        Ok(RealtimeClient::new(url, key))
    }

    /// Probe configuration, auth, table reachability, and RLS status.
    /// Never fails; problems land in the report's error list.
    pub async fn diagnose_connection(&self) -> DiagnosisReport {
        diagnostics::diagnose(&self.config, self.core.as_deref()).await
    }

    fn apply_auth_change(&self, core: &ServiceCore, event: AuthEvent) {
        core.session.apply_auth_change(&event);
        self.reset_caches(core);
    }

    // Auth transitions reset every short-lived cache: a new identity must
    // not see the previous identity's profile, connection memo, or
    // duplicate-suppression window.
    fn reset_caches(&self, core: &ServiceCore) {
        core.profile.clear();
        core.guard.reset_recent();
    }
}
