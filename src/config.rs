//! Configuration for the prepbase client

use std::env;
use std::time::Duration;

/// Environment variable holding the backend project URL.
pub const URL_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the anonymous API key.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Configuration for the prepbase client.
///
/// Missing secrets are a detectable, reportable condition rather than a
/// startup crash: construction always succeeds and [`Config::is_configured`]
/// tells the caller (and the diagnostics report) whether the two required
/// values are present.
#[derive(Debug, Clone)]
pub struct Config {
    /// The base URL for the backend project
    pub url: Option<String>,

    /// The anonymous API key for the backend project
    pub anon_key: Option<String>,

    /// How long an identical write is suppressed after a successful one.
    /// A policy knob, not a correctness guarantee.
    pub dedupe_window: Duration,

    /// The request timeout, inherited by the HTTP client
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            dedupe_window: Duration::from_millis(2000),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl Config {
    /// Create a configuration with explicit URL and key.
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            anon_key: Some(anon_key.to_string()),
            ..Self::default()
        }
    }

    /// Read configuration from the environment.
    ///
    /// Absent or empty variables leave the corresponding field unset.
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            url: read(URL_VAR),
            anon_key: read(ANON_KEY_VAR),
            ..Self::default()
        }
    }

    /// Whether both required secrets are present.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }

    /// The names of any missing required values.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.url.is_none() {
            out.push(URL_VAR);
        }
        if self.anon_key.is_none() {
            out.push(ANON_KEY_VAR);
        }
        out
    }

    /// Set the duplicate-suppression window.
    pub fn with_dedupe_window(mut self, value: Duration) -> Self {
        self.dedupe_window = value;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unconfigured() {
        let config = Config::default();
        assert!(!config.is_configured());
        assert_eq!(config.missing(), vec![URL_VAR, ANON_KEY_VAR]);
    }

    #[test]
    fn explicit_values_configure() {
        let config = Config::new("https://example.supabase.co", "anon-key");
        assert!(config.is_configured());
        assert!(config.missing().is_empty());
    }

    #[test]
    fn dedupe_window_is_tunable() {
        let config = Config::default().with_dedupe_window(Duration::from_millis(50));
        assert_eq!(config.dedupe_window, Duration::from_millis(50));
    }
}
