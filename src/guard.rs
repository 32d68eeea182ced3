//! Operation guard: in-flight locking and duplicate-write suppression
//!
//! Entity-mutating calls can arrive in bursts (double-submit UI events,
//! retrying transports). The guard keeps at most one remote mutation in
//! flight per operation key, and treats an identical write repeated inside a
//! short window as a no-op. This is a heuristic against duplicate writes,
//! not an idempotency ledger; the window length is configuration, see
//! [`crate::config::Config::dedupe_window`].

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Most bytes of a serialized payload fed into the fallback key hash.
const FINGERPRINT_INPUT_LIMIT: usize = 1024;

type SharedOp = Shared<BoxFuture<'static, Result<Value, crate::error::Error>>>;

/// Derive an operation key from a stable identity.
///
/// The key combines the operation name, the entity id, and an optional
/// content fingerprint (typically the entity name).
pub fn write_key(operation: &str, id: &str, fingerprint: Option<&str>) -> String {
    match fingerprint {
        Some(fp) => format!("{}:{}:{}", operation, id, fp),
        None => format!("{}:{}", operation, id),
    }
}

/// Derive an operation key for payloads without a stable identity.
///
/// Hashes a bounded prefix of the serialized payload.
pub fn payload_key(operation: &str, payload: &Value) -> String {
    let serialized = payload.to_string();
    let bytes = serialized.as_bytes();
    let bounded = &bytes[..bytes.len().min(FINGERPRINT_INPUT_LIMIT)];
    let mut hasher = DefaultHasher::new();
    bounded.hash(&mut hasher);
    format!("{}:{:016x}", operation, hasher.finish())
}

struct RecentWrite {
    at: Instant,
    fingerprint: String,
    payload: Value,
}

/// Releases the in-flight slot when the leader settles, on every exit path.
struct SlotRelease<'a> {
    slots: &'a Mutex<HashMap<String, SharedOp>>,
    key: &'a str,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(self.key);
        }
    }
}

/// Per-operation mutual exclusion plus a recent-duplicate window.
pub struct OperationGuard {
    in_flight: Mutex<HashMap<String, SharedOp>>,
    recent: Mutex<HashMap<String, RecentWrite>>,
    dedupe_window: Duration,
}

impl OperationGuard {
    /// Create a guard with the given duplicate-suppression window
    pub fn new(dedupe_window: Duration) -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            recent: Mutex::new(HashMap::new()),
            dedupe_window,
        }
    }

    /// Run `op` under the in-flight lock for `key`.
    ///
    /// If a call with the same key is already pending, the new caller awaits
    /// the same shared result and no second operation is started. The slot is
    /// cleared when the winning call settles, success or failure.
    pub async fn run_locked<Fut>(&self, key: &str, op: Fut) -> Result<Value, crate::error::Error>
    where
        Fut: Future<Output = Result<Value, crate::error::Error>> + Send + 'static,
    {
        let (shared, release) = {
            let mut slots = self.in_flight.lock().unwrap();
            match slots.get(key) {
                Some(existing) => {
                    log::debug!("operation already in flight, joining: {}", key);
                    (existing.clone(), None)
                }
                None => {
                    let shared = op.boxed().shared();
                    slots.insert(key.to_string(), shared.clone());
                    let release = SlotRelease {
                        slots: &self.in_flight,
                        key,
                    };
                    (shared, Some(release))
                }
            }
        };

        let result = shared.await;
        drop(release);
        result
    }

    /// Run `op` under the lock, suppressing identical recent writes.
    ///
    /// A payload that serializes identically to a write that succeeded under
    /// the same key within the window is not re-sent; the recorded payload
    /// is returned instead. Expired entries are evicted lazily, on the next
    /// lookup for their key.
    pub async fn run_deduped<F, Fut>(
        &self,
        key: &str,
        payload: Value,
        op: F,
    ) -> Result<Value, crate::error::Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, crate::error::Error>> + Send + 'static,
    {
        let fingerprint = payload.to_string();

        {
            let mut recent = self.recent.lock().unwrap();
            if let Some(entry) = recent.get(key) {
                if entry.at.elapsed() >= self.dedupe_window {
                    recent.remove(key);
                } else if entry.fingerprint == fingerprint {
                    log::debug!("suppressing duplicate write inside window: {}", key);
                    return Ok(entry.payload.clone());
                }
            }
        }

        let result = self.run_locked(key, op()).await;

        if result.is_ok() {
            let mut recent = self.recent.lock().unwrap();
            recent.insert(
                key.to_string(),
                RecentWrite {
                    at: Instant::now(),
                    fingerprint,
                    payload,
                },
            );
        }

        result
    }

    /// Forget all recorded recent writes.
    ///
    /// Called on auth-state transitions; a new identity must not inherit the
    /// previous identity's suppression window.
    pub fn reset_recent(&self) {
        self.recent.lock().unwrap().clear();
    }
}
