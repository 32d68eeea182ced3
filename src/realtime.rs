//! Change-subscription pass-through
//!
//! This layer only shapes the websocket URL and channel topic; socket
//! handling belongs to the caller's realtime transport.

use serde::{Deserialize, Serialize};

/// Client for building change subscriptions.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: String,
    key: String,
}

/// A named channel scoped to a schema and table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// The channel name
    pub name: String,

    /// The topic to subscribe to
    pub topic: String,
}

/// Change event types a channel can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

/// A change notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePayload<T> {
    pub schema: String,
    pub table: String,
    pub commit_timestamp: String,
    #[serde(rename = "eventType")]
    pub event_type: ChangeEvent,
    pub new: Option<T>,
    pub old: Option<T>,
}

impl RealtimeClient {
    /// Create a new RealtimeClient
    pub(crate) fn new(url: &str, key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    /// The websocket URL for the realtime endpoint
    pub fn socket_url(&self) -> String {
        let url = self
            .url
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        format!("{}/realtime/v1/websocket?apikey={}", url, self.key)
    }

    /// Build a channel for change events on a table
    pub fn table_channel(&self, name: &str, table: &str) -> Channel {
        Channel {
            name: name.to_string(),
            topic: format!("realtime:public:{}", table),
        }
    }
}
