//! The locally-owned event representation.
//!
//! Events are created either by user action (`source = Local`) or by the
//! pull phase of a sync cycle (`source = Remote`). A remote-sourced event
//! always carries the provider's `external_id`; a local event gains one
//! the first time it is pushed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar event as stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub kind: EventKind,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub project_id: Option<String>,
    pub source: EventSource,
    /// The provider's identifier for this event. Unique per owner when
    /// present. An event is eligible for the push phase iff
    /// `source == Local` and this is `None`.
    pub external_id: Option<String>,
    pub location: Option<String>,
    pub attendee_ids: Vec<String>,
}

impl LocalEvent {
    /// Generate a fresh event id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether this event may be created remotely by the push phase.
    /// This is the sole de-duplication guard against double-creation.
    pub fn is_push_candidate(&self) -> bool {
        self.source == EventSource::Local && self.external_id.is_none()
    }
}

/// What kind of entry an event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Meeting,
    Task,
    Deadline,
    Delivery,
    Todo,
}

/// Which side created the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Local,
    Remote,
}

/// The mutable-field subset applied to a known event during the pull
/// phase. Fields outside this set are owned by the local side and never
/// overwritten from remote data.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
}
