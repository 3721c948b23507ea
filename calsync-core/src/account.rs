//! Per-owner connection state: OAuth tokens and the incremental sync
//! cursor. Both records are created at connect time and updated in place
//! for the lifetime of the account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token material and connection health for one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub owner_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    /// The provider-side calendar this owner syncs against.
    pub calendar_id: String,
    pub sync_status: SyncStatus,
    pub sync_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Connection health, surfaced to the owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Connected,
    Syncing,
    Error,
}

/// The provider-issued incremental sync marker for one owner.
///
/// The cursor is only replaced after a pull phase completes an entire
/// page sequence without an unrecovered error. Page tokens are purely
/// intra-cycle pagination state and are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCursor {
    pub owner_id: String,
    pub cursor_token: Option<String>,
    pub full_sync_completed: bool,
}

impl SyncCursor {
    /// The state of a freshly connected account: no cursor yet, so the
    /// first pull lists the full window.
    pub fn empty(owner_id: &str) -> Self {
        SyncCursor {
            owner_id: owner_id.to_string(),
            cursor_token: None,
            full_sync_completed: false,
        }
    }
}
