//! Persistence ports the host application implements.
//!
//! The engine never talks to a database directly; it reads and writes
//! `LocalEvent`, `TokenRecord`, and `SyncCursor` rows through these
//! traits. A `MemoryStore` implementation ships with the crate for tests
//! and lightweight embedding.

use async_trait::async_trait;
use calsync_core::{EventPatch, LocalEvent, SyncCursor, SyncResult, SyncStatus, TokenRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub mod memory;

pub use memory::MemoryStore;

/// Read/write access to locally stored events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All remote-sourced events for an owner, keyed by `external_id`.
    /// Loaded once per cycle as the pull phase's de-duplication map.
    async fn remote_events_by_external_id(
        &self,
        owner_id: &str,
    ) -> SyncResult<HashMap<String, LocalEvent>>;

    /// Local-sourced events with no `external_id` yet, capped at `limit`.
    async fn push_candidates(&self, owner_id: &str, limit: usize) -> SyncResult<Vec<LocalEvent>>;

    async fn find_event(&self, owner_id: &str, event_id: &str) -> SyncResult<Option<LocalEvent>>;

    /// Batch insert. All-or-nothing: on failure the caller retries rows
    /// individually via `insert_event`.
    async fn insert_events(&self, events: &[LocalEvent]) -> SyncResult<()>;

    async fn insert_event(&self, event: &LocalEvent) -> SyncResult<()>;

    async fn apply_patch(&self, event_id: &str, patch: &EventPatch) -> SyncResult<()>;

    async fn delete_event(&self, event_id: &str) -> SyncResult<()>;

    async fn set_external_id(&self, event_id: &str, external_id: Option<&str>) -> SyncResult<()>;
}

/// Read/write access to per-owner connection state.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn token_record(&self, owner_id: &str) -> SyncResult<Option<TokenRecord>>;

    /// Persist refreshed token material. Always updates the expiry.
    async fn save_tokens(
        &self,
        owner_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> SyncResult<()>;

    async fn set_sync_status(
        &self,
        owner_id: &str,
        status: SyncStatus,
        error: Option<&str>,
    ) -> SyncResult<()>;

    async fn mark_synced(&self, owner_id: &str, at: DateTime<Utc>) -> SyncResult<()>;

    async fn sync_cursor(&self, owner_id: &str) -> SyncResult<SyncCursor>;

    async fn save_cursor(
        &self,
        owner_id: &str,
        cursor_token: Option<&str>,
        full_sync_completed: bool,
    ) -> SyncResult<()>;
}
