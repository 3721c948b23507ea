//! In-memory store, used by the test suite and for embedding the engine
//! without a database.

use async_trait::async_trait;
use calsync_core::{
    EventPatch, EventSource, LocalEvent, SyncCursor, SyncError, SyncResult, SyncStatus, TokenRecord,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{AccountStore, EventStore};

#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<HashMap<String, LocalEvent>>,
    accounts: Mutex<HashMap<String, TokenRecord>>,
    cursors: Mutex<HashMap<String, SyncCursor>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_account(&self, record: TokenRecord) {
        self.accounts
            .lock()
            .expect("accounts lock")
            .insert(record.owner_id.clone(), record);
    }

    pub fn put_event(&self, event: LocalEvent) {
        self.events
            .lock()
            .expect("events lock")
            .insert(event.id.clone(), event);
    }

    pub fn account(&self, owner_id: &str) -> Option<TokenRecord> {
        self.accounts.lock().expect("accounts lock").get(owner_id).cloned()
    }

    pub fn event(&self, event_id: &str) -> Option<LocalEvent> {
        self.events.lock().expect("events lock").get(event_id).cloned()
    }

    pub fn events_for(&self, owner_id: &str) -> Vec<LocalEvent> {
        self.events
            .lock()
            .expect("events lock")
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn cursor(&self, owner_id: &str) -> Option<SyncCursor> {
        self.cursors.lock().expect("cursors lock").get(owner_id).cloned()
    }

    /// Mimics the store's unique index on (owner, external_id).
    fn check_unique_external_id(
        events: &HashMap<String, LocalEvent>,
        event: &LocalEvent,
    ) -> SyncResult<()> {
        if let Some(ext) = &event.external_id {
            let duplicate = events
                .values()
                .any(|e| e.owner_id == event.owner_id && e.external_id.as_ref() == Some(ext));
            if duplicate {
                return Err(SyncError::Store(format!(
                    "duplicate external_id '{ext}' for owner '{}'",
                    event.owner_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn remote_events_by_external_id(
        &self,
        owner_id: &str,
    ) -> SyncResult<HashMap<String, LocalEvent>> {
        let events = self.events.lock().expect("events lock");
        Ok(events
            .values()
            .filter(|e| e.owner_id == owner_id && e.source == EventSource::Remote)
            .filter_map(|e| e.external_id.clone().map(|ext| (ext, e.clone())))
            .collect())
    }

    async fn push_candidates(&self, owner_id: &str, limit: usize) -> SyncResult<Vec<LocalEvent>> {
        let events = self.events.lock().expect("events lock");
        let mut candidates: Vec<LocalEvent> = events
            .values()
            .filter(|e| e.owner_id == owner_id && e.is_push_candidate())
            .cloned()
            .collect();
        // Deterministic order for the bounded batch
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn find_event(&self, owner_id: &str, event_id: &str) -> SyncResult<Option<LocalEvent>> {
        let events = self.events.lock().expect("events lock");
        Ok(events
            .get(event_id)
            .filter(|e| e.owner_id == owner_id)
            .cloned())
    }

    async fn insert_events(&self, batch: &[LocalEvent]) -> SyncResult<()> {
        let mut events = self.events.lock().expect("events lock");
        for event in batch {
            Self::check_unique_external_id(&events, event)?;
        }
        for event in batch {
            events.insert(event.id.clone(), event.clone());
        }
        Ok(())
    }

    async fn insert_event(&self, event: &LocalEvent) -> SyncResult<()> {
        let mut events = self.events.lock().expect("events lock");
        Self::check_unique_external_id(&events, event)?;
        events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn apply_patch(&self, event_id: &str, patch: &EventPatch) -> SyncResult<()> {
        let mut events = self.events.lock().expect("events lock");
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| SyncError::Store(format!("no event '{event_id}'")))?;
        event.title = patch.title.clone();
        event.starts_at = patch.starts_at;
        event.ends_at = patch.ends_at;
        event.location = patch.location.clone();
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> SyncResult<()> {
        self.events.lock().expect("events lock").remove(event_id);
        Ok(())
    }

    async fn set_external_id(&self, event_id: &str, external_id: Option<&str>) -> SyncResult<()> {
        let mut events = self.events.lock().expect("events lock");
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| SyncError::Store(format!("no event '{event_id}'")))?;
        event.external_id = external_id.map(String::from);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn token_record(&self, owner_id: &str) -> SyncResult<Option<TokenRecord>> {
        Ok(self.accounts.lock().expect("accounts lock").get(owner_id).cloned())
    }

    async fn save_tokens(
        &self,
        owner_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> SyncResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        let record = accounts
            .get_mut(owner_id)
            .ok_or_else(|| SyncError::Store(format!("no account '{owner_id}'")))?;
        record.access_token = access_token.to_string();
        record.refresh_token = refresh_token.to_string();
        record.expires_at = expires_at;
        Ok(())
    }

    async fn set_sync_status(
        &self,
        owner_id: &str,
        status: SyncStatus,
        error: Option<&str>,
    ) -> SyncResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        let record = accounts
            .get_mut(owner_id)
            .ok_or_else(|| SyncError::Store(format!("no account '{owner_id}'")))?;
        record.sync_status = status;
        record.sync_error = error.map(String::from);
        Ok(())
    }

    async fn mark_synced(&self, owner_id: &str, at: DateTime<Utc>) -> SyncResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        let record = accounts
            .get_mut(owner_id)
            .ok_or_else(|| SyncError::Store(format!("no account '{owner_id}'")))?;
        record.last_synced_at = Some(at);
        Ok(())
    }

    async fn sync_cursor(&self, owner_id: &str) -> SyncResult<SyncCursor> {
        let cursors = self.cursors.lock().expect("cursors lock");
        Ok(cursors
            .get(owner_id)
            .cloned()
            .unwrap_or_else(|| SyncCursor::empty(owner_id)))
    }

    async fn save_cursor(
        &self,
        owner_id: &str,
        cursor_token: Option<&str>,
        full_sync_completed: bool,
    ) -> SyncResult<()> {
        let mut cursors = self.cursors.lock().expect("cursors lock");
        cursors.insert(
            owner_id.to_string(),
            SyncCursor {
                owner_id: owner_id.to_string(),
                cursor_token: cursor_token.map(String::from),
                full_sync_completed,
            },
        );
        Ok(())
    }
}
