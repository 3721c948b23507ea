//! The full sync cycle for one owner.
//!
//! Phase 1 pulls remote changes into the local store, driven by the
//! provider's incremental cursor; Phase 2 pushes local-only events out.
//! A pull-phase fatal error aborts the cycle and marks the account
//! errored; push failures are per-event and never escalate. The new
//! cursor is persisted only after a page sequence completes cleanly.

use calsync_core::{EventPatch, LocalEvent, SyncError, SyncResult, SyncStatus, TokenRecord};
use chrono::Utc;
use chrono_tz::Tz;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::google::client::CalendarApi;
use crate::lock::OwnerLocks;
use crate::store::{AccountStore, EventStore};
use crate::token::TokenManager;
use crate::transform::{local_to_remote, patch_from_remote, remote_to_local};

/// Counts reported by a completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub imported: usize,
    pub exported: usize,
    pub deleted: usize,
}

/// Cooperative cancellation signal for a running cycle.
///
/// Checked between page requests; raising it stops the cycle without
/// advancing the cursor and without marking the account errored.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SyncOrchestrator {
    events: Arc<dyn EventStore>,
    accounts: Arc<dyn AccountStore>,
    api: Arc<dyn CalendarApi>,
    tokens: TokenManager,
    config: SyncConfig,
    locks: Arc<OwnerLocks>,
}

impl SyncOrchestrator {
    pub fn new(
        events: Arc<dyn EventStore>,
        accounts: Arc<dyn AccountStore>,
        api: Arc<dyn CalendarApi>,
        tokens: TokenManager,
        config: SyncConfig,
        locks: Arc<OwnerLocks>,
    ) -> Self {
        SyncOrchestrator {
            events,
            accounts,
            api,
            tokens,
            config,
            locks,
        }
    }

    /// Run one full pull-then-push cycle for an owner.
    pub async fn run_sync(&self, owner_id: &str, cancel: &CancelFlag) -> SyncResult<SyncOutcome> {
        let _guard = self.locks.try_acquire(owner_id)?;
        let tz = self.config.tz()?;

        let record = self
            .accounts
            .token_record(owner_id)
            .await?
            .ok_or_else(|| SyncError::NotConnected(owner_id.to_string()))?;

        self.accounts
            .set_sync_status(owner_id, SyncStatus::Syncing, None)
            .await?;

        // At most one refresh per cycle; the token is reused for every
        // provider call below.
        let access_token = self.tokens.ensure_valid_token(&record).await?;

        match self.run_cycle(&record, &access_token, tz, cancel).await {
            Ok(outcome) => {
                self.accounts
                    .set_sync_status(owner_id, SyncStatus::Connected, None)
                    .await?;
                self.accounts.mark_synced(owner_id, Utc::now()).await?;
                info!(
                    owner_id,
                    imported = outcome.imported,
                    exported = outcome.exported,
                    deleted = outcome.deleted,
                    "sync cycle complete"
                );
                Ok(outcome)
            }
            Err(SyncError::Cancelled) => {
                // Not a failure: the cursor was not advanced mid-sequence
                // and the account stays healthy.
                self.accounts
                    .set_sync_status(owner_id, SyncStatus::Connected, None)
                    .await?;
                Err(SyncError::Cancelled)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(store_err) = self
                    .accounts
                    .set_sync_status(owner_id, SyncStatus::Error, Some(&message))
                    .await
                {
                    warn!(owner_id, error = %store_err, "failed to record error status");
                }
                Err(e)
            }
        }
    }

    async fn run_cycle(
        &self,
        record: &TokenRecord,
        access_token: &str,
        tz: Tz,
        cancel: &CancelFlag,
    ) -> SyncResult<SyncOutcome> {
        let (imported, deleted) = self.pull(record, access_token, tz, cancel).await?;
        let exported = self.push(record, access_token, tz).await;
        Ok(SyncOutcome {
            imported,
            exported,
            deleted,
        })
    }

    /// Phase 1: apply remote changes to the local store.
    async fn pull(
        &self,
        record: &TokenRecord,
        access_token: &str,
        tz: Tz,
        cancel: &CancelFlag,
    ) -> SyncResult<(usize, usize)> {
        let owner_id = record.owner_id.as_str();

        // One query up front; maintained incrementally below so that a
        // mid-pagination resync re-classifies already-applied rows as
        // known instead of inserting duplicates.
        let mut existing = self.events.remote_events_by_external_id(owner_id).await?;

        let mut cursor = self.accounts.sync_cursor(owner_id).await?.cursor_token;
        let mut page_token: Option<String> = None;
        let mut tracked_cursor: Option<String> = None;
        let mut resynced = false;
        let mut imported = 0usize;
        let mut deleted = 0usize;

        loop {
            if cancel.is_cancelled() {
                debug!(owner_id, "cancellation requested, stopping before next page");
                return Err(SyncError::Cancelled);
            }

            let page = match self
                .api
                .list_events(
                    access_token,
                    &record.calendar_id,
                    cursor.as_deref(),
                    page_token.as_deref(),
                )
                .await
            {
                Ok(page) => page,
                Err(SyncError::CursorInvalid) if !resynced => {
                    info!(owner_id, "sync cursor expired, restarting with a full window");
                    cursor = None;
                    page_token = None;
                    tracked_cursor = None;
                    resynced = true;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut to_delete: Vec<LocalEvent> = Vec::new();
            let mut to_insert: Vec<LocalEvent> = Vec::new();
            let mut to_update: Vec<(String, EventPatch)> = Vec::new();

            for item in &page.items {
                if item.is_cancelled() {
                    // Unknown cancelled items are no-ops, not errors
                    if let Some(local) = existing.remove(&item.id) {
                        to_delete.push(local);
                    }
                } else if let Some(local) = existing.get(&item.id) {
                    if let Some(patch) = patch_from_remote(item, tz) {
                        to_update.push((local.id.clone(), patch));
                    }
                } else if let Some(local) = remote_to_local(item, owner_id, tz) {
                    to_insert.push(local);
                } else {
                    debug!(external_id = %item.id, "skipping remote event without usable times");
                }
            }

            for local in to_delete {
                match self.events.delete_event(&local.id).await {
                    Ok(()) => deleted += 1,
                    Err(e) => {
                        warn!(event_id = %local.id, error = %e, "failed to delete local event")
                    }
                }
            }

            if !to_insert.is_empty() {
                match self.events.insert_events(&to_insert).await {
                    Ok(()) => {
                        imported += to_insert.len();
                        for event in to_insert {
                            if let Some(ext) = event.external_id.clone() {
                                existing.insert(ext, event);
                            }
                        }
                    }
                    Err(e) => {
                        warn!(owner_id, error = %e, "batch insert failed, retrying rows individually");
                        for event in to_insert {
                            match self.events.insert_event(&event).await {
                                Ok(()) => {
                                    imported += 1;
                                    if let Some(ext) = event.external_id.clone() {
                                        existing.insert(ext, event);
                                    }
                                }
                                Err(e) => {
                                    warn!(external_id = ?event.external_id, error = %e, "failed to import event")
                                }
                            }
                        }
                    }
                }
            }

            // One store call per row; the store exposes no batch update
            let results = join_all(to_update.into_iter().map(|(id, patch)| async move {
                let result = self.events.apply_patch(&id, &patch).await;
                (id, result)
            }))
            .await;
            for (id, result) in results {
                if let Err(e) = result {
                    warn!(event_id = %id, error = %e, "failed to update local event");
                }
            }

            if let Some(token) = page.next_sync_token {
                tracked_cursor = Some(token);
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        self.accounts
            .save_cursor(owner_id, tracked_cursor.as_deref(), true)
            .await?;

        Ok((imported, deleted))
    }

    /// Phase 2: create remote events for a bounded batch of local-only
    /// rows. Failures here are per-event and leave the row eligible for
    /// the next cycle.
    async fn push(&self, record: &TokenRecord, access_token: &str, tz: Tz) -> usize {
        let owner_id = record.owner_id.as_str();

        let candidates = match self
            .events
            .push_candidates(owner_id, self.config.push_batch_limit)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(owner_id, error = %e, "failed to load push candidates");
                return 0;
            }
        };

        let results = join_all(candidates.iter().map(|event| {
            let payload = local_to_remote(event, tz);
            async move {
                self.api
                    .create_event(access_token, &record.calendar_id, &payload)
                    .await
            }
        }))
        .await;

        let mut exported = 0usize;
        for (event, result) in candidates.iter().zip(results) {
            match result {
                Ok(remote) => {
                    match self.events.set_external_id(&event.id, Some(&remote.id)).await {
                        Ok(()) => exported += 1,
                        Err(e) => {
                            warn!(event_id = %event.id, error = %e, "failed to stamp external id")
                        }
                    }
                }
                Err(e) => warn!(event_id = %event.id, error = %e, "failed to push event"),
            }
        }
        exported
    }
}
