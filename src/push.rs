//! On-demand propagation of one event, used right after a local
//! create/update/delete instead of waiting for the next batch cycle.

use calsync_core::{LocalEvent, SyncError, SyncResult, TokenRecord};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::google::client::CalendarApi;
use crate::store::{AccountStore, EventStore};
use crate::token::TokenManager;
use crate::transform::local_to_remote;

/// What the caller just did to the event locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    Create,
    Update,
    Delete,
}

pub struct SinglePushHandler {
    events: Arc<dyn EventStore>,
    accounts: Arc<dyn AccountStore>,
    api: Arc<dyn CalendarApi>,
    tokens: TokenManager,
    config: SyncConfig,
}

impl SinglePushHandler {
    pub fn new(
        events: Arc<dyn EventStore>,
        accounts: Arc<dyn AccountStore>,
        api: Arc<dyn CalendarApi>,
        tokens: TokenManager,
        config: SyncConfig,
    ) -> Self {
        SinglePushHandler {
            events,
            accounts,
            api,
            tokens,
            config,
        }
    }

    pub async fn push_event(
        &self,
        owner_id: &str,
        event_id: &str,
        action: PushAction,
    ) -> SyncResult<()> {
        let record = self
            .accounts
            .token_record(owner_id)
            .await?
            .ok_or_else(|| SyncError::NotConnected(owner_id.to_string()))?;
        let tz = self.config.tz()?;
        let access_token = self.tokens.ensure_valid_token(&record).await?;

        let event = self.events.find_event(owner_id, event_id).await?;

        match action {
            PushAction::Create => {
                let event =
                    event.ok_or_else(|| SyncError::EventNotFound(event_id.to_string()))?;
                self.create_remote(&record, &access_token, &event, tz).await
            }
            PushAction::Update => {
                let event =
                    event.ok_or_else(|| SyncError::EventNotFound(event_id.to_string()))?;
                let Some(external_id) = event.external_id.clone() else {
                    // Never pushed yet; an update is a create
                    return self.create_remote(&record, &access_token, &event, tz).await;
                };

                let payload = local_to_remote(&event, tz);
                match self
                    .api
                    .update_event(&access_token, &record.calendar_id, &external_id, &payload)
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        // Creating a replacement here would duplicate the
                        // event if the remote copy still exists. Clearing
                        // the external id hands the row to the next push
                        // phase instead.
                        warn!(
                            owner_id,
                            event_id,
                            external_id = %external_id,
                            error = %e,
                            "remote update failed, clearing external id for re-push"
                        );
                        self.events.set_external_id(&event.id, None).await
                    }
                }
            }
            PushAction::Delete => {
                // Row already gone locally, nothing left to correlate
                let Some(event) = event else { return Ok(()) };
                let Some(external_id) = event.external_id.clone() else {
                    return Ok(());
                };

                // Deleting the local row is the caller's side of the
                // operation; the stamp is cleared so a row the caller
                // fails to remove is not left pointing at a deleted
                // remote event
                self.api
                    .delete_event(&access_token, &record.calendar_id, &external_id)
                    .await?;
                self.events.set_external_id(&event.id, None).await
            }
        }
    }

    async fn create_remote(
        &self,
        record: &TokenRecord,
        access_token: &str,
        event: &LocalEvent,
        tz: Tz,
    ) -> SyncResult<()> {
        if event.external_id.is_some() {
            // A concurrent batch cycle beat us to it; creating again
            // would duplicate the event remotely
            debug!(event_id = %event.id, "event already has an external id, skipping create");
            return Ok(());
        }

        let payload = local_to_remote(event, tz);
        let remote = self
            .api
            .create_event(access_token, &record.calendar_id, &payload)
            .await?;
        self.events.set_external_id(&event.id, Some(&remote.id)).await
    }
}
