//! Typed HTTP client for the provider's event endpoints.
//!
//! Understands pagination (`pageToken`), incremental cursors
//! (`syncToken`), and the provider's cursor-expiry signal (HTTP 410),
//! which is surfaced as `SyncError::CursorInvalid` so the orchestrator
//! can fall back to a full resync instead of failing the cycle.

use async_trait::async_trait;
use calsync_core::{SyncError, SyncResult};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::google::types::{EventPayload, EventsPage, RemoteEvent};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

/// Provider I/O as the orchestrator and push handler see it.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// List events. With a cursor, only changes since that cursor are
    /// returned; without one, the full configured window is listed.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        cursor: Option<&str>,
        page_token: Option<&str>,
    ) -> SyncResult<EventsPage>;

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent>;

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent>;

    /// Delete an event. "Already gone" (404/410) is success: the goal
    /// state, absence, is already achieved.
    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
    ) -> SyncResult<()>;
}

/// `CalendarApi` implementation over the provider's REST API.
pub struct RemoteEventClient {
    http: reqwest::Client,
    base_url: String,
    window_days: i64,
    page_size: u32,
}

impl RemoteEventClient {
    pub fn new(config: &SyncConfig) -> Self {
        RemoteEventClient {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            window_days: config.window_days,
            page_size: config.page_size,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.base_url, calendar_id)
    }

    /// Send a request, retrying transient failures (429, 5xx, transport
    /// errors) with doubling backoff. Anything else is returned as-is
    /// for the caller to interpret.
    async fn send_with_retry<F>(&self, build: F) -> SyncResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient = status.as_u16() == 429 || status.is_server_error();
                    if transient && attempt < MAX_ATTEMPTS {
                        warn!(status = status.as_u16(), attempt, "transient provider error, retrying");
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(error = %e, attempt, "request failed, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(e) => return Err(SyncError::Transport(e.to_string())),
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << (attempt - 1))
}

async fn provider_error(response: reqwest::Response) -> SyncError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    SyncError::Provider { status, message }
}

#[async_trait]
impl CalendarApi for RemoteEventClient {
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        cursor: Option<&str>,
        page_token: Option<&str>,
    ) -> SyncResult<EventsPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("maxResults", self.page_size.to_string()),
            ("singleEvents", "true".to_string()),
        ];

        match cursor {
            Some(token) => params.push(("syncToken", token.to_string())),
            None => {
                // Full window; the provider rejects orderBy on
                // incremental (syncToken) requests.
                let now = Utc::now();
                let window = chrono::Duration::days(self.window_days);
                params.push(("timeMin", (now - window).to_rfc3339()));
                params.push(("timeMax", (now + window).to_rfc3339()));
                params.push(("orderBy", "startTime".to_string()));
            }
        }

        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        debug!(calendar_id, incremental = cursor.is_some(), "listing events");

        let url = self.events_url(calendar_id);
        let response = self
            .send_with_retry(|| self.http.get(&url).bearer_auth(access_token).query(&params))
            .await?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<EventsPage>()
                .await
                .map_err(|e| SyncError::Transport(e.to_string()))
        } else if status.as_u16() == 410 {
            Err(SyncError::CursorInvalid)
        } else {
            Err(provider_error(response).await)
        }
    }

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent> {
        let url = self.events_url(calendar_id);
        let response = self
            .send_with_retry(|| self.http.post(&url).bearer_auth(access_token).json(payload))
            .await?;

        if response.status().is_success() {
            response
                .json::<RemoteEvent>()
                .await
                .map_err(|e| SyncError::Transport(e.to_string()))
        } else {
            Err(provider_error(response).await)
        }
    }

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent> {
        let url = format!("{}/{}", self.events_url(calendar_id), external_id);
        let response = self
            .send_with_retry(|| self.http.patch(&url).bearer_auth(access_token).json(payload))
            .await?;

        if response.status().is_success() {
            response
                .json::<RemoteEvent>()
                .await
                .map_err(|e| SyncError::Transport(e.to_string()))
        } else {
            Err(provider_error(response).await)
        }
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        external_id: &str,
    ) -> SyncResult<()> {
        let url = format!("{}/{}", self.events_url(calendar_id), external_id);
        let response = self
            .send_with_retry(|| self.http.delete(&url).bearer_auth(access_token))
            .await?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 404 || status.as_u16() == 410 {
            if !status.is_success() {
                debug!(external_id, status = status.as_u16(), "event already gone remotely");
            }
            Ok(())
        } else {
            Err(provider_error(response).await)
        }
    }
}
