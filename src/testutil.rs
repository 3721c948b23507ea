//! Shared fixtures for the engine's tests: canned records and a
//! scriptable in-memory `CalendarApi`.

use async_trait::async_trait;
use calsync_core::{
    EventKind, EventSource, LocalEvent, SyncError, SyncResult, SyncStatus, TokenRecord,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::google::client::CalendarApi;
use crate::google::types::{EventPayload, EventsPage, RemoteEvent, RemoteEventTime};

pub(crate) fn token_record(owner_id: &str, expires_at: DateTime<Utc>) -> TokenRecord {
    TokenRecord {
        owner_id: owner_id.to_string(),
        access_token: "access-0".to_string(),
        refresh_token: "refresh-0".to_string(),
        token_type: "Bearer".to_string(),
        expires_at,
        scope: "calendar.events".to_string(),
        calendar_id: "primary".to_string(),
        sync_status: SyncStatus::Connected,
        sync_error: None,
        last_synced_at: None,
    }
}

/// A push-eligible local event.
pub(crate) fn local_event(owner_id: &str, title: &str) -> LocalEvent {
    LocalEvent {
        id: LocalEvent::new_id(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        kind: EventKind::Meeting,
        starts_at: Utc::now() + Duration::hours(1),
        ends_at: Utc::now() + Duration::hours(2),
        project_id: None,
        source: EventSource::Local,
        external_id: None,
        location: None,
        attendee_ids: Vec::new(),
    }
}

pub(crate) fn remote_timed(id: &str, summary: &str) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        status: Some("confirmed".to_string()),
        summary: Some(summary.to_string()),
        start: Some(RemoteEventTime {
            date_time: Some(Utc::now() + Duration::hours(3)),
            ..Default::default()
        }),
        end: Some(RemoteEventTime {
            date_time: Some(Utc::now() + Duration::hours(4)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn remote_cancelled(id: &str) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        status: Some("cancelled".to_string()),
        ..Default::default()
    }
}

pub(crate) fn page(
    items: Vec<RemoteEvent>,
    next_page_token: Option<&str>,
    next_sync_token: Option<&str>,
) -> EventsPage {
    EventsPage {
        items,
        next_page_token: next_page_token.map(String::from),
        next_sync_token: next_sync_token.map(String::from),
    }
}

/// Scriptable `CalendarApi` double. Listing responses are queued with
/// `push_page` and consumed in order; an exhausted queue serves empty
/// pages.
#[derive(Default)]
pub(crate) struct FakeCalendar {
    pages: Mutex<VecDeque<SyncResult<EventsPage>>>,
    list_calls: Mutex<Vec<(Option<String>, Option<String>)>>,
    created: Mutex<Vec<EventPayload>>,
    updated: Mutex<Vec<(String, EventPayload)>>,
    deleted: Mutex<Vec<String>>,
    create_failures: Mutex<HashSet<String>>,
    update_failures: Mutex<HashSet<String>>,
    tokens_seen: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, response: SyncResult<EventsPage>) {
        self.pages.lock().unwrap().push_back(response);
    }

    pub fn fail_create_for(&self, summary: &str) {
        self.create_failures.lock().unwrap().insert(summary.to_string());
    }

    pub fn fail_update_for(&self, external_id: &str) {
        self.update_failures.lock().unwrap().insert(external_id.to_string());
    }

    pub fn list_calls(&self) -> Vec<(Option<String>, Option<String>)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<EventPayload> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, EventPayload)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> HashSet<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarApi for FakeCalendar {
    async fn list_events(
        &self,
        access_token: &str,
        _calendar_id: &str,
        cursor: Option<&str>,
        page_token: Option<&str>,
    ) -> SyncResult<EventsPage> {
        self.tokens_seen.lock().unwrap().insert(access_token.to_string());
        self.list_calls
            .lock()
            .unwrap()
            .push((cursor.map(String::from), page_token.map(String::from)));

        match self.pages.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(EventsPage::default()),
        }
    }

    async fn create_event(
        &self,
        access_token: &str,
        _calendar_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent> {
        self.tokens_seen.lock().unwrap().insert(access_token.to_string());

        if self.create_failures.lock().unwrap().contains(&payload.summary) {
            return Err(SyncError::Provider {
                status: 500,
                message: "create rejected".to_string(),
            });
        }

        self.created.lock().unwrap().push(payload.clone());
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(RemoteEvent {
            id: format!("ext-{n}"),
            status: Some("confirmed".to_string()),
            summary: Some(payload.summary.clone()),
            ..Default::default()
        })
    }

    async fn update_event(
        &self,
        access_token: &str,
        _calendar_id: &str,
        external_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<RemoteEvent> {
        self.tokens_seen.lock().unwrap().insert(access_token.to_string());

        if self.update_failures.lock().unwrap().contains(external_id) {
            return Err(SyncError::Provider {
                status: 404,
                message: "no such event".to_string(),
            });
        }

        self.updated
            .lock()
            .unwrap()
            .push((external_id.to_string(), payload.clone()));
        Ok(RemoteEvent {
            id: external_id.to_string(),
            status: Some("confirmed".to_string()),
            summary: Some(payload.summary.clone()),
            ..Default::default()
        })
    }

    async fn delete_event(
        &self,
        access_token: &str,
        _calendar_id: &str,
        external_id: &str,
    ) -> SyncResult<()> {
        self.tokens_seen.lock().unwrap().insert(access_token.to_string());
        self.deleted.lock().unwrap().push(external_id.to_string());
        Ok(())
    }
}
