//! Serde types matching the provider's event resources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const STATUS_CANCELLED: &str = "cancelled";

/// One page of a listing response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsPage {
    pub items: Vec<RemoteEvent>,
    pub next_page_token: Option<String>,
    /// Issued on the final page of a sequence; becomes the cursor for the
    /// next incremental pull.
    pub next_sync_token: Option<String>,
}

/// An event resource as returned by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteEvent {
    pub id: String,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: Option<RemoteEventTime>,
    pub end: Option<RemoteEventTime>,
    pub updated: Option<DateTime<Utc>>,
}

impl RemoteEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CANCELLED)
    }
}

/// Either a date (all-day, exclusive end) or a timestamp.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteEventTime {
    pub date: Option<NaiveDate>,
    pub date_time: Option<DateTime<Utc>>,
    pub time_zone: Option<String>,
}

/// Outbound event body for create/update calls.
///
/// Optional fields are omitted entirely rather than sent as null; the
/// provider treats an explicit null differently from an absent key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub summary: String,
    pub start: TimePayload,
    pub end: TimePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Outbound start/end: exactly one of `date` or `date_time` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Response from the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Usually absent on a refresh grant; the stored refresh token stays
    /// valid in that case.
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}
