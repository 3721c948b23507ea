//! Engine configuration.

use calsync_core::{SyncError, SyncResult};
use chrono_tz::Tz;
use serde::Deserialize;

const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Configuration for the sync engine.
///
/// Loadable from TOML; every field has a default except the OAuth client
/// credentials, which the deployment must provide.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the provider's calendar REST API.
    pub api_base_url: String,
    /// OAuth token endpoint used for refresh grants.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Half-width of the listing window for a full (cursor-less) sync,
    /// in days. The first pull requests `now - window_days` to
    /// `now + window_days`.
    pub window_days: i64,
    /// `maxResults` per listing page.
    pub page_size: u32,
    /// Cap on creates per push phase, to respect invocation time and
    /// rate budgets.
    pub push_batch_limit: usize,
    /// IANA timezone the deployment pins all-day events to.
    pub timezone: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_base_url: GOOGLE_API_BASE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            window_days: 365,
            page_size: 250,
            push_batch_limit: 10,
            timezone: "Asia/Seoul".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn from_toml(contents: &str) -> SyncResult<Self> {
        toml::from_str(contents).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Resolve the configured timezone name.
    pub fn tz(&self) -> SyncResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| SyncError::Config(format!("unknown timezone '{}'", self.timezone)))
    }
}
