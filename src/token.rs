//! OAuth access-token lifecycle for one owner.
//!
//! Tokens are refreshed proactively when they are within five minutes of
//! expiry. A refresh failure marks the account as errored and aborts the
//! caller's cycle; the stored tokens are left untouched so a later
//! reconnect attempt starts from known state.

use calsync_core::{SyncError, SyncResult, SyncStatus, TokenRecord};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::google::types::TokenResponse;
use crate::store::AccountStore;

/// Refresh this long before actual expiry.
const EXPIRY_SKEW_MINUTES: i64 = 5;

pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    accounts: Arc<dyn AccountStore>,
}

impl TokenManager {
    pub fn new(config: &SyncConfig, accounts: Arc<dyn AccountStore>) -> Self {
        TokenManager {
            http: reqwest::Client::new(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            accounts,
        }
    }

    /// Return a bearer token valid for the rest of the invocation.
    ///
    /// Callers hold on to the returned token for the whole cycle, so at
    /// most one refresh happens per invocation.
    pub async fn ensure_valid_token(&self, record: &TokenRecord) -> SyncResult<String> {
        let skew = Duration::minutes(EXPIRY_SKEW_MINUTES);
        if record.expires_at - Utc::now() >= skew {
            return Ok(record.access_token.clone());
        }

        debug!(owner_id = %record.owner_id, "access token near expiry, refreshing");

        match self.refresh(record).await {
            Ok(tokens) => {
                // Providers often omit the refresh token on a refresh
                // grant; the stored one stays valid then.
                let refresh_token = tokens
                    .refresh_token
                    .unwrap_or_else(|| record.refresh_token.clone());
                let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);

                self.accounts
                    .save_tokens(&record.owner_id, &tokens.access_token, &refresh_token, expires_at)
                    .await?;

                Ok(tokens.access_token)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(owner_id = %record.owner_id, error = %message, "token refresh failed");
                // Best effort: the refresh failure is the error that matters
                if let Err(store_err) = self
                    .accounts
                    .set_sync_status(&record.owner_id, SyncStatus::Error, Some(&message))
                    .await
                {
                    warn!(owner_id = %record.owner_id, error = %store_err, "failed to record error status");
                }
                Err(SyncError::Auth(message))
            }
        }
    }

    async fn refresh(&self, record: &TokenRecord) -> SyncResult<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", record.refresh_token.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))
    }
}
