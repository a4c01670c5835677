//! OAuth client-credentials tokens for the Zeebe gateway

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use super::dto::{TokenRequestBody, TokenResponse};
use crate::domain::job::JobSourceError;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the server omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

/// Client credentials for the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_server_url: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Fetches and caches bearer tokens
#[derive(Debug)]
pub struct TokenProvider {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    request_timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        client: reqwest::Client,
        credentials: OAuthCredentials,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            request_timeout,
            cached: Mutex::new(None),
        }
    }

    /// Current access token, fetching a new one when the cached one is stale
    pub async fn token(&self) -> Result<String, JobSourceError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }

    async fn fetch(&self) -> Result<CachedToken, JobSourceError> {
        debug!(
            authorization_server = %self.credentials.authorization_server_url,
            "Requesting access token"
        );

        let body = TokenRequestBody {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            audience: &self.credentials.audience,
            grant_type: "client_credentials",
        };

        let response = self
            .client
            .post(&self.credentials.authorization_server_url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| JobSourceError::authentication(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(JobSourceError::authentication(format!(
                "HTTP {}: {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            JobSourceError::authentication(format!("Failed to parse token response: {}", e))
        })?;

        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: refresh_at(Instant::now(), lifetime),
        })
    }
}

/// When to refresh a token issued at `now`. Lifetimes too large for
/// `Instant` fall back to the default lifetime.
fn refresh_at(now: Instant, lifetime: Duration) -> Instant {
    now.checked_add(lifetime.saturating_sub(EXPIRY_MARGIN))
        .unwrap_or_else(|| now + DEFAULT_TOKEN_LIFETIME.saturating_sub(EXPIRY_MARGIN))
}
