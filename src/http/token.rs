//! Bearer-token lifecycle management.
//!
//! The client owns a single bearer token plus its expiry instant. The token
//! is acquired lazily before the first authenticated call and replaced in
//! place once the safety margin elapses; a refresh is never a reaction to a
//! 401 from the backend.

use chrono::Utc;
use log::debug;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::error::ClientError;

/// Seconds subtracted from the server-reported TTL so a token is replaced
/// before the backend actually rejects it.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct AccessToken {
    secret: String,
    /// UTC epoch second at which the token stops being usable.
    expires_at: i64,
}

impl AccessToken {
    fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Successful response body of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: i64,
}

impl TokenGrant {
    fn into_token(self, now: i64) -> AccessToken {
        AccessToken {
            secret: self.access_token,
            expires_at: now + self.expires_in - EXPIRY_MARGIN_SECS,
        }
    }
}

/// Owns the credentials and the current bearer token.
///
/// Token state is guarded by an async mutex held across the check-and-acquire
/// sequence, so concurrent callers that observe an expired token trigger a
/// single refresh instead of racing the token endpoint.
pub(crate) struct TokenManager {
    token_url: Url,
    username: String,
    password: String,
    state: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(token_url: Url, username: String, password: String) -> Self {
        Self {
            token_url,
            username,
            password,
            state: Mutex::new(None),
        }
    }

    /// Returns a bearer secret valid at the time of the check.
    ///
    /// No-op when the stored token is still fresh; otherwise performs the
    /// acquisition call and overwrites the stored token and expiry.
    pub async fn ensure_valid(&self, http: &reqwest::Client) -> Result<String, ClientError> {
        let mut state = self.state.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = state.as_ref()
            && !token.is_expired(now)
        {
            return Ok(token.secret.clone());
        }

        let token = self.acquire(http).await?;
        let secret = token.secret.clone();
        *state = Some(token);
        Ok(secret)
    }

    /// Submits the password grant to the token endpoint.
    async fn acquire(&self, http: &reqwest::Client) -> Result<AccessToken, ClientError> {
        debug!("HTTP: Requesting bearer token");
        let params = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        let res = http.post(self.token_url.clone()).form(&params).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".into());
            return Err(ClientError::Authentication { status, body });
        }

        let grant: TokenGrant = res.json().await?;
        Ok(grant.into_token(Utc::now().timestamp()))
    }
}
