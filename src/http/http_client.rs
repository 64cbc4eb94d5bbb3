// Copyright 2026 The HinatureDB Client Authors
// SPDX-License-Identifier: BSD-3-Clause

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::error::ClientError;
use super::retry::{RetryPolicy, retry_transient};
use super::token::TokenManager;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

const TOKEN_PATH: &str = "/api/v1/token";

/// How a request's response headers and failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    /// Read-style call: carries `Cache-Control: no-store`, plain status errors.
    Read,
    /// Write-style call: status errors are enriched with parsed body and URL.
    Write,
}

/// Low-level request executor.
///
/// Owns the shared transport, the token manager and the retry policy. Every
/// request goes out with a fresh-enough bearer token, a uniform timeout, and
/// bounded retries for transient transport failures.
pub(crate) struct HttpClient {
    base_url: Url,
    http: reqwest::Client,
    tokens: TokenManager,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(
        base_url: Url,
        username: String,
        password: String,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let token_url = base_url.join(TOKEN_PATH)?;
        Ok(Self {
            base_url,
            http,
            tokens: TokenManager::new(token_url, username, password),
            retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Refresh-if-needed precondition check, exposed to callers that want to
    /// fail fast on bad credentials before issuing real traffic.
    pub async fn refresh_token(&self) -> Result<(), ClientError> {
        self.tokens.ensure_valid(&self.http).await.map(|_| ())
    }

    /// Executes one logical call: token precondition, bearer header, send,
    /// status check and body deserialization, all under the retry policy.
    ///
    /// `T` is the endpoint's envelope type; envelope interpretation stays
    /// with the caller so absence and pagination cases keep their meaning.
    pub async fn send_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        kind: RequestKind,
    ) -> Result<T, ClientError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        retry_transient(&self.retry, path, || {
            let method = method.clone();
            let url = url.clone();
            let body = body.clone();
            async move { self.attempt(method, url, body, kind).await }
        })
        .await
    }

    /// A single attempt of the call. Transport failures bubble out to the
    /// retry combinator; everything else is final.
    async fn attempt<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        kind: RequestKind,
    ) -> Result<T, ClientError> {
        let token = self.tokens.ensure_valid(&self.http).await?;

        let mut req = self.http.request(method, url.clone()).bearer_auth(&token);
        if kind == RequestKind::Read {
            req = req.header("Cache-Control", "no-store");
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Self::status_error(status, &url, res, kind).await);
        }
        Ok(res.json().await?)
    }

    async fn status_error(
        status: StatusCode,
        url: &Url,
        res: reqwest::Response,
        kind: RequestKind,
    ) -> ClientError {
        let body = res
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".into());
        match kind {
            RequestKind::Read => ClientError::Status { status, body },
            RequestKind::Write => {
                // Structured diagnostics when the server sent JSON, raw text
                // otherwise.
                let details = match serde_json::from_str::<Value>(&body) {
                    Ok(parsed) => parsed.to_string(),
                    Err(_) => body,
                };
                ClientError::WriteRejected {
                    status,
                    url: url.to_string(),
                    details,
                }
            },
        }
    }
}
