//! High-level client for the HinatureDB REST backend.
//!
//! This module provides the [`HinatureDbClient`] struct, which is the primary
//! interface for issuing CRUD and search requests against a HinatureDB
//! server.
//!
//! # Overview
//!
//! The `HinatureDbClient` wraps the low-level request executor and provides
//! one method per logical backend operation:
//!
//! - Creating and updating records, individually and in batches
//! - Looking up a single record by dataset and external ID
//! - Searching records with filters and cursor pagination
//! - Resolving datasets by name
//!
//! # Example
//!
//! ```rust,no_run
//! use url::Url;
//! use hinaturedb_client::{HinatureDbClient, RecordQuery};
//!
//! # async fn example() -> Result<(), hinaturedb_client::ClientError> {
//! let client = HinatureDbClient::new(
//!     Url::parse("https://hinature.example.org").unwrap(),
//!     "alice",
//!     "s3cret",
//! )?;
//!
//! let query = RecordQuery {
//!     kingdom: Some("Animalia".to_string()),
//!     ..RecordQuery::default()
//! };
//! let records = client.search_all_records(&query).await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::config::ClientSettings;

use super::error::ClientError;
use super::geometry::GeometryCodec;
use super::http_client::{DEFAULT_TIMEOUT_SECS, HttpClient, RequestKind};
use super::retry::RetryPolicy;
use super::types::{Dataset, Envelope, PageEnvelope, Record, RecordQuery, RecordUpdate, SearchPage};

/// Authenticated client for one HinatureDB backend.
///
/// The client owns the credentials, the bearer token and the HTTP transport;
/// token state is scoped to this instance and never shared. A token is
/// acquired lazily before the first authenticated call and refreshed in
/// place whenever its safety margin elapses.
///
/// # Retries
///
/// Transient network failures (connection failures, connect timeouts, read
/// timeouts) are retried with exponential backoff, by default 3 attempts
/// with delays of 2 s and 4 s. HTTP status errors and envelope-level
/// failures surface immediately.
///
/// # Thread Safety
///
/// `HinatureDbClient` is safe to share across tasks; concurrent calls are
/// independent, and concurrent token refreshes are serialized internally.
pub struct HinatureDbClient {
    /// The underlying executor handling auth, retry and envelope transport.
    http_client: HttpClient,
    /// Optional codec for structured geometry filters.
    geometry_codec: Option<Arc<dyn GeometryCodec>>,
}

impl HinatureDbClient {
    /// Creates a client with the default retry policy and a 30-second
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be initialized or the
    /// base URL cannot be extended with the token path.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_config(
            base_url,
            username,
            password,
            RetryPolicy::default(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Creates a client with a custom retry policy and request timeout.
    pub fn with_config(
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http_client = HttpClient::new(base_url, username.into(), password.into(), retry, timeout)?;
        Ok(Self {
            http_client,
            geometry_codec: None,
        })
    }

    /// Creates a client from loaded [`ClientSettings`].
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.server_url)?;
        Self::with_config(
            base_url,
            settings.username.clone(),
            settings.password.clone(),
            RetryPolicy::with_max_attempts(settings.max_attempts),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Installs a codec for encoding structured geometry filters.
    ///
    /// Without a codec, only pre-encoded [`Location::Encoded`] values are
    /// accepted in searches.
    ///
    /// [`Location::Encoded`]: super::geometry::Location::Encoded
    pub fn with_geometry_codec(mut self, codec: Arc<dyn GeometryCodec>) -> Self {
        self.geometry_codec = Some(codec);
        self
    }

    /// Returns the configured server address, for logging and display.
    pub fn address(&self) -> String {
        self.http_client.base_url().to_string()
    }

    /// Acquires or refreshes the bearer token if the stored one is missing
    /// or at/after its expiry instant; no-op otherwise.
    ///
    /// Every authenticated operation performs this check internally; calling
    /// it up front is useful to fail fast on bad credentials.
    pub async fn refresh_token(&self) -> Result<(), ClientError> {
        self.http_client.refresh_token().await
    }

    /// Creates a batch of records.
    ///
    /// Returns the identifiers of all created records. There is no partial
    /// success: the batch either wholly succeeds or wholly fails.
    pub async fn create_records(&self, records: &[Record]) -> Result<Vec<Uuid>, ClientError> {
        debug!(count = records.len(); "HTTP: Creating records");
        let body = serde_json::to_value(records)?;
        let envelope: Envelope<Vec<Uuid>> = self
            .http_client
            .send_request(
                Method::POST,
                "/api/v1/record_batch",
                &[],
                Some(body),
                RequestKind::Write,
            )
            .await?;
        envelope.into_data()
    }

    /// Fetches a single record by dataset and external ID.
    ///
    /// Returns `Ok(None)` when the backend reports the record as not found;
    /// this is the only envelope failure that is not an error. `exact`
    /// controls exact external-ID matching on the server side.
    pub async fn get_record(
        &self,
        dataset_id: &str,
        external_id: &str,
        exact: bool,
    ) -> Result<Option<Record>, ClientError> {
        debug!(dataset_id = dataset_id, external_id = external_id; "HTTP: Fetching record");
        let query = [
            ("dataset_id", dataset_id.to_string()),
            ("external_id", external_id.to_string()),
            ("exact", exact.to_string()),
        ];
        let envelope: Envelope<Record> = self
            .http_client
            .send_request(Method::GET, "/api/v1/record", &query, None, RequestKind::Read)
            .await?;
        envelope.into_optional()
    }

    /// Fetches one page of search results.
    ///
    /// `cursor` carries the continuation token from the previous page, if
    /// any. See [`RecordQuery`] for the filter semantics.
    pub async fn search_records(
        &self,
        query: &RecordQuery,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ClientError> {
        let body = query.to_body(cursor, self.geometry_codec.as_deref())?;
        debug!(payload:% = body; "HTTP: Searching records");
        let envelope: PageEnvelope = self
            .http_client
            .send_request(
                Method::POST,
                "/api/v1/records/search",
                &[],
                Some(body),
                RequestKind::Read,
            )
            .await?;
        envelope.into_page()
    }

    /// Fetches every page of search results and concatenates them.
    ///
    /// Issues one underlying search per page, carrying the server cursor
    /// forward until `has_more` is false. An envelope failure on any page
    /// aborts the walk.
    pub async fn search_all_records(&self, query: &RecordQuery) -> Result<Vec<Record>, ClientError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.search_records(query, cursor.as_deref()).await?;
            records.extend(page.records);
            if !page.has_more {
                break;
            }
            cursor = page.cursor;
        }
        debug!(count = records.len(); "HTTP: Search pagination complete");
        Ok(records)
    }

    /// Applies a batch of record updates.
    ///
    /// Returns the identifiers of all updated records; no partial success.
    pub async fn batch_update_records(
        &self,
        updates: &[RecordUpdate],
    ) -> Result<Vec<Uuid>, ClientError> {
        debug!(count = updates.len(); "HTTP: Batch updating records");
        let body = json!({ "updates": updates });
        let envelope: Envelope<Vec<Uuid>> = self
            .http_client
            .send_request(
                Method::PUT,
                "/api/v1/records/batch",
                &[],
                Some(body),
                RequestKind::Write,
            )
            .await?;
        envelope.into_data()
    }

    /// Updates a single record by its identifier.
    pub async fn update_record(
        &self,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<Uuid, ClientError> {
        debug!(record_id = record_id; "HTTP: Updating record");
        let body = serde_json::to_value(update)?;
        let envelope: Envelope<Uuid> = self
            .http_client
            .send_request(
                Method::PUT,
                &format!("/api/v1/record/{record_id}"),
                &[],
                Some(body),
                RequestKind::Write,
            )
            .await?;
        envelope.into_data()
    }

    /// Resolves a dataset by name.
    ///
    /// The backend may hold several datasets with the same name; this lookup
    /// requests a single-element page and returns the first match, which is
    /// the documented behavior.
    pub async fn find_dataset(&self, name: &str) -> Result<Dataset, ClientError> {
        debug!(name = name; "HTTP: Looking up dataset");
        let query = [
            ("page", "0".to_string()),
            ("page_size", "1".to_string()),
            ("name", name.to_string()),
        ];
        let envelope: Envelope<Vec<Dataset>> = self
            .http_client
            .send_request(Method::GET, "/api/v1/datasets", &query, None, RequestKind::Read)
            .await?;
        let mut datasets = envelope.into_data()?;
        if datasets.is_empty() {
            return Err(ClientError::Rejected {
                message: format!("no dataset named {name}"),
            });
        }
        Ok(datasets.remove(0))
    }

    /// Resolves a dataset name to its identifier. First-match semantics as
    /// in [`find_dataset`](Self::find_dataset).
    pub async fn dataset_id(&self, name: &str) -> Result<Uuid, ClientError> {
        self.find_dataset(name).await.map(|dataset| dataset.id)
    }
}
