//! HTTP client module for the HinatureDB REST backend.
//!
//! This module provides a complete client implementation for the HinatureDB
//! `/api/v1` surface. It handles bearer-token lifecycle, record CRUD and
//! search, cursor pagination, and bounded retries for transient network
//! failures.
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`HinatureDbClient`] - High-level client exposing one method per
//!   backend operation
//! - [`ClientError`] - Error taxonomy for client operations
//! - [`RetryPolicy`] - Bounds and backoff schedule for transient failures
//! - Data types ([`Record`], [`Dataset`], [`RecordQuery`], [`SearchPage`])
//!   for request shaping and response decoding
//! - [`Location`] / [`GeometryCodec`] - location filters and the seam for
//!   the external binary geometry codec
//!
//! # Behavior
//!
//! - **Token lifecycle**: a bearer token is acquired lazily, carries a
//!   60-second safety margin against the server-reported TTL, and is
//!   refreshed proactively rather than in reaction to a 401
//! - **Automatic retries**: transient transport failures are retried with
//!   exponential backoff (2 s, 4 s, capped at 10 s; 3 attempts total);
//!   nothing else is retried
//! - **Envelope decoding**: every response is the uniform
//!   `{success, message, data}` envelope, decoded once at the boundary; the
//!   single-record "not found" answer is an empty result, not an error
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
//! let dataset = client.find_dataset("inat-berlin").await?;
//! let record = client.get_record(&dataset.id.to_string(), "obs-42", true).await?;
//! if let Some(record) = record {
//!     println!("found: {:?}", record);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod geometry;
mod hinature_client;
mod http_client;
mod retry;
mod token;
mod types;

pub use error::ClientError;
pub use geometry::{GeometryCodec, Location};
pub use hinature_client::HinatureDbClient;
pub use retry::RetryPolicy;
pub use types::{Dataset, Record, RecordQuery, RecordUpdate, SearchPage};
