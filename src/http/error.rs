//! Error types for HinatureDB client operations.
//!
//! This module defines the [`ClientError`] enum which encompasses all possible
//! failure modes when communicating with a HinatureDB backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur during client operations.
///
/// This enum provides specific error variants for different failure modes,
/// enabling callers to handle errors appropriately based on their type.
/// All variants implement [`std::error::Error`] and [`std::fmt::Display`]
/// through the `thiserror` derive macro.
///
/// # Error Categories
///
/// - **Transport errors**: [`Transport`](ClientError::Transport): connection
///   and timeout failures; the transient subset of these is retried (see
///   [`ClientError::is_transient`])
/// - **Authentication errors**: [`Authentication`](ClientError::Authentication)
///   the token endpoint rejected the credentials
/// - **Server errors**: [`Status`](ClientError::Status),
///   [`WriteRejected`](ClientError::WriteRejected): non-2xx responses
/// - **Application errors**: [`Rejected`](ClientError::Rejected): the server
///   answered 2xx but flagged the operation as failed in the response envelope
/// - **Client errors**: [`Url`](ClientError::Url), [`Json`](ClientError::Json),
///   [`Geometry`](ClientError::Geometry)
///
/// # Example
///
/// ```rust,no_run
/// use hinaturedb_client::ClientError;
///
/// fn handle_error(err: ClientError) {
///     match err {
///         ClientError::Status { status, body } => {
///             eprintln!("Server returned {}: {}", status, body);
///         }
///         ClientError::Rejected { message } => {
///             eprintln!("Operation rejected: {}", message);
///         }
///         ClientError::Transport(e) => {
///             eprintln!("Network error: {}", e);
///         }
///         _ => eprintln!("Other error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request failed at the transport level.
    ///
    /// This covers connection-establishment failures, connect timeouts,
    /// read timeouts, DNS resolution failures and TLS errors. The
    /// connect/timeout subset is considered transient and is retried.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint returned a non-2xx status.
    ///
    /// Credentials were rejected or the token service is misbehaving.
    /// Never retried; fatal to the calling operation.
    #[error("Token request failed with status {status}: {body}")]
    Authentication {
        /// The HTTP status code returned by the token endpoint.
        status: StatusCode,
        /// The response body, which may contain error details.
        body: String,
    },

    /// A read endpoint returned a non-2xx status code.
    ///
    /// Contains both the HTTP status code and the response body for debugging.
    #[error("Server error {status}: {body}")]
    Status {
        /// The HTTP status code returned by the server.
        status: StatusCode,
        /// The response body, which may contain error details.
        body: String,
    },

    /// A write endpoint (create, update, batch-update) returned a non-2xx
    /// status code.
    ///
    /// Enriched with the request URL and the response body; when the body
    /// parses as JSON the structured diagnostics are kept, otherwise the raw
    /// text is carried as-is.
    #[error("Write to {url} failed with status {status}: {details}")]
    WriteRejected {
        /// The HTTP status code returned by the server.
        status: StatusCode,
        /// The full URL of the rejected request.
        url: String,
        /// Parsed JSON diagnostics, or the raw response text.
        details: String,
    },

    /// The server answered 2xx but the response envelope reported failure.
    ///
    /// Carries the server-provided message. The documented "Record not found"
    /// absence case on single-record lookup is *not* mapped to this variant;
    /// it is surfaced as an empty result instead.
    #[error("Request rejected by server: {message}")]
    Rejected {
        /// The `message` field of the failure envelope.
        message: String,
    },

    /// Failed to parse or construct a URL.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to serialize or deserialize JSON data.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A structured geometry could not be encoded for the wire.
    ///
    /// Either no geometry codec is configured or the codec itself failed.
    #[error("Geometry encoding failed: {0}")]
    Geometry(String),
}

impl ClientError {
    /// Whether this failure is a transient network error eligible for retry.
    ///
    /// Only transport-level connect failures and timeouts qualify. HTTP
    /// status errors and envelope-level failures are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}
