//! Error taxonomy for the progress engine.
//!
//! Transport errors are transient and recovered locally (push reconnect,
//! next poll tick); `FailureReason` covers the two terminal failures the
//! engine surfaces to the consumer, kept distinct so the UI can tell
//! "the run failed" from "the run finished but we couldn't load results".

use thiserror::Error;

/// Errors produced by the network adapters (poll requests, push
/// subscription, result fetch).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connecting or subscribing failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// A request or stream read failed mid-flight.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A response body or frame could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The push stream was closed by the server without a terminal event.
    #[error("stream closed")]
    StreamClosed,
}

/// Terminal failure reason surfaced on the engine view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The server reported the job itself as failed.
    #[error("job failed: {message}")]
    JobFailed {
        /// Server-supplied failure message.
        message: String,
    },

    /// The job completed but the final result could not be fetched.
    #[error("result unavailable: {message}")]
    ResultUnavailable {
        /// Underlying fetch error.
        message: String,
    },
}
