//! Link-layer error types.

use std::time::Duration;

use thiserror::Error;

use pixlink_protocol::ProtocolError;

/// Errors raised while establishing or tearing down the link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No device matched the discovery filter.
    #[error("no matching device answered the scan")]
    NotFound,

    /// The connection attempt did not finish within its deadline.
    #[error("connection attempt timed out after {timeout:?}")]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// A write was attempted without a live link.
    #[error("link is not connected")]
    NotConnected,

    /// The underlying radio stack reported a failure.
    #[error("link backend error: {reason}")]
    Backend {
        /// Backend-specific description.
        reason: String,
    },
}

impl From<btleplug::Error> for ConnectionError {
    fn from(err: btleplug::Error) -> Self {
        ConnectionError::Backend {
            reason: err.to_string(),
        }
    }
}

/// Errors raised while delivering a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A chunk write failed mid-frame; the remaining chunks were not sent
    /// and the frame is rejected. The frame is never resent.
    #[error("frame rejected: chunk {failed_index} of {total} failed; remaining chunks not sent")]
    PartialWrite {
        /// Index of the chunk whose write failed.
        failed_index: u32,
        /// Total chunk count of the frame.
        total: u32,
    },

    /// The link is gone and the reconnect budget is exhausted.
    #[error("link is down")]
    LinkDown,

    /// The frame failed validation or chunking before any write.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The link could not be (re-)established.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
