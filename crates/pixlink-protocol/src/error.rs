//! Protocol error types.

use thiserror::Error;

/// Errors produced while validating, encoding, or chunking commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command parameter is outside its family's accepted range.
    #[error("invalid {field}: {value} is not in {min}..={max}")]
    InvalidParameter {
        /// Name of the offending parameter.
        field: &'static str,
        /// Value that was supplied.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// The requested chunk size cannot carry any data.
    #[error("invalid MTU: {mtu} (must be at least 1)")]
    InvalidMtu {
        /// MTU that was supplied.
        mtu: usize,
    },

    /// A payload does not fit the frame header's 32-bit length field.
    #[error("payload too large: {len} bytes exceeds the frame limit of {max}")]
    PayloadTooLarge {
        /// Payload length that was supplied.
        len: usize,
        /// Largest encodable payload length.
        max: usize,
    },
}
