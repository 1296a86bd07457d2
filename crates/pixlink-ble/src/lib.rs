//! BLE link layer for pixlink displays.
//!
//! This crate owns the single wireless link to a display and everything
//! that moves bytes across it:
//!
//! - [`ConnectionManager`] — discovery, connect/disconnect, the link state
//!   machine, and reconnect-with-backoff on write failures.
//! - [`Transport`] — chunked, strictly ordered frame delivery on top of
//!   the manager. Concurrent senders queue FIFO; a frame whose chunks were
//!   partially delivered is rejected and never resent.
//! - [`LinkBackend`] — the seam between the state machine and the physical
//!   radio. [`BtleBackend`] is the production implementation over
//!   `btleplug`; tests substitute an in-memory fake.
//!
//! Exactly one physical link is held at a time. All writes are serialized:
//! no two chunk sequences ever interleave on the wire.

mod backend;
mod btle;
mod error;
mod manager;
#[cfg(test)]
mod testutil;
mod transport;

pub use backend::*;
pub use btle::*;
pub use error::*;
pub use manager::*;
pub use transport::*;
