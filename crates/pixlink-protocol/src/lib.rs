//! pixlink display protocol
//!
//! This crate provides the typed command model and wire encoding for the
//! pixlink family of BLE pixel-matrix displays (16×16, 32×32, 64×64).
//! It is pure data transformation: no I/O happens here.
//!
//! # Protocol overview
//!
//! Every operation is expressed as a [`Command`], encoded by [`FrameCodec`]
//! into exactly one [`Frame`]:
//!
//! ```text
//! +-----------------------------+--------+------+------------------+
//! | payload length (u32, LE)    | opcode | mode | payload[0..len]  |
//! +-----------------------------+--------+------+------------------+
//! ```
//!
//! The serialized frame is then split by [`Chunker`] into MTU-bounded
//! [`Chunk`]s for transmission over the BLE write characteristic. The
//! concatenation of all chunks in ascending sequence order reconstructs
//! the serialized frame byte for byte.
//!
//! # Example
//!
//! ```rust
//! use pixlink_protocol::{Chunker, Command, FrameCodec};
//!
//! let frame = FrameCodec::encode(&Command::Brightness { percent: 80 })?;
//! let chunks = Chunker::split(&frame, 244)?;
//! assert_eq!(1, chunks.len());
//! # Ok::<(), pixlink_protocol::ProtocolError>(())
//! ```

mod chunk;
mod commands;
mod constants;
mod error;
mod frame;
mod types;

pub use chunk::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use types::*;
