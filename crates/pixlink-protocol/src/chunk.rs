//! MTU-bounded chunking of serialized frames.
//!
//! The link layer can only write a bounded number of bytes at a time (the
//! negotiated MTU). [`Chunker::split`] cuts a frame's serialized form into
//! ordered [`Chunk`]s whose concatenation reconstructs the frame exactly.

use crate::error::ProtocolError;
use crate::frame::Frame;

/// One MTU-bounded segment of a serialized frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within its frame, starting at zero.
    pub sequence_index: u32,
    /// Segment bytes, at most the MTU used for the split.
    pub bytes: Vec<u8>,
}

/// Splits serialized frames into MTU-bounded chunks.
pub struct Chunker;

impl Chunker {
    /// Split a frame into ordered chunks of at most `mtu` bytes.
    ///
    /// Produces `ceil(serialized_len / mtu)` chunks; every chunk but the
    /// last is exactly `mtu` bytes. Pure and deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidMtu`] when `mtu` is zero.
    pub fn split(frame: &Frame, mtu: usize) -> Result<Vec<Chunk>, ProtocolError> {
        Self::split_bytes(&frame.to_bytes(), mtu)
    }

    /// Split an already-serialized byte stream. An empty stream yields no
    /// chunks; a well-formed frame always carries at least its header.
    pub fn split_bytes(data: &[u8], mtu: usize) -> Result<Vec<Chunk>, ProtocolError> {
        if mtu == 0 {
            return Err(ProtocolError::InvalidMtu { mtu });
        }
        Ok(data
            .chunks(mtu)
            .enumerate()
            .map(|(index, segment)| Chunk {
                sequence_index: index as u32,
                bytes: segment.to_vec(),
            })
            .collect())
    }
}
