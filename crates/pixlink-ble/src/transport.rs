//! Frame transport: chunked, strictly ordered delivery over the link.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{trace, warn};

use pixlink_protocol::{Chunker, Command, Frame, FrameCodec};

use crate::error::{ConnectionError, TransportError};
use crate::manager::{ConnectionManager, LinkState};

/// Delivers frames over the single link, one chunk at a time.
///
/// A `send` holds the link for the whole frame: chunks go out strictly in
/// ascending order, each awaited before the next, and no other sender can
/// interleave. Concurrent sends queue FIFO behind the link mutex.
///
/// If any chunk write ultimately fails, the remaining chunks are not sent
/// and the frame is rejected with [`TransportError::PartialWrite`]. The
/// frame is never resent at this layer — re-sending a partially applied
/// multi-chunk command can corrupt on-device state. Reconnect policy lives
/// in [`ConnectionManager`].
pub struct Transport {
    link: Mutex<ConnectionManager>,
    cancelled: AtomicBool,
}

impl Transport {
    /// Wrap a connection manager.
    pub fn new(manager: ConnectionManager) -> Self {
        Transport {
            link: Mutex::new(manager),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Establish the link. See [`ConnectionManager::connect`].
    pub async fn connect(&self, timeout: Duration) -> Result<(), ConnectionError> {
        self.link.lock().await.connect(timeout).await
    }

    /// Tear the link down.
    ///
    /// Queued sends that have not started writing are aborted; a chunk
    /// write already handed to the radio completes or fails on its own
    /// before teardown proceeds.
    pub async fn disconnect(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let mut link = self.link.lock().await;
        link.disconnect().await;
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Current link state.
    pub async fn state(&self) -> LinkState {
        self.link.lock().await.state()
    }

    /// Encode a command and deliver its frame.
    pub async fn send_command(&self, command: &Command) -> Result<(), TransportError> {
        let frame = FrameCodec::encode(command)?;
        self.send_frame(&frame).await
    }

    /// Deliver one frame as an ordered chunk sequence.
    pub async fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;

        if self.cancelled.load(Ordering::SeqCst) {
            return Err(TransportError::LinkDown);
        }

        link.ensure_connected().await?;
        let chunks = Chunker::split(frame, link.mtu())?;
        let total = chunks.len() as u32;

        for chunk in &chunks {
            if self.cancelled.load(Ordering::SeqCst) {
                if chunk.sequence_index == 0 {
                    return Err(TransportError::LinkDown);
                }
                warn!(
                    "send aborted by disconnect at chunk {} of {total}",
                    chunk.sequence_index
                );
                return Err(TransportError::PartialWrite {
                    failed_index: chunk.sequence_index,
                    total,
                });
            }

            if let Err(err) = link.write(&chunk.bytes).await {
                warn!(
                    "chunk {} of {total} failed ({err}); frame rejected",
                    chunk.sequence_index
                );
                return Err(TransportError::PartialWrite {
                    failed_index: chunk.sequence_index,
                    total,
                });
            }
        }

        trace!("frame delivered in {total} chunk(s)");
        Ok(())
    }
}
