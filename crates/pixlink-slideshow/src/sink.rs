//! Where the scheduler delivers encoded commands.

use async_trait::async_trait;

use pixlink_ble::{Transport, TransportError};
use pixlink_protocol::Command;

/// Destination for the scheduler's encoded commands.
///
/// [`Transport`] is the production implementation; tests substitute a
/// recording mock.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Encode and deliver one command.
    async fn send_command(&self, command: &Command) -> Result<(), TransportError>;
}

#[async_trait]
impl CommandSink for Transport {
    async fn send_command(&self, command: &Command) -> Result<(), TransportError> {
        Transport::send_command(self, command).await
    }
}
