//! Backend seam between the connection state machine and the radio.
//!
//! [`ConnectionManager`](crate::ConnectionManager) drives a [`LinkBackend`]
//! and never touches the radio stack directly. The production backend is
//! [`BtleBackend`](crate::BtleBackend); tests drive the state machine with
//! an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

/// Criteria for picking the target device during discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFilter {
    /// Match devices whose advertised name starts with this prefix.
    pub name_prefix: Option<String>,
    /// Match a device by exact address, bypassing the name filter.
    pub address: Option<String>,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        DeviceFilter {
            name_prefix: Some(pixlink_protocol::DEVICE_NAME_PREFIX.to_string()),
            address: None,
        }
    }
}

impl DeviceFilter {
    /// Whether a discovered device satisfies this filter.
    pub fn matches(&self, device: &DiscoveredDevice) -> bool {
        if let Some(address) = &self.address {
            return device.address.eq_ignore_ascii_case(address);
        }
        match &self.name_prefix {
            Some(prefix) => device
                .name
                .as_deref()
                .is_some_and(|name| name.starts_with(prefix.as_str())),
            None => true,
        }
    }
}

/// A device that answered a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Link-layer address.
    pub address: String,
    /// Advertised local name, if any.
    pub name: Option<String>,
}

/// The physical-link operations the connection state machine needs.
///
/// One backend instance corresponds to at most one open link; opening a
/// link while another is open replaces it.
#[async_trait]
pub trait LinkBackend: Send {
    /// Scan for devices matching `filter` for at most `window`.
    async fn scan(
        &mut self,
        filter: &DeviceFilter,
        window: Duration,
    ) -> Result<Vec<DiscoveredDevice>, ConnectionError>;

    /// Open the physical link to `device`.
    async fn open(&mut self, device: &DiscoveredDevice) -> Result<(), ConnectionError>;

    /// Write one chunk over the open link.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), ConnectionError>;

    /// Close the link. Closing an already-closed link is a no-op.
    async fn close(&mut self) -> Result<(), ConnectionError>;

    /// Negotiated write budget per link write.
    fn mtu(&self) -> usize;
}
