//! Production link backend over `btleplug`.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use pixlink_protocol::{DEFAULT_MTU, UUID_WRITE_DATA};

use crate::backend::{DeviceFilter, DiscoveredDevice, LinkBackend};
use crate::error::ConnectionError;

/// How often discovered peripherals are re-inspected during a scan.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// BLE central backend using the system Bluetooth adapter.
pub struct BtleBackend {
    adapter: Adapter,
    peripheral: Option<Peripheral>,
    write_char: Option<Characteristic>,
    mtu: usize,
}

impl BtleBackend {
    /// Create a backend on the first available Bluetooth adapter.
    pub async fn new() -> Result<Self, ConnectionError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ConnectionError::Backend {
                reason: "no bluetooth adapter available".to_string(),
            })?;
        Ok(BtleBackend {
            adapter,
            peripheral: None,
            write_char: None,
            mtu: DEFAULT_MTU,
        })
    }

    /// Override the per-write budget negotiated for the link.
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    async fn device_of(&self, peripheral: &Peripheral) -> Result<Option<DiscoveredDevice>, ConnectionError> {
        let Some(props) = peripheral.properties().await? else {
            return Ok(None);
        };
        Ok(Some(DiscoveredDevice {
            address: props.address.to_string(),
            name: props.local_name,
        }))
    }
}

#[async_trait]
impl LinkBackend for BtleBackend {
    async fn scan(
        &mut self,
        filter: &DeviceFilter,
        window: Duration,
    ) -> Result<Vec<DiscoveredDevice>, ConnectionError> {
        info!("scanning for displays for up to {:?}", window);
        self.adapter.start_scan(ScanFilter::default()).await?;

        let deadline = Instant::now() + window;
        let mut found: Vec<DiscoveredDevice> = Vec::new();
        loop {
            tokio::time::sleep(SCAN_POLL_INTERVAL.min(window)).await;
            for peripheral in self.adapter.peripherals().await? {
                if let Some(device) = self.device_of(&peripheral).await? {
                    if filter.matches(&device) && !found.contains(&device) {
                        debug!("found device {} ({:?})", device.address, device.name);
                        found.push(device);
                    }
                }
            }
            if !found.is_empty() || Instant::now() >= deadline {
                break;
            }
        }
        self.adapter.stop_scan().await?;
        Ok(found)
    }

    async fn open(&mut self, device: &DiscoveredDevice) -> Result<(), ConnectionError> {
        let mut target = None;
        for peripheral in self.adapter.peripherals().await? {
            if let Some(candidate) = self.device_of(&peripheral).await? {
                if candidate.address.eq_ignore_ascii_case(&device.address) {
                    target = Some(peripheral);
                    break;
                }
            }
        }
        let peripheral = target.ok_or(ConnectionError::NotFound)?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let write_uuid = Uuid::parse_str(UUID_WRITE_DATA).map_err(|err| ConnectionError::Backend {
            reason: err.to_string(),
        })?;
        let write_char = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == write_uuid)
            .ok_or_else(|| ConnectionError::Backend {
                reason: format!("device has no write characteristic {UUID_WRITE_DATA}"),
            })?;

        info!("link open to {}", device.address);
        self.peripheral = Some(peripheral);
        self.write_char = Some(write_char);
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let (peripheral, write_char) = match (&self.peripheral, &self.write_char) {
            (Some(p), Some(c)) => (p, c),
            _ => return Err(ConnectionError::NotConnected),
        };
        peripheral
            .write(write_char, bytes, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.write_char = None;
        if let Some(peripheral) = self.peripheral.take() {
            peripheral.disconnect().await?;
            info!("link closed");
        }
        Ok(())
    }

    fn mtu(&self) -> usize {
        self.mtu
    }
}
