//! In-memory link backend for driving the state machine in tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{DeviceFilter, DiscoveredDevice, LinkBackend};
use crate::error::ConnectionError;

/// Observable counters and recorded writes of a [`FakeBackend`].
#[derive(Debug, Default, Clone)]
pub struct FakeState {
    pub scans: usize,
    pub opens: usize,
    pub closes: usize,
    pub write_attempts: usize,
    pub writes: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct FakeShared {
    state: FakeState,
    fail_write_attempts: HashSet<usize>,
    fail_all_writes: bool,
    fail_reopens: bool,
}

/// Handle kept by tests to inspect and steer a [`FakeBackend`] after it has
/// been moved into the manager.
#[derive(Clone)]
pub struct FakeHandle {
    shared: Arc<Mutex<FakeShared>>,
}

impl FakeHandle {
    pub fn snapshot(&self) -> FakeState {
        self.shared.lock().unwrap().state.clone()
    }

    /// Fail the write calls with the given zero-based attempt indices.
    pub fn fail_write_attempts(&self, attempts: &[usize]) {
        let mut shared = self.shared.lock().unwrap();
        shared.fail_write_attempts = attempts.iter().copied().collect();
    }

    /// Fail every write call from now on.
    pub fn fail_all_writes(&self) {
        self.shared.lock().unwrap().fail_all_writes = true;
    }

    /// Fail every open after the first (reconnects never succeed).
    pub fn fail_reopens(&self) {
        self.shared.lock().unwrap().fail_reopens = true;
    }

    /// Let opens succeed again.
    pub fn allow_reopens(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.fail_reopens = false;
        shared.fail_all_writes = false;
    }
}

/// A [`LinkBackend`] that records everything and fails on command.
pub struct FakeBackend {
    shared: Arc<Mutex<FakeShared>>,
    devices: Vec<DiscoveredDevice>,
    /// Simulated scan duration; `None` completes immediately.
    pub scan_delay: Option<Duration>,
    mtu: usize,
}

impl FakeBackend {
    /// A backend that discovers exactly one device.
    pub fn with_device(address: &str, name: &str) -> (Self, FakeHandle) {
        let shared = Arc::new(Mutex::new(FakeShared::default()));
        let backend = FakeBackend {
            shared: shared.clone(),
            devices: vec![DiscoveredDevice {
                address: address.to_string(),
                name: Some(name.to_string()),
            }],
            scan_delay: None,
            mtu: 244,
        };
        (backend, FakeHandle { shared })
    }

    /// A backend whose scans never find anything.
    pub fn empty() -> (Self, FakeHandle) {
        let shared = Arc::new(Mutex::new(FakeShared::default()));
        let backend = FakeBackend {
            shared: shared.clone(),
            devices: Vec::new(),
            scan_delay: None,
            mtu: 244,
        };
        (backend, FakeHandle { shared })
    }

    /// Override the reported MTU.
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }
}

#[async_trait]
impl LinkBackend for FakeBackend {
    async fn scan(
        &mut self,
        filter: &DeviceFilter,
        _window: Duration,
    ) -> Result<Vec<DiscoveredDevice>, ConnectionError> {
        self.shared.lock().unwrap().state.scans += 1;
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .devices
            .iter()
            .filter(|device| filter.matches(device))
            .cloned()
            .collect())
    }

    async fn open(&mut self, _device: &DiscoveredDevice) -> Result<(), ConnectionError> {
        let mut shared = self.shared.lock().unwrap();
        shared.state.opens += 1;
        if shared.fail_reopens && shared.state.opens > 1 {
            return Err(ConnectionError::Backend {
                reason: "fake reopen failure".to_string(),
            });
        }
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let mut shared = self.shared.lock().unwrap();
        let attempt = shared.state.write_attempts;
        shared.state.write_attempts += 1;
        if shared.fail_all_writes || shared.fail_write_attempts.contains(&attempt) {
            return Err(ConnectionError::Backend {
                reason: format!("fake write failure at attempt {attempt}"),
            });
        }
        shared.state.writes.push(bytes.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.shared.lock().unwrap().state.closes += 1;
        Ok(())
    }

    fn mtu(&self) -> usize {
        self.mtu
    }
}
