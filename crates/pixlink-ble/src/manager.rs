//! Connection lifecycle and the link state machine.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{DeviceFilter, DiscoveredDevice, LinkBackend};
use crate::error::{ConnectionError, TransportError};

/// States of the single wireless link.
///
/// `Disconnected` is initial. `Failed` is terminal until a new
/// [`ConnectionManager::connect`] call starts a fresh scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link, none being established.
    Disconnected,
    /// Discovery in progress.
    Scanning,
    /// Link attempt in progress.
    Connecting,
    /// Link is live; writes are valid.
    Connected,
    /// Link lost mid-write; reconnect attempts running.
    Reconnecting,
    /// Reconnect budget exhausted.
    Failed,
}

/// Tunables for connection establishment and recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Which device to link to.
    pub filter: DeviceFilter,
    /// Deadline for implicit connects (via
    /// [`ConnectionManager::ensure_connected`]).
    pub connect_timeout: Duration,
    /// Reconnect attempts after a failed write before giving up.
    pub max_retries: u32,
    /// First reconnect backoff delay; doubles per attempt, jittered.
    pub backoff_base: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            filter: DeviceFilter::default(),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Owns the single wireless link to one display.
///
/// All link I/O goes through this type; nothing else writes to the radio.
/// A second `connect()` while already connected is a no-op — exactly one
/// physical link exists at any time.
pub struct ConnectionManager {
    backend: Box<dyn LinkBackend>,
    config: ConnectionConfig,
    state: LinkState,
    device: Option<DiscoveredDevice>,
}

impl ConnectionManager {
    /// Create a manager driving the given backend.
    pub fn new(backend: Box<dyn LinkBackend>, config: ConnectionConfig) -> Self {
        ConnectionManager {
            backend,
            config,
            state: LinkState::Disconnected,
            device: None,
        }
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Negotiated per-write budget of the link.
    pub fn mtu(&self) -> usize {
        self.backend.mtu().max(1)
    }

    /// Establish the link, scanning for the target device if needed.
    ///
    /// Idempotent while connected. A device found once is remembered and
    /// reused for later connects without a new scan.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::NotFound`] when no device answers the scan,
    /// [`ConnectionError::Timeout`] when the whole attempt exceeds
    /// `timeout`.
    pub async fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        if self.state == LinkState::Connected {
            debug!("connect: already connected");
            return Ok(());
        }

        match tokio::time::timeout(timeout, self.connect_inner(timeout)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                self.state = LinkState::Disconnected;
                Err(ConnectionError::Timeout { timeout })
            }
        }
    }

    /// Connect with the configured default timeout unless already
    /// connected. Called implicitly before any write.
    pub async fn ensure_connected(&mut self) -> Result<(), ConnectionError> {
        match self.state {
            LinkState::Connected => Ok(()),
            _ => self.connect(self.config.connect_timeout).await,
        }
    }

    /// Write one chunk over the live link.
    ///
    /// On a transport-level failure the manager reconnects with exponential
    /// backoff (up to `max_retries` attempts) and then retries the original
    /// write exactly once. Frame-level retry policy lives above this layer;
    /// a partially delivered frame is never resent.
    ///
    /// # Errors
    ///
    /// [`TransportError::LinkDown`] when the link is not connected or the
    /// reconnect budget is exhausted.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.state != LinkState::Connected {
            return Err(TransportError::LinkDown);
        }

        match self.backend.write(bytes).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("link write failed ({err}), starting reconnect");
                self.reconnect().await?;
                match self.backend.write(bytes).await {
                    Ok(()) => Ok(()),
                    Err(retry_err) => {
                        warn!("write retry after reconnect failed: {retry_err}");
                        self.state = LinkState::Failed;
                        Err(TransportError::LinkDown)
                    }
                }
            }
        }
    }

    /// Tear the link down. Always succeeds; the remembered device address
    /// is kept for a later reconnect.
    pub async fn disconnect(&mut self) {
        if let Err(err) = self.backend.close().await {
            debug!("backend close reported: {err}");
        }
        self.state = LinkState::Disconnected;
        info!("disconnected");
    }

    async fn connect_inner(&mut self, scan_window: Duration) -> Result<(), ConnectionError> {
        self.state = LinkState::Scanning;
        match self.scan_and_open(scan_window).await {
            Ok(()) => {
                self.state = LinkState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = LinkState::Disconnected;
                Err(err)
            }
        }
    }

    /// Find the target device (remembered or freshly scanned) and open the
    /// link. Leaves state handling to the caller.
    async fn scan_and_open(&mut self, scan_window: Duration) -> Result<(), ConnectionError> {
        let device = match self.device.clone() {
            Some(device) => device,
            None => {
                let found = self.backend.scan(&self.config.filter, scan_window).await?;
                found.into_iter().next().ok_or(ConnectionError::NotFound)?
            }
        };

        info!("connecting to {}", device.address);
        self.backend.open(&device).await?;
        self.device = Some(device);
        Ok(())
    }

    /// Reconnect after a failed write: exponential backoff with jitter,
    /// up to the configured retry budget.
    async fn reconnect(&mut self) -> Result<(), TransportError> {
        self.state = LinkState::Reconnecting;
        let mut delay = self.config.backoff_base;

        for attempt in 1..=self.config.max_retries {
            let jitter_ms = rand::thread_rng().gen_range(0..=(delay.as_millis() as u64 / 4).max(1));
            tokio::time::sleep(delay + Duration::from_millis(jitter_ms)).await;

            debug!("reconnect attempt {attempt}/{}", self.config.max_retries);
            let _ = self.backend.close().await;
            match self.scan_and_open(self.config.connect_timeout).await {
                Ok(()) => {
                    info!("link restored after {attempt} attempt(s)");
                    self.state = LinkState::Connected;
                    return Ok(());
                }
                Err(err) => {
                    warn!("reconnect attempt {attempt} failed: {err}");
                    delay = delay.saturating_mul(2);
                }
            }
        }

        self.state = LinkState::Failed;
        Err(TransportError::LinkDown)
    }
}
