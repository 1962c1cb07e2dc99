use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::Result;

/// Default radio modem baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default upper bound on one inbound payload before the stream is resynced.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1024;

/// Callback invoked on the device's I/O thread with each raw inbound payload.
pub type DataListener = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// The remote radio node a device talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePeer {
    node_id: String,
}

impl RemotePeer {
    /// Create a peer handle for the given node identifier.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }

    /// Node identifier the peer was discovered under.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

/// A serial-like channel to a radio modem.
///
/// Implementations deliver inbound payloads asynchronously through the
/// registered [`DataListener`], one call per payload, from a thread they own.
pub trait Device: Send {
    /// Human-readable device name for diagnostics.
    fn name(&self) -> &str;

    /// Open the channel. Opening an already open device is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Whether the channel is open and the link is still up.
    fn is_open(&self) -> bool;

    /// Look up the remote node with the given identifier.
    ///
    /// Returns `Ok(None)` when the network answers but the node is absent.
    fn discover_peer(&mut self, node_id: &str) -> Result<Option<RemotePeer>>;

    /// Register the inbound payload listener, replacing any previous one.
    fn set_data_listener(&mut self, listener: DataListener);

    /// Transmit one payload to `peer`.
    fn send_data(&mut self, peer: &RemotePeer, data: &[u8]) -> Result<()>;

    /// Close the channel. Closing a closed device is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Configuration shared by the stream-backed devices.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Serial baud rate. Default: 9600.
    pub baud_rate: u32,
    /// Read timeout of the background reader; bounds shutdown latency.
    pub read_timeout: Duration,
    /// Byte that terminates every inbound payload. Default: `>`.
    pub terminator: u8,
    /// Payloads growing past this without a terminator are discarded.
    pub max_payload_len: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            terminator: b'>',
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

/// Listener storage shared between a device and its reader thread.
#[derive(Clone, Default)]
pub(crate) struct ListenerSlot {
    inner: Arc<Mutex<Option<DataListener>>>,
}

impl ListenerSlot {
    pub(crate) fn set(&self, listener: DataListener) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    /// Invoke the current listener, if any, without holding the lock during the call.
    pub(crate) fn dispatch(&self, payload: &[u8]) -> bool {
        let listener = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match listener {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self
            .inner
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("ListenerSlot")
            .field("registered", &registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn dispatch_without_listener_reports_nothing_delivered() {
        let slot = ListenerSlot::default();
        assert!(!slot.dispatch(b"<x>"));
    }

    #[test]
    fn set_replaces_previous_listener() {
        let slot = ListenerSlot::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        slot.set(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = second.clone();
        slot.set(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(slot.dispatch(b"<x>"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_config_matches_radio_modem() {
        let config = DeviceConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.terminator, b'>');
    }
}
