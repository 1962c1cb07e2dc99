use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{DeviceError, Result};
use crate::traits::{DataListener, Device, RemotePeer};

#[derive(Default)]
struct MemoryState {
    open: bool,
    peer_present: bool,
    fail_open: bool,
    fail_writes: bool,
    listener: Option<DataListener>,
    sent: Vec<Vec<u8>>,
    open_count: usize,
    close_count: usize,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process device for tests and dry runs.
///
/// Pair it with the [`MemoryDeviceHandle`] returned by [`MemoryDevice::new`]
/// to play the remote side: inject payloads and inspect what was sent.
pub struct MemoryDevice {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

/// Remote-side control over a [`MemoryDevice`]. Cheap to clone.
#[derive(Clone)]
pub struct MemoryDeviceHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevice {
    /// Create a closed device whose peer is reachable once opened.
    pub fn new() -> (Self, MemoryDeviceHandle) {
        let state = Arc::new(Mutex::new(MemoryState {
            peer_present: true,
            ..MemoryState::default()
        }));
        (
            Self {
                name: "memory".to_string(),
                state: state.clone(),
            },
            MemoryDeviceHandle { state },
        )
    }
}

impl Device for MemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_open {
            return Err(DeviceError::Open {
                port: self.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
            });
        }
        if !state.open {
            state.open = true;
            state.open_count += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn discover_peer(&mut self, node_id: &str) -> Result<Option<RemotePeer>> {
        let state = lock(&self.state);
        if !state.open {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        Ok(state.peer_present.then(|| RemotePeer::new(node_id)))
    }

    fn set_data_listener(&mut self, listener: DataListener) {
        lock(&self.state).listener = Some(listener);
    }

    fn send_data(&mut self, _peer: &RemotePeer, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        if state.fail_writes {
            return Err(DeviceError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "modem did not accept the write",
            )));
        }
        state.sent.push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.open {
            state.open = false;
            state.close_count += 1;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDevice")
            .field("open", &self.is_open())
            .finish()
    }
}

impl MemoryDeviceHandle {
    /// Deliver one inbound payload through the registered listener.
    ///
    /// Returns `false` when the device is closed or has no listener.
    pub fn deliver(&self, payload: &[u8]) -> bool {
        let listener = {
            let state = lock(&self.state);
            if !state.open {
                return false;
            }
            state.listener.clone()
        };
        match listener {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }

    /// Every payload sent so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent.clone()
    }

    /// Sent payloads decoded as UTF-8 (lossy).
    pub fn sent_text(&self) -> Vec<String> {
        lock(&self.state)
            .sent
            .iter()
            .map(|data| String::from_utf8_lossy(data).into_owned())
            .collect()
    }

    pub fn set_peer_present(&self, present: bool) {
        lock(&self.state).peer_present = present;
    }

    pub fn set_fail_open(&self, fail: bool) {
        lock(&self.state).fail_open = fail;
    }

    /// Make writes fail while leaving the link up.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Drop the link as if the modem was unplugged.
    pub fn break_link(&self) {
        lock(&self.state).open = false;
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state).open_count
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).close_count
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn delivers_only_while_open() {
        let (mut device, handle) = MemoryDevice::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        device.set_data_listener(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!handle.deliver(b"<a>"));
        device.open().unwrap();
        assert!(handle.deliver(b"<a>"));
        device.close().unwrap();
        assert!(!handle.deliver(b"<b>"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn discovery_follows_peer_presence() {
        let (mut device, handle) = MemoryDevice::new();
        device.open().unwrap();
        assert_eq!(
            device.discover_peer("PAYLOAD").unwrap(),
            Some(RemotePeer::new("PAYLOAD"))
        );

        handle.set_peer_present(false);
        assert_eq!(device.discover_peer("PAYLOAD").unwrap(), None);
    }

    #[test]
    fn failed_write_is_reported_and_link_stays_up() {
        let (mut device, handle) = MemoryDevice::new();
        device.open().unwrap();
        let peer = RemotePeer::new("PAYLOAD");
        device.send_data(&peer, b"<one>").unwrap();

        handle.set_fail_writes(true);
        assert!(matches!(
            device.send_data(&peer, b"<two>"),
            Err(DeviceError::Io(_))
        ));
        assert!(device.is_open());
        assert_eq!(handle.sent_text(), vec!["<one>"]);

        handle.break_link();
        assert!(matches!(
            device.send_data(&peer, b"<three>"),
            Err(DeviceError::NotOpen(_))
        ));
    }

    #[test]
    fn fail_open_keeps_device_closed() {
        let (mut device, handle) = MemoryDevice::new();
        handle.set_fail_open(true);
        assert!(device.open().is_err());
        assert!(!handle.is_open());
    }
}
