use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DeviceError, Result};
use crate::stream::StreamLink;
use crate::traits::{DataListener, Device, DeviceConfig, ListenerSlot, RemotePeer};

/// Modem bridge or flight software simulator reachable over a Unix socket.
///
/// Behaves like [`SerialDevice`](crate::SerialDevice) with the socket in
/// place of the serial port, which keeps bench setups on the same code path
/// as flight hardware.
pub struct SocketDevice {
    path: PathBuf,
    name: String,
    config: DeviceConfig,
    listener: ListenerSlot,
    link: Option<StreamLink<UnixStream>>,
}

impl SocketDevice {
    /// Create a device that connects to the socket at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_config(path, DeviceConfig::default())
    }

    /// Create a device with explicit settings. The baud rate is ignored.
    pub fn with_config(path: impl AsRef<Path>, config: DeviceConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("unix:{}", path.display()),
            path,
            config,
            listener: ListenerSlot::default(),
            link: None,
        }
    }

    /// Socket path this device connects to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Device for SocketDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        if let Some(stale) = self.link.take() {
            stale.stop();
        }

        let open_error = |source: std::io::Error| DeviceError::Open {
            port: self.name.clone(),
            source,
        };
        let writer = UnixStream::connect(&self.path).map_err(open_error)?;
        writer
            .set_read_timeout(Some(self.config.read_timeout))
            .map_err(open_error)?;
        let reader = writer.try_clone().map_err(open_error)?;

        let link = StreamLink::start(
            &self.name,
            writer,
            reader,
            &self.config,
            self.listener.clone(),
        )?;
        self.link = Some(link);
        debug!(path = ?self.path, "connected to socket device");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.link.as_ref().is_some_and(StreamLink::is_up)
    }

    fn discover_peer(&mut self, node_id: &str) -> Result<Option<RemotePeer>> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen(self.name.clone()));
        }
        Ok(Some(RemotePeer::new(node_id)))
    }

    fn set_data_listener(&mut self, listener: DataListener) {
        self.listener.set(listener);
    }

    fn send_data(&mut self, _peer: &RemotePeer, data: &[u8]) -> Result<()> {
        match self.link.as_mut() {
            Some(link) => link.write_all(data),
            None => Err(DeviceError::NotOpen(self.name.clone())),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(link) = self.link.take() {
            // Unblocks the reader before it is joined.
            let _ = link.writer().shutdown(Shutdown::Both);
            link.stop();
            debug!(path = ?self.path, "socket device closed");
        }
        Ok(())
    }
}

impl Drop for SocketDevice {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for SocketDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketDevice")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
