use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{DeviceError, Result};
use crate::stream::StreamLink;
use crate::traits::{DataListener, Device, DeviceConfig, ListenerSlot, RemotePeer};

/// Radio modem attached to a local serial port.
///
/// The modem runs in transparent mode: bytes written to the port reach the
/// single remote node and everything the node transmits arrives on the port.
/// Discovery therefore only requires an open port.
pub struct SerialDevice {
    port: String,
    config: DeviceConfig,
    listener: ListenerSlot,
    link: Option<StreamLink<Box<dyn SerialPort>>>,
}

impl SerialDevice {
    /// Create a device for `port` with default settings (9600 baud).
    pub fn new(port: impl Into<String>) -> Self {
        Self::with_config(port, DeviceConfig::default())
    }

    /// Create a device for `port` with explicit settings.
    pub fn with_config(port: impl Into<String>, config: DeviceConfig) -> Self {
        Self {
            port: port.into(),
            config,
            listener: ListenerSlot::default(),
            link: None,
        }
    }

    /// Serial settings in effect.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl Device for SerialDevice {
    fn name(&self) -> &str {
        &self.port
    }

    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        if let Some(stale) = self.link.take() {
            stale.stop();
        }

        let open_error = |source: serialport::Error| DeviceError::Open {
            port: self.port.clone(),
            source: source.into(),
        };
        let writer = serialport::new(&self.port, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(open_error)?;
        let reader = writer.try_clone().map_err(open_error)?;

        let link = StreamLink::start(
            &self.port,
            writer,
            reader,
            &self.config,
            self.listener.clone(),
        )?;
        self.link = Some(link);
        info!(port = %self.port, baud = self.config.baud_rate, "serial device open");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.link.as_ref().is_some_and(StreamLink::is_up)
    }

    fn discover_peer(&mut self, node_id: &str) -> Result<Option<RemotePeer>> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen(self.port.clone()));
        }
        debug!(port = %self.port, node_id, "transparent link; peer reachable through open port");
        Ok(Some(RemotePeer::new(node_id)))
    }

    fn set_data_listener(&mut self, listener: DataListener) {
        self.listener.set(listener);
    }

    fn send_data(&mut self, _peer: &RemotePeer, data: &[u8]) -> Result<()> {
        match self.link.as_mut() {
            Some(link) => link.write_all(data),
            None => Err(DeviceError::NotOpen(self.port.clone())),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(link) = self.link.take() {
            link.stop();
            debug!(port = %self.port, "serial device closed");
        }
        Ok(())
    }
}

impl Drop for SerialDevice {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for SerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDevice")
            .field("port", &self.port)
            .field("baud_rate", &self.config.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}
