use serialport::SerialPortType;
use tracing::debug;

use crate::error::{DeviceError, Result};
use crate::serial::SerialDevice;
use crate::traits::{Device, DeviceConfig};

/// Port-string prefix selecting the Unix socket backend.
pub const UNIX_PORT_PREFIX: &str = "unix:";

/// A serial port found on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS path or name (`/dev/ttyUSB0`, `COM3`).
    pub name: String,
    /// Short description of the port's bus and adapter.
    pub description: String,
}

/// Enumerate serial ports the modem could be attached to.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| DeviceError::Io(e.into()))?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports
        .into_iter()
        .map(|port| PortInfo {
            description: describe(&port.port_type),
            name: port.port_name,
        })
        .collect())
}

fn describe(kind: &SerialPortType) -> String {
    match kind {
        SerialPortType::UsbPort(usb) => {
            let mut text = format!("usb {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(product) = &usb.product {
                text.push(' ');
                text.push_str(product);
            }
            text
        }
        SerialPortType::PciPort => "pci".to_string(),
        SerialPortType::BluetoothPort => "bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

/// Build the device backend named by `port` (not yet opened).
///
/// `unix:<path>` selects [`SocketDevice`](crate::SocketDevice); anything else
/// is treated as a serial port name.
pub fn device_for_port(port: &str, config: &DeviceConfig) -> Result<Box<dyn Device>> {
    let port = port.trim();
    if port.is_empty() {
        return Err(DeviceError::UnsupportedPort("empty port name".to_string()));
    }

    if let Some(path) = port.strip_prefix(UNIX_PORT_PREFIX) {
        #[cfg(unix)]
        {
            if path.is_empty() {
                return Err(DeviceError::UnsupportedPort(port.to_string()));
            }
            return Ok(Box::new(crate::socket::SocketDevice::with_config(
                path,
                config.clone(),
            )));
        }
        #[cfg(not(unix))]
        {
            let _ = path;
            return Err(DeviceError::UnsupportedPort(port.to_string()));
        }
    }

    Ok(Box::new(SerialDevice::with_config(port, config.clone())))
}
