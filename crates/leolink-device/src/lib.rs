//! Radio modem device abstraction for ground-station telemetry links.
//!
//! This is the lowest layer of leolink. A [`Device`] opens a serial-like
//! channel, finds the single remote node and hands every inbound payload to
//! a registered listener from its own I/O thread.
//!
//! Backends:
//! - [`SerialDevice`]: modem on a local serial port
//! - [`SocketDevice`]: modem bridge or simulator on a Unix socket
//! - [`MemoryDevice`]: in-process device for tests

pub mod error;
pub mod memory;
pub mod ports;
pub mod serial;
mod stream;
pub mod traits;

#[cfg(unix)]
pub mod socket;

pub use error::{DeviceError, Result};
pub use memory::{MemoryDevice, MemoryDeviceHandle};
pub use ports::{available_ports, device_for_port, PortInfo, UNIX_PORT_PREFIX};
pub use serial::SerialDevice;
pub use traits::{
    DataListener, Device, DeviceConfig, RemotePeer, DEFAULT_BAUD_RATE, DEFAULT_MAX_PAYLOAD_LEN,
};

#[cfg(unix)]
pub use socket::SocketDevice;
