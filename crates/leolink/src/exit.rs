use std::fmt;
use std::io;

use leolink_device::DeviceError;
use leolink_link::{ConfigError, LinkError, StoreError};

// Exit codes follow sysexits where one applies.
pub const SUCCESS: i32 = 0;
pub const DEVICE_ERROR: i32 = 3;
pub const PEER_NOT_FOUND: i32 = 4;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CANT_CREATE: i32 = 73;
pub const CONFIG: i32 = 78;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => DEVICE_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Open { port, source } => io_error(&format!("{context}: {port}"), source),
        DeviceError::Io(source) => io_error(context, source),
        DeviceError::UnsupportedPort(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DEVICE_ERROR, format!("{context}: {other}")),
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    match err {
        ConfigError::Io(source) => io_error(context, source),
        other => CliError::new(CONFIG, format!("{context}: {other}")),
    }
}

pub fn store_error(context: &str, err: StoreError) -> CliError {
    match err {
        StoreError::CreateDir { .. } | StoreError::Open { .. } => {
            CliError::new(CANT_CREATE, format!("{context}: {err}"))
        }
        StoreError::Io(source) => io_error(context, source),
        StoreError::Summary(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Device(err) => device_error(context, err),
        LinkError::Config(err) => config_error(context, err),
        LinkError::Store(err) => store_error(context, err),
        LinkError::Frame(_) | LinkError::Telemetry(_) | LinkError::Command(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        LinkError::PeerNotFound(_) => CliError::new(PEER_NOT_FOUND, format!("{context}: {err}")),
        LinkError::SenderNotInitialised | LinkError::DeviceNotOpen => {
            CliError::new(DEVICE_ERROR, format!("{context}: {err}"))
        }
        LinkError::Closed => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
