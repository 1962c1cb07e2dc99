use std::path::PathBuf;

/// Errors that can occur in the session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The session directory could not be created.
    #[error("failed to create session directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The session log could not be opened.
    #[error("failed to open session log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or finalizing the log failed.
    #[error("session log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The end-of-session summary could not be produced.
    #[error("session summary failed: {0}")]
    Summary(String),
}

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Device-level error.
    #[error("device error: {0}")]
    Device(#[from] leolink_device::DeviceError),

    /// Frame envelope error.
    #[error("frame error: {0}")]
    Frame(#[from] leolink_frame::FrameError),

    /// Telemetry parse error.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] leolink_frame::TelemetryError),

    /// Command construction error.
    #[error("command error: {0}")]
    Command(#[from] leolink_frame::CommandError),

    /// Session store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A command was issued before the sender was initialised.
    #[error("sender is not initialised; connect to the payload first")]
    SenderNotInitialised,

    /// The operation needs an open device.
    #[error("device is not open")]
    DeviceNotOpen,

    /// Peer discovery completed without finding the node.
    #[error("remote node {0} not found")]
    PeerNotFound(String),

    /// The link was closed for this session.
    #[error("link is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, LinkError>;
