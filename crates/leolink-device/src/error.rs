/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Failed to open the underlying port or socket.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: std::io::Error,
    },

    /// The device has not been opened (or was closed).
    #[error("device {0} is not open")]
    NotOpen(String),

    /// An I/O error occurred on the device channel.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The port string does not name a supported backend.
    #[error("unsupported port: {0}")]
    UnsupportedPort(String),

    /// The link went down underneath an open device.
    #[error("device link shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, DeviceError>;
