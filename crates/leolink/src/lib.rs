//! Ground-station telemetry link for a CanSat payload radio.
//!
//! # Crate Structure
//!
//! - [`device`]: radio modem backends (serial port, Unix socket bridge, in-memory)
//! - [`frame`]: frame envelope, telemetry records and outbound commands
//! - [`link`]: connection state machine, receive queue, command sender, session log

/// Re-export device types.
pub mod device {
    pub use leolink_device::*;
}

/// Re-export frame and message types.
pub mod frame {
    pub use leolink_frame::*;
}

/// Re-export link orchestration types.
pub mod link {
    pub use leolink_link::*;
}
