//! Framing and message formats for the payload radio link.
//!
//! Inbound, every payload is a line of comma-separated text wrapped in a
//! fixed envelope (`<` ... `>` by default):
//! - [`Envelope`] strips and applies the markers
//! - [`Telemetry::parse`] turns the 28-field string into a typed record
//!
//! Outbound, [`Command`] renders `CMD, <team_id>, <code>[, <arg>...]`.

pub mod codec;
pub mod command;
pub mod error;
pub mod profile;
pub mod telemetry;

pub use codec::{decode_frame, encode_frame, Envelope, DEFAULT_PREFIX, DEFAULT_SUFFIX};
pub use command::{
    Command, CommandKind, Mechanism, OnOff, SimulationMode, TimeSetting, TimeSource,
    COMMAND_PREFIX, TIME_FORMAT,
};
pub use error::{CommandError, FrameError, Result, TelemetryError};
pub use profile::parse_pressure_profile;
pub use telemetry::{
    log_header, unit_for, Axes, Gps, MissionState, Mode, Telemetry, FIELD_COUNT, LOG_HEADER,
    RESERVED_FIELD_INDEX,
};
