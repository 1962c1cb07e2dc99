/// Errors that can occur while stripping or applying the frame envelope.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload is shorter than the envelope itself.
    #[error("frame too short ({len} bytes, envelope needs {min})")]
    TooShort { len: usize, min: usize },

    /// The payload does not begin with the start marker.
    #[error("frame is missing the start marker")]
    MissingStartMarker,

    /// The payload does not end with the end marker.
    #[error("frame is missing the end marker")]
    MissingEndMarker,

    /// The framed content is not valid UTF-8 text.
    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Nothing to frame: the outbound text is empty.
    #[error("refusing to frame an empty payload")]
    EmptyPayload,

    /// Envelope markers must be non-empty.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}

/// Errors that can occur while parsing a telemetry field string.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Wrong number of comma-separated fields.
    #[error("expected {expected} telemetry fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A field could not be coerced to its type.
    #[error("invalid {field} value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Errors that can occur while building a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command code is not one the payload understands.
    #[error("unknown command code {0:?}")]
    UnknownCode(String),

    /// The command code needs an argument that was not given.
    #[error("{code} requires {expected}")]
    MissingArgument {
        code: &'static str,
        expected: &'static str,
    },

    /// An argument is present but not valid for the command.
    #[error("invalid argument {value:?} for {code} (expected {expected})")]
    InvalidArgument {
        code: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A simulated pressure profile line is malformed.
    #[error("pressure profile line {line}: {reason}")]
    InvalidProfileLine { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, FrameError>;
