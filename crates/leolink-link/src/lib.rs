//! Ground-station link orchestration.
//!
//! A [`Link`] owns one radio [`Device`](leolink_device::Device) and drives
//! one session:
//! - inbound frames are decoded on the device thread and queued
//! - [`Link::tick`] parses, de-duplicates and logs one record per call
//! - commands go out through the [`Sender`], with a pending queue for
//!   simulated pressure batches
//!
//! Operator-facing diagnostics go through an injected [`log::Logger`].

pub mod config;
pub mod error;
pub mod link;
pub mod log;
pub mod receiver;
pub mod sender;
pub mod stats;
pub mod store;
pub mod summary;

pub use config::{ConfigError, DeviceSettings, LinkConfig};
pub use error::{LinkError, Result, StoreError};
pub use link::{ConnectionState, Link};
pub use log::{LogLevel, Logger, MemoryLogger, NoOpLogger, TracingLogger};
pub use receiver::{
    FrameSink, ReceiveQueue, Receiver, Sequence, SequenceTracker, DEFAULT_QUEUE_CAPACITY,
};
pub use sender::Sender;
pub use stats::{LinkCounters, LinkStats};
pub use store::{SessionOutcome, SessionStore, SESSION_DIR_FORMAT};
pub use summary::{
    summarize_log, ColumnStats, NoSummary, SessionSummary, StatsSummarizer, Summarizer,
    SUMMARY_FILE_NAME,
};
