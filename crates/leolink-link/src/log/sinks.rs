use std::fmt::Arguments;

use super::{LogLevel, Logger};

/// Forwards diagnostics to `tracing` under the `leolink::link` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "leolink::link", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "leolink::link", "{}", args),
            LogLevel::Info => tracing::info!(target: "leolink::link", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "leolink::link", "{}", args),
            LogLevel::Error => tracing::error!(target: "leolink::link", "{}", args),
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}
