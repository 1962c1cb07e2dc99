use std::fmt::Arguments;
use std::sync::{Mutex, PoisonError};

use super::{LogLevel, Logger};

/// Keeps every diagnostic in memory, for tests and status panels.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured lines, oldest first.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured messages without their levels.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, line)| line).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, line)| line.contains(needle))
            .count()
    }

    /// Number of lines at `level` or above.
    pub fn count_at_least(&self, level: LogLevel) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(line_level, _)| *line_level >= level)
            .count()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, args.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_lines_with_levels() {
        let logger = MemoryLogger::new();
        logger.info(format_args!("Sending: {}", "CMD, 3171, CAL"));
        logger.warn(format_args!("Duplicate packet {}", 7));

        assert_eq!(
            logger.lines(),
            vec![
                (LogLevel::Info, "Sending: CMD, 3171, CAL".to_string()),
                (LogLevel::Warn, "Duplicate packet 7".to_string()),
            ]
        );
        assert!(logger.contains("CAL"));
        assert_eq!(logger.count_at_least(LogLevel::Warn), 1);

        logger.clear();
        assert!(logger.messages().is_empty());
    }
}
