use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time link counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Records that passed parsing and de-duplication.
    pub frames_accepted: u64,
    /// Records discarded as repeats of the last accepted counter.
    pub duplicates: u64,
    /// Packet counters skipped over by gaps.
    pub packets_dropped: u64,
    /// Times the packet counter went backwards.
    pub resets: u64,
    /// Frames rejected by the envelope or the parser.
    pub malformed_frames: u64,
    /// Frames dropped because the receive queue was full.
    pub queue_overflows: u64,
    /// Commands handed to the device.
    pub commands_sent: u64,
}

/// Counters shared between the device thread and the foreground poller.
#[derive(Debug, Default)]
pub struct LinkCounters {
    frames_accepted: AtomicU64,
    duplicates: AtomicU64,
    packets_dropped: AtomicU64,
    resets: AtomicU64,
    malformed_frames: AtomicU64,
    queue_overflows: AtomicU64,
    commands_sent: AtomicU64,
}

impl LinkCounters {
    pub fn snapshot(&self) -> LinkStats {
        LinkStats {
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            queue_overflows: self.queue_overflows.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn frame_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn packets_dropped(&self, count: u64) {
        self.packets_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn queue_overflow(&self) {
        self.queue_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }
}
