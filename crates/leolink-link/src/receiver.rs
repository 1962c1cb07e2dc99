use std::sync::mpsc::{self, Receiver as QueueReceiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

use leolink_device::DataListener;
use leolink_frame::{Envelope, Telemetry};

use crate::log::Logger;
use crate::stats::LinkCounters;
use crate::{log_debug, log_warn};

/// Default number of frames buffered between the device thread and the poller.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Producer side of the receive queue, owned by the device listener.
///
/// Strips the envelope on the device thread and enqueues the field string.
#[derive(Clone)]
pub struct FrameSink {
    tx: SyncSender<String>,
    envelope: Envelope,
    logger: Arc<dyn Logger>,
    counters: Arc<LinkCounters>,
}

impl FrameSink {
    /// Enqueue one decoded field string. Never blocks.
    ///
    /// Returns `false` if the frame was dropped.
    pub fn enqueue(&self, fields: String) -> bool {
        match self.tx.try_send(fields) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.counters.queue_overflow();
                log_warn!(self.logger, "Receive queue full; frame dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Decode one raw payload from the device and enqueue it.
    pub fn accept_raw(&self, raw: &[u8]) -> bool {
        match self.envelope.decode(raw) {
            Ok(fields) => self.enqueue(fields.to_string()),
            Err(err) => {
                self.counters.malformed();
                log_warn!(self.logger, "Malformed frame discarded: {err}");
                false
            }
        }
    }

    /// Wrap this sink as a device data listener.
    pub fn into_listener(self) -> DataListener {
        Arc::new(move |raw: &[u8]| {
            self.accept_raw(raw);
        })
    }
}

/// Consumer side of the receive queue.
pub struct ReceiveQueue {
    rx: QueueReceiver<String>,
}

impl ReceiveQueue {
    /// Pop the oldest field string, if any. Never blocks.
    pub fn dequeue_nonblocking(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(fields) => Some(fields),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Classification of a packet counter against the last accepted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// First packet of the session.
    First,
    /// Next counter, or a restart from zero.
    InOrder,
    /// Same counter as the last accepted packet.
    Duplicate,
    /// Counters `first_missing..=last_missing` never arrived.
    Gap { first_missing: u32, last_missing: u32 },
    /// The counter went backwards from `previous` without restarting at zero.
    Reset { previous: u32 },
}

impl Sequence {
    pub fn is_accepted(self) -> bool {
        self != Sequence::Duplicate
    }
}

/// Tracks the last accepted packet counter.
#[derive(Debug, Default, Clone)]
pub struct SequenceTracker {
    last_accepted: Option<u32>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_accepted(&self) -> Option<u32> {
        self.last_accepted
    }

    /// Classify `count` and record it if accepted.
    pub fn observe(&mut self, count: u32) -> Sequence {
        let sequence = match self.last_accepted {
            None => Sequence::First,
            Some(last) if count == last => return Sequence::Duplicate,
            Some(last) if count > last.saturating_add(1) => Sequence::Gap {
                first_missing: last + 1,
                last_missing: count - 1,
            },
            Some(last) if count < last && count != 0 => Sequence::Reset { previous: last },
            Some(_) => Sequence::InOrder,
        };
        self.last_accepted = Some(count);
        sequence
    }
}

/// Foreground half of the inbound path: dequeue, parse, de-duplicate.
pub struct Receiver {
    queue: ReceiveQueue,
    tracker: SequenceTracker,
    logger: Arc<dyn Logger>,
    counters: Arc<LinkCounters>,
}

impl Receiver {
    /// Create a receiver and the sink to register with the device.
    pub fn new(
        capacity: usize,
        envelope: Envelope,
        logger: Arc<dyn Logger>,
        counters: Arc<LinkCounters>,
    ) -> (Self, FrameSink) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let sink = FrameSink {
            tx,
            envelope,
            logger: logger.clone(),
            counters: counters.clone(),
        };
        let receiver = Self {
            queue: ReceiveQueue { rx },
            tracker: SequenceTracker::new(),
            logger,
            counters,
        };
        (receiver, sink)
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// Take at most one frame off the queue and return it if accepted.
    pub fn poll(&mut self) -> Option<Telemetry> {
        let fields = self.queue.dequeue_nonblocking()?;
        let telemetry = match Telemetry::parse(&fields) {
            Ok(telemetry) => telemetry,
            Err(err) => {
                self.counters.malformed();
                log_warn!(self.logger, "Invalid telemetry discarded: {err}");
                return None;
            }
        };

        let count = telemetry.packet_count;
        match self.tracker.observe(count) {
            Sequence::Duplicate => {
                self.counters.duplicate();
                log_warn!(self.logger, "Duplicate packet {count} discarded");
                return None;
            }
            Sequence::Gap {
                first_missing,
                last_missing,
            } => {
                self.counters
                    .packets_dropped(u64::from(last_missing - first_missing) + 1);
                log_warn!(
                    self.logger,
                    "Packet(s) dropped: {first_missing}..={last_missing}"
                );
            }
            Sequence::Reset { previous } => {
                self.counters.reset();
                log_warn!(
                    self.logger,
                    "Packet count went backwards ({previous} -> {count}); payload may have reset"
                );
            }
            Sequence::First => log_debug!(self.logger, "First packet {count} received"),
            Sequence::InOrder => {}
        }

        self.counters.frame_accepted();
        Some(telemetry)
    }
}
