use std::collections::VecDeque;
use std::sync::Arc;

use leolink_device::{Device, RemotePeer};
use leolink_frame::{Command, Envelope};

use crate::error::{LinkError, Result};
use crate::log::Logger;
use crate::log_info;
use crate::stats::LinkCounters;

/// Outbound command channel to one remote peer.
///
/// The sender does not own the device; the orchestrator lends it per call.
pub struct Sender {
    peer: RemotePeer,
    team_id: u32,
    envelope: Envelope,
    pending: VecDeque<String>,
    logger: Arc<dyn Logger>,
    counters: Arc<LinkCounters>,
}

impl Sender {
    pub fn new(
        peer: RemotePeer,
        team_id: u32,
        envelope: Envelope,
        logger: Arc<dyn Logger>,
        counters: Arc<LinkCounters>,
    ) -> Self {
        Self {
            peer,
            team_id,
            envelope,
            pending: VecDeque::new(),
            logger,
            counters,
        }
    }

    pub fn peer(&self) -> &RemotePeer {
        &self.peer
    }

    /// Point the sender at a re-discovered peer. Pending commands are kept.
    pub fn set_peer(&mut self, peer: RemotePeer) {
        self.peer = peer;
    }

    pub fn team_id(&self) -> u32 {
        self.team_id
    }

    /// Format and transmit one command immediately.
    pub fn send_now(&mut self, device: &mut dyn Device, command: &Command) -> Result<()> {
        let text = command.to_wire(self.team_id);
        self.transmit(device, &text)
    }

    /// Transmit pre-formatted command text.
    pub fn send_text(&mut self, device: &mut dyn Device, text: &str) -> Result<()> {
        self.transmit(device, text)
    }

    /// Replace the pending queue with one `SIMP` command per value.
    pub fn queue_simulated_pressure(&mut self, pressures: &[u32]) {
        self.pending = pressures
            .iter()
            .map(|pascals| Command::SimulatedPressure(*pascals).to_wire(self.team_id))
            .collect();
        log_info!(
            self.logger,
            "Queued {} simulated pressure command(s)",
            self.pending.len()
        );
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Send the oldest pending command.
    ///
    /// Returns `Ok(false)` when nothing is pending. A command that fails to
    /// send stays at the head of the queue.
    pub fn send_next_pending(&mut self, device: &mut dyn Device) -> Result<bool> {
        let Some(next) = self.pending.front().cloned() else {
            return Ok(false);
        };
        self.transmit(device, &next)?;
        self.pending.pop_front();
        Ok(true)
    }

    fn transmit(&mut self, device: &mut dyn Device, text: &str) -> Result<()> {
        let frame = self.envelope.encode_to_bytes(text)?;
        if !device.is_open() {
            return Err(LinkError::DeviceNotOpen);
        }
        log_info!(self.logger, "Sending: {text}");
        device.send_data(&self.peer, &frame)?;
        self.counters.command_sent();
        Ok(())
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("peer", &self.peer)
            .field("team_id", &self.team_id)
            .field("pending", &self.pending.len())
            .finish()
    }
}
