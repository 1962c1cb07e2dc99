use std::fmt;
use std::sync::Arc;

use chrono::Local;
use leolink_device::{device_for_port, Device, RemotePeer};
use leolink_frame::{
    parse_pressure_profile, Command, Envelope, Mechanism, OnOff, SimulationMode, Telemetry,
    TimeSource,
};
use serde::Serialize;
use tracing::debug;

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::log::Logger;
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::stats::{LinkCounters, LinkStats};
use crate::store::{SessionOutcome, SessionStore};
use crate::summary::NoSummary;
use crate::{log_error, log_info, log_warn};

/// Connection progress of a [`Link`]. Ordered: each state implies the ones
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    DeviceOpen,
    PeerDiscovered,
    SenderReady,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::DeviceOpen => "device open",
            ConnectionState::PeerDiscovered => "peer discovered",
            ConnectionState::SenderReady => "sender ready",
        };
        f.write_str(name)
    }
}

/// One ground-station session: device, receive path, command sender and
/// session log.
///
/// Driven from a single foreground context; call [`Link::tick`] at
/// [`LinkConfig::poll_interval`].
pub struct Link {
    config: LinkConfig,
    envelope: Envelope,
    logger: Arc<dyn Logger>,
    counters: Arc<LinkCounters>,
    device: Option<Box<dyn Device>>,
    receiver: Option<Receiver>,
    peer: Option<RemotePeer>,
    sender: Option<Sender>,
    store: SessionStore,
    closed: bool,
}

impl Link {
    /// Validate `config` and start a session log under `config.log_root`.
    ///
    /// Failing to create the session directory or file is fatal.
    pub fn new(config: LinkConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        config.validate()?;
        let mut store =
            SessionStore::create(&config.log_root, config.team_id, Local::now(), logger.clone())?
                .with_sync_writes(config.sync_writes);
        if !config.summary {
            store = store.with_summarizer(Box::new(NoSummary));
        }
        Self::with_store(config, store, logger)
    }

    /// Build a link around an existing session store.
    pub fn with_store(
        config: LinkConfig,
        store: SessionStore,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        config.validate()?;
        let envelope = config.envelope()?;
        Ok(Self {
            config,
            envelope,
            logger,
            counters: Arc::new(LinkCounters::default()),
            device: None,
            receiver: None,
            peer: None,
            sender: None,
            store,
            closed: false,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn stats(&self) -> LinkStats {
        self.counters.snapshot()
    }

    /// Name of the current device, if any.
    pub fn device_name(&self) -> Option<&str> {
        self.device.as_deref().map(|device| device.name())
    }

    pub fn state(&self) -> ConnectionState {
        match self.device.as_deref() {
            Some(device) if device.is_open() => {}
            _ => return ConnectionState::Disconnected,
        }
        match (&self.peer, &self.sender) {
            (None, _) => ConnectionState::DeviceOpen,
            (Some(_), None) => ConnectionState::PeerDiscovered,
            (Some(_), Some(_)) => ConnectionState::SenderReady,
        }
    }

    pub fn device_is_connected(&self) -> bool {
        self.state() >= ConnectionState::DeviceOpen
    }

    pub fn peer_is_connected(&self) -> bool {
        self.state() >= ConnectionState::PeerDiscovered
    }

    pub fn sender_ready(&self) -> bool {
        self.state() == ConnectionState::SenderReady
    }

    /// Open the device behind `port` and connect to the payload.
    ///
    /// `port` is a serial port name, or `unix:<path>` for a socket bridge.
    pub fn initialise_connection(&mut self, port: &str) -> Result<()> {
        self.ensure_open_session()?;
        let device_config = self.config.device_config()?;
        match device_for_port(port, &device_config) {
            Ok(device) => self.initialise_with_device(device),
            Err(err) => {
                log_error!(self.logger, "Could not open device {port}: {err}");
                Err(err.into())
            }
        }
    }

    /// Open `device`, attach the receive queue and discover the payload.
    ///
    /// Any previous device is closed first. A failed discovery leaves the
    /// link in [`ConnectionState::DeviceOpen`].
    pub fn initialise_with_device(&mut self, mut device: Box<dyn Device>) -> Result<()> {
        self.ensure_open_session()?;
        self.teardown();

        let (receiver, sink) = Receiver::new(
            self.config.queue_capacity,
            self.envelope.clone(),
            self.logger.clone(),
            self.counters.clone(),
        );
        device.set_data_listener(sink.into_listener());
        if let Err(err) = device.open() {
            log_error!(self.logger, "Could not open device {}: {err}", device.name());
            return Err(err.into());
        }
        log_info!(self.logger, "Device {} opened", device.name());

        self.device = Some(device);
        self.receiver = Some(receiver);
        self.discover()
    }

    /// Look for the payload again without reopening the device.
    ///
    /// The sender and its pending queue survive.
    pub fn rediscover_peer(&mut self) -> Result<()> {
        self.ensure_open_session()?;
        if !self.check_link() {
            log_warn!(self.logger, "Device is not open; cannot discover the payload");
            return Err(LinkError::DeviceNotOpen);
        }
        self.discover()
    }

    fn discover(&mut self) -> Result<()> {
        let node_id = self.config.remote_node_id.clone();
        let Some(device) = self.device.as_deref_mut() else {
            return Err(LinkError::DeviceNotOpen);
        };

        match device.discover_peer(&node_id) {
            Ok(Some(peer)) => {
                log_info!(self.logger, "Remote node {} found", peer.node_id());
                match self.sender.as_mut() {
                    Some(sender) => sender.set_peer(peer.clone()),
                    None => {
                        log_info!(
                            self.logger,
                            "Sender ready for {} ({})",
                            self.config.team_name,
                            self.config.team_id
                        );
                        self.sender = Some(Sender::new(
                            peer.clone(),
                            self.config.team_id,
                            self.envelope.clone(),
                            self.logger.clone(),
                            self.counters.clone(),
                        ));
                    }
                }
                self.peer = Some(peer);
                Ok(())
            }
            Ok(None) => {
                self.peer = None;
                log_warn!(self.logger, "Remote node {node_id} not found");
                Err(LinkError::PeerNotFound(node_id))
            }
            Err(err) => {
                self.peer = None;
                log_error!(self.logger, "Discovery of {node_id} failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Take one accepted record off the receive queue and persist it.
    ///
    /// Never blocks. Returns `None` unless the payload has been discovered.
    pub fn receive(&mut self) -> Option<Telemetry> {
        if self.closed || !self.check_link() || !self.peer_is_connected() {
            return None;
        }
        let telemetry = self.receiver.as_mut()?.poll()?;
        if let Err(err) = self.store.write(&telemetry) {
            log_error!(self.logger, "Session log write failed: {err}");
        }
        Some(telemetry)
    }

    /// One foreground cycle: receive, then send the next pending command.
    pub fn tick(&mut self) -> Option<Telemetry> {
        let telemetry = self.receive();
        if self.sender_ready() && self.has_pending() {
            // Failures are reported through the logger.
            let _ = self.send_next_pending();
        }
        telemetry
    }

    pub fn enable_store(&mut self) {
        self.store.enable();
    }

    pub fn disable_store(&mut self) {
        self.store.disable();
    }

    /// Send any command immediately.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        let result = {
            let (sender, device) = self.ready()?;
            sender.send_now(device, &command)
        };
        self.after_send(result)
    }

    pub fn payload_telemetry(&mut self, state: OnOff) -> Result<()> {
        self.send_command(Command::PayloadTelemetry(state))
    }

    /// `ST` with either `GPS` or the ground clock read now.
    pub fn set_time(&mut self, source: TimeSource) -> Result<()> {
        let setting = source.resolve(Local::now().time());
        self.send_command(Command::SetTime(setting))
    }

    /// `SIM DISABLE` also drops any pending simulated pressure commands.
    pub fn simulation_mode_control(&mut self, mode: SimulationMode) -> Result<()> {
        let result = self.send_command(Command::SimulationModeControl(mode));
        if mode == SimulationMode::Disable {
            if let Some(sender) = self.sender.as_mut() {
                sender.clear_pending();
            }
        }
        result
    }

    pub fn simulate_pressure(&mut self, pascals: u32) -> Result<()> {
        self.send_command(Command::SimulatedPressure(pascals))
    }

    pub fn calibrate_altitude(&mut self) -> Result<()> {
        self.send_command(Command::CalibrateAltitude)
    }

    pub fn reset_eeprom(&mut self) -> Result<()> {
        self.send_command(Command::ResetEeprom)
    }

    pub fn mechanism_actuation(&mut self, mechanism: Mechanism, state: OnOff) -> Result<()> {
        self.send_command(Command::MechanismActuation(mechanism, state))
    }

    pub fn start(&mut self) -> Result<()> {
        self.send_command(Command::Start)
    }

    pub fn calibrate_imu(&mut self) -> Result<()> {
        self.send_command(Command::CalibrateImu)
    }

    /// Replace the pending queue with the `SIMP` commands of `profile`.
    ///
    /// A malformed profile is rejected whole and the current queue is kept.
    pub fn queue_simulated_pressure(&mut self, profile: &str) -> Result<usize> {
        let pressures = match parse_pressure_profile(profile) {
            Ok(pressures) => pressures,
            Err(err) => {
                log_warn!(self.logger, "Simulation profile rejected: {err}");
                return Err(err.into());
            }
        };
        let (sender, _) = self.ready()?;
        sender.queue_simulated_pressure(&pressures);
        Ok(pressures.len())
    }

    /// Send the oldest pending command. `Ok(false)` when nothing is pending.
    pub fn send_next_pending(&mut self) -> Result<bool> {
        let result = {
            let (sender, device) = self.ready()?;
            sender.send_next_pending(device)
        };
        match result {
            Ok(sent) => Ok(sent),
            Err(err) => {
                self.report_send_failure(&err);
                Err(err)
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.sender.as_ref().is_some_and(Sender::has_pending)
    }

    pub fn pending_len(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::pending_len)
    }

    /// Close the device and finalize the session log. Idempotent.
    pub fn close(&mut self) -> Result<SessionOutcome> {
        if self.closed {
            return Ok(SessionOutcome::AlreadyClosed);
        }
        self.closed = true;

        if let Some(mut device) = self.device.take() {
            match device.close() {
                Ok(()) => log_info!(self.logger, "Device {} closed", device.name()),
                Err(err) => log_warn!(
                    self.logger,
                    "Device {} did not close cleanly: {err}",
                    device.name()
                ),
            }
        }
        self.receiver = None;
        self.peer = None;
        self.sender = None;

        match self.store.close() {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                log_error!(self.logger, "Session log could not be finalized: {err}");
                Err(err.into())
            }
        }
    }

    fn ensure_open_session(&self) -> Result<()> {
        if self.closed {
            log_warn!(self.logger, "Link is closed for this session");
            return Err(LinkError::Closed);
        }
        Ok(())
    }

    fn ready(&mut self) -> Result<(&mut Sender, &mut dyn Device)> {
        self.ensure_open_session()?;
        let had_device = self.device.is_some();
        let device_up = self.check_link();
        if !self.sender_ready() {
            // A link that just dropped has already been reported by `check_link`.
            if !had_device || device_up {
                log_warn!(self.logger, "Sender is not initialised; command not sent");
            }
            return Err(LinkError::SenderNotInitialised);
        }
        match (self.sender.as_mut(), self.device.as_deref_mut()) {
            (Some(sender), Some(device)) => Ok((sender, device)),
            _ => Err(LinkError::SenderNotInitialised),
        }
    }

    fn after_send(&mut self, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            self.report_send_failure(err);
        }
        result
    }

    fn report_send_failure(&mut self, err: &LinkError) {
        let lost = self.device.as_deref().map_or(true, |device| !device.is_open());
        if lost {
            let name = self.device_name().unwrap_or("device").to_string();
            log_error!(self.logger, "Device {name} disconnected: {err}");
            self.teardown();
        } else {
            log_warn!(self.logger, "Command not sent: {err}");
        }
    }

    /// Returns whether a device is open, tearing down a link that dropped.
    fn check_link(&mut self) -> bool {
        let Some(device) = self.device.as_deref() else {
            return false;
        };
        if device.is_open() {
            return true;
        }
        log_warn!(self.logger, "Device {} disconnected", device.name());
        self.teardown();
        false
    }

    fn teardown(&mut self) {
        if let Some(mut device) = self.device.take() {
            if let Err(err) = device.close() {
                debug!(device = device.name(), error = %err, "device close during teardown failed");
            }
        }
        self.receiver = None;
        self.peer = None;
        self.sender = None;
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if !self.closed {
            // Errors are reported by `close` itself.
            let _ = self.close();
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("state", &self.state())
            .field("device", &self.device_name())
            .field("peer", &self.peer)
            .field("pending", &self.pending_len())
            .field("store", &self.store)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use leolink_device::{MemoryDevice, MemoryDeviceHandle};

    use super::*;
    use crate::log::MemoryLogger;

    const FRAME: &str = "<3171,12:00:00,1,F,ASCENT,100.0,20.0,1000.0,3.7,0,0,0,0,0,0,0,0,0,5,12:00:00,100.0,1.0,2.0,8,CX ON,,1.5,90>";

    struct Bench {
        link: Link,
        handle: MemoryDeviceHandle,
        logger: Arc<MemoryLogger>,
        _root: tempfile::TempDir,
    }

    fn bench() -> Bench {
        let root = tempfile::tempdir().unwrap();
        let logger = Arc::new(MemoryLogger::new());
        let config = LinkConfig {
            log_root: root.path().to_path_buf(),
            sync_writes: false,
            ..LinkConfig::default()
        };
        let link = Link::new(config, logger.clone()).unwrap();
        let (device, handle) = MemoryDevice::new();
        let mut bench = Bench {
            link,
            handle,
            logger,
            _root: root,
        };
        bench.link.initialise_with_device(Box::new(device)).unwrap();
        bench
    }

    fn frame(count: u32) -> String {
        FRAME.replacen(",1,F,", &format!(",{count},F,"), 1)
    }

    #[test]
    fn new_link_starts_disconnected() {
        let root = tempfile::tempdir().unwrap();
        let config = LinkConfig {
            log_root: root.path().to_path_buf(),
            ..LinkConfig::default()
        };
        let mut link = Link::new(config, Arc::new(MemoryLogger::new())).unwrap();

        assert_eq!(link.state(), ConnectionState::Disconnected);
        assert!(!link.device_is_connected());
        assert!(link.receive().is_none());
        assert!(matches!(
            link.calibrate_altitude(),
            Err(LinkError::SenderNotInitialised)
        ));
    }

    #[test]
    fn connection_reaches_sender_ready() {
        let bench = bench();
        assert_eq!(bench.link.state(), ConnectionState::SenderReady);
        assert!(bench.link.device_is_connected());
        assert!(bench.link.peer_is_connected());
        assert!(bench.link.sender_ready());
        assert!(bench.logger.contains("Remote node PAYLOAD found"));
        assert!(bench.logger.contains("Sender ready for LeoNUS (3171)"));
    }

    #[test]
    fn missing_peer_leaves_device_open() {
        let root = tempfile::tempdir().unwrap();
        let logger = Arc::new(MemoryLogger::new());
        let config = LinkConfig {
            log_root: root.path().to_path_buf(),
            ..LinkConfig::default()
        };
        let mut link = Link::new(config, logger.clone()).unwrap();
        let (device, handle) = MemoryDevice::new();
        handle.set_peer_present(false);

        assert!(matches!(
            link.initialise_with_device(Box::new(device)),
            Err(LinkError::PeerNotFound(_))
        ));
        assert_eq!(link.state(), ConnectionState::DeviceOpen);
        handle.deliver(FRAME.as_bytes());
        assert!(link.receive().is_none());

        handle.set_peer_present(true);
        link.rediscover_peer().unwrap();
        assert_eq!(link.state(), ConnectionState::SenderReady);
        assert_eq!(handle.open_count(), 1);
    }

    #[test]
    fn failed_open_stays_disconnected() {
        let root = tempfile::tempdir().unwrap();
        let logger = Arc::new(MemoryLogger::new());
        let config = LinkConfig {
            log_root: root.path().to_path_buf(),
            ..LinkConfig::default()
        };
        let mut link = Link::new(config, logger.clone()).unwrap();
        let (device, handle) = MemoryDevice::new();
        handle.set_fail_open(true);

        assert!(matches!(
            link.initialise_with_device(Box::new(device)),
            Err(LinkError::Device(_))
        ));
        assert_eq!(link.state(), ConnectionState::Disconnected);
        assert_eq!(logger.count_containing("Could not open device"), 1);
    }

    #[test]
    fn receive_persists_accepted_records() {
        let mut bench = bench();
        bench.handle.deliver(FRAME.as_bytes());

        let telemetry = bench.link.receive().unwrap();
        assert_eq!(telemetry.team_id, 3171);
        assert_eq!(telemetry.packet_count, 1);
        assert_eq!(bench.link.store().records_written(), 1);
        assert!(bench.link.receive().is_none());
    }

    #[test]
    fn disabled_store_still_delivers_records() {
        let mut bench = bench();
        bench.link.disable_store();
        bench.handle.deliver(FRAME.as_bytes());

        assert!(bench.link.receive().is_some());
        assert_eq!(bench.link.store().records_written(), 0);
        bench.link.enable_store();
        bench.handle.deliver(frame(2).as_bytes());
        assert!(bench.link.receive().is_some());
        assert_eq!(bench.link.store().records_written(), 1);
    }

    #[test]
    fn commands_reach_the_device() {
        let mut bench = bench();
        bench.link.payload_telemetry(OnOff::On).unwrap();
        bench.link.set_time(TimeSource::Gps).unwrap();
        bench
            .link
            .mechanism_actuation(Mechanism::Cam1, OnOff::On)
            .unwrap();

        assert_eq!(
            bench.handle.sent_text(),
            vec![
                "<CMD, 3171, CX, ON>",
                "<CMD, 3171, ST, GPS>",
                "<CMD, 3171, MEC, CAM1, ON>",
            ]
        );
        assert_eq!(bench.link.stats().commands_sent, 3);
    }

    #[test]
    fn ground_clock_time_is_formatted() {
        let mut bench = bench();
        bench.link.set_time(TimeSource::Gcs).unwrap();
        let sent = bench.handle.sent_text();
        let clock = sent[0]
            .strip_prefix("<CMD, 3171, ST, ")
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap();
        assert!(chrono::NaiveTime::parse_from_str(clock, "%H:%M:%S").is_ok());
    }

    #[test]
    fn tick_drains_pending_one_per_cycle() {
        let mut bench = bench();
        let queued = bench
            .link
            .queue_simulated_pressure("CMD, $, SIMP, 101325\nCMD, $, SIMP, 101300\n")
            .unwrap();
        assert_eq!(queued, 2);

        bench.link.tick();
        assert_eq!(bench.handle.sent_text(), vec!["<CMD, 3171, SIMP, 101325>"]);
        bench.link.tick();
        bench.link.tick();
        assert_eq!(bench.handle.sent().len(), 2);
        assert!(!bench.link.has_pending());
        assert!(!bench.link.send_next_pending().unwrap());
    }

    #[test]
    fn malformed_profile_keeps_existing_queue() {
        let mut bench = bench();
        bench
            .link
            .queue_simulated_pressure("CMD, $, SIMP, 1\nCMD, $, SIMP, 2")
            .unwrap();

        assert!(matches!(
            bench
                .link
                .queue_simulated_pressure("CMD, $, SIMP, 9\nCMD, $, SIMP, lots"),
            Err(LinkError::Command(_))
        ));
        assert_eq!(bench.link.pending_len(), 2);
        assert_eq!(bench.logger.count_containing("Simulation profile rejected"), 1);
    }

    #[test]
    fn simulation_disable_clears_pending() {
        let mut bench = bench();
        bench
            .link
            .queue_simulated_pressure("CMD, $, SIMP, 1\nCMD, $, SIMP, 2")
            .unwrap();
        bench
            .link
            .simulation_mode_control(SimulationMode::Disable)
            .unwrap();

        assert!(!bench.link.has_pending());
        assert_eq!(bench.handle.sent_text(), vec!["<CMD, 3171, SIM, DISABLE>"]);
    }

    #[test]
    fn transient_write_failure_keeps_link_and_pending() {
        let mut bench = bench();
        bench.link.queue_simulated_pressure("CMD, $, SIMP, 7").unwrap();
        bench.handle.set_fail_writes(true);

        assert!(bench.link.send_next_pending().is_err());
        assert_eq!(bench.link.state(), ConnectionState::SenderReady);
        assert_eq!(bench.link.pending_len(), 1);
        assert_eq!(bench.logger.count_containing("Command not sent"), 1);

        bench.handle.set_fail_writes(false);
        bench.link.tick();
        assert_eq!(bench.handle.sent_text(), vec!["<CMD, 3171, SIMP, 7>"]);
    }

    #[test]
    fn dropped_link_is_torn_down_once() {
        let mut bench = bench();
        bench.handle.break_link();

        assert_eq!(bench.link.state(), ConnectionState::Disconnected);
        assert!(bench.link.receive().is_none());
        assert!(bench.link.receive().is_none());
        assert_eq!(bench.logger.count_containing("disconnected"), 1);
        assert!(matches!(
            bench.link.start(),
            Err(LinkError::SenderNotInitialised)
        ));
    }

    #[test]
    fn command_after_unnoticed_drop_logs_once() {
        let mut bench = bench();
        bench.handle.break_link();
        bench.logger.clear();

        assert!(matches!(
            bench.link.start(),
            Err(LinkError::SenderNotInitialised)
        ));
        assert_eq!(bench.logger.messages().len(), 1);
        assert!(bench.logger.contains("disconnected"));
        assert!(!bench.logger.contains("Sender is not initialised"));

        assert!(bench.link.start().is_err());
        assert_eq!(bench.logger.count_containing("Sender is not initialised"), 1);
    }

    #[test]
    fn rediscovery_needs_open_device() {
        let mut bench = bench();
        bench.handle.break_link();
        assert!(matches!(
            bench.link.rediscover_peer(),
            Err(LinkError::DeviceNotOpen)
        ));
    }

    #[test]
    fn rediscovery_keeps_pending_queue() {
        let mut bench = bench();
        bench
            .link
            .queue_simulated_pressure("CMD, $, SIMP, 1\nCMD, $, SIMP, 2")
            .unwrap();

        bench.handle.set_peer_present(false);
        assert!(bench.link.rediscover_peer().is_err());
        assert_eq!(bench.link.state(), ConnectionState::DeviceOpen);
        assert!(bench.link.has_pending());

        bench.handle.set_peer_present(true);
        bench.link.rediscover_peer().unwrap();
        assert_eq!(bench.link.pending_len(), 2);
    }

    #[test]
    fn close_is_terminal_and_idempotent() {
        let mut bench = bench();
        bench.handle.deliver(FRAME.as_bytes());
        bench.handle.deliver(frame(2).as_bytes());
        bench.link.receive();
        bench.link.receive();

        let outcome = bench.link.close().unwrap();
        assert!(matches!(outcome, SessionOutcome::Kept { .. }));
        assert_eq!(bench.link.state(), ConnectionState::Disconnected);
        assert_eq!(bench.handle.close_count(), 1);
        assert_eq!(bench.link.close().unwrap(), SessionOutcome::AlreadyClosed);
        assert!(matches!(
            bench.link.rediscover_peer(),
            Err(LinkError::Closed)
        ));
    }

    #[test]
    fn close_with_broken_link_still_discards_empty_log() {
        let mut bench = bench();
        let dir = bench.link.store().dir().to_path_buf();
        bench.handle.break_link();

        assert_eq!(bench.link.close().unwrap(), SessionOutcome::Discarded);
        assert!(!dir.exists());
    }

    #[test]
    fn states_are_ordered() {
        assert!(ConnectionState::Disconnected < ConnectionState::DeviceOpen);
        assert!(ConnectionState::DeviceOpen < ConnectionState::PeerDiscovered);
        assert!(ConnectionState::PeerDiscovered < ConnectionState::SenderReady);
        assert_eq!(ConnectionState::SenderReady.to_string(), "sender ready");
    }
}
