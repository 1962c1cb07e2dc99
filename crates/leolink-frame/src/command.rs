use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;

use crate::error::CommandError;

/// Leading token of every outbound command.
pub const COMMAND_PREFIX: &str = "CMD";

/// Clock format used for ground-supplied mission time.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Two-state switch argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOff {
    On,
    Off,
}

impl OnOff {
    pub fn code(self) -> &'static str {
        match self {
            OnOff::On => "ON",
            OnOff::Off => "OFF",
        }
    }
}

impl From<bool> for OnOff {
    fn from(on: bool) -> Self {
        if on {
            OnOff::On
        } else {
            OnOff::Off
        }
    }
}

/// Where the payload should take its mission clock from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// The payload's own GPS receiver.
    Gps,
    /// The ground station clock at the moment of sending.
    Gcs,
}

impl TimeSource {
    /// Resolve into the concrete argument sent on the wire.
    pub fn resolve(self, now: NaiveTime) -> TimeSetting {
        match self {
            TimeSource::Gps => TimeSetting::Gps,
            TimeSource::Gcs => TimeSetting::Clock(now),
        }
    }
}

/// Concrete `ST` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSetting {
    Gps,
    Clock(NaiveTime),
}

impl fmt::Display for TimeSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSetting::Gps => f.write_str("GPS"),
            TimeSetting::Clock(time) => write!(f, "{}", time.format(TIME_FORMAT)),
        }
    }
}

/// Simulation mode control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Enable,
    Activate,
    Disable,
}

impl SimulationMode {
    pub fn code(self) -> &'static str {
        match self {
            SimulationMode::Enable => "ENABLE",
            SimulationMode::Activate => "ACTIVATE",
            SimulationMode::Disable => "DISABLE",
        }
    }
}

/// Actuated payload mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    Cam1,
    Cam2,
    Gyro,
}

impl Mechanism {
    pub fn code(self) -> &'static str {
        match self {
            Mechanism::Cam1 => "CAM1",
            Mechanism::Cam2 => "CAM2",
            Mechanism::Gyro => "GYRO",
        }
    }
}

/// Command codes understood by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    PayloadTelemetry,
    SetTime,
    SimulationModeControl,
    SimulatedPressure,
    CalibrateAltitude,
    ResetEeprom,
    MechanismActuation,
    Start,
    CalibrateImu,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::PayloadTelemetry,
        CommandKind::SetTime,
        CommandKind::SimulationModeControl,
        CommandKind::SimulatedPressure,
        CommandKind::CalibrateAltitude,
        CommandKind::ResetEeprom,
        CommandKind::MechanismActuation,
        CommandKind::Start,
        CommandKind::CalibrateImu,
    ];

    /// Wire code, e.g. `SIMP`.
    pub fn code(self) -> &'static str {
        match self {
            CommandKind::PayloadTelemetry => "CX",
            CommandKind::SetTime => "ST",
            CommandKind::SimulationModeControl => "SIM",
            CommandKind::SimulatedPressure => "SIMP",
            CommandKind::CalibrateAltitude => "CAL",
            CommandKind::ResetEeprom => "RST",
            CommandKind::MechanismActuation => "MEC",
            CommandKind::Start => "START",
            CommandKind::CalibrateImu => "CALIMU",
        }
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| CommandError::UnknownCode(code.to_string()))
    }
}

/// One outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PayloadTelemetry(OnOff),
    SetTime(TimeSetting),
    SimulationModeControl(SimulationMode),
    /// Injected barometric pressure in pascals.
    SimulatedPressure(u32),
    CalibrateAltitude,
    ResetEeprom,
    MechanismActuation(Mechanism, OnOff),
    Start,
    CalibrateImu,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::PayloadTelemetry(_) => CommandKind::PayloadTelemetry,
            Command::SetTime(_) => CommandKind::SetTime,
            Command::SimulationModeControl(_) => CommandKind::SimulationModeControl,
            Command::SimulatedPressure(_) => CommandKind::SimulatedPressure,
            Command::CalibrateAltitude => CommandKind::CalibrateAltitude,
            Command::ResetEeprom => CommandKind::ResetEeprom,
            Command::MechanismActuation(..) => CommandKind::MechanismActuation,
            Command::Start => CommandKind::Start,
            Command::CalibrateImu => CommandKind::CalibrateImu,
        }
    }

    /// Full command text for `team_id`, without the frame envelope.
    pub fn to_wire(&self, team_id: u32) -> String {
        let mut text = format!("{COMMAND_PREFIX}, {team_id}, {}", self.kind().code());
        match self {
            Command::PayloadTelemetry(state) => push_arg(&mut text, state.code()),
            Command::SetTime(setting) => push_arg(&mut text, &setting.to_string()),
            Command::SimulationModeControl(mode) => push_arg(&mut text, mode.code()),
            Command::SimulatedPressure(pascals) => push_arg(&mut text, &pascals.to_string()),
            Command::MechanismActuation(device, state) => {
                push_arg(&mut text, device.code());
                push_arg(&mut text, state.code());
            }
            Command::CalibrateAltitude
            | Command::ResetEeprom
            | Command::Start
            | Command::CalibrateImu => {}
        }
        text
    }

    /// Build a command from its code and textual arguments.
    ///
    /// `ST` takes `GPS` or an `HH:MM:SS` clock reading; resolving the ground
    /// clock is left to the caller so this stays a pure function.
    pub fn from_parts(kind: CommandKind, args: &[&str]) -> Result<Self, CommandError> {
        let code = kind.code();
        let command = match kind {
            CommandKind::PayloadTelemetry => {
                expect_arity(code, args, 1, "ON or OFF")?;
                Command::PayloadTelemetry(parse_on_off(code, args[0])?)
            }
            CommandKind::SetTime => {
                expect_arity(code, args, 1, "GPS or HH:MM:SS")?;
                Command::SetTime(parse_time_setting(args[0])?)
            }
            CommandKind::SimulationModeControl => {
                expect_arity(code, args, 1, "ENABLE, ACTIVATE or DISABLE")?;
                Command::SimulationModeControl(parse_simulation_mode(args[0])?)
            }
            CommandKind::SimulatedPressure => {
                expect_arity(code, args, 1, "a pressure in pascals")?;
                Command::SimulatedPressure(parse_pressure(code, args[0])?)
            }
            CommandKind::MechanismActuation => {
                expect_arity(code, args, 2, "a mechanism and ON or OFF")?;
                Command::MechanismActuation(parse_mechanism(args[0])?, parse_on_off(code, args[1])?)
            }
            CommandKind::CalibrateAltitude => {
                expect_arity(code, args, 0, "no arguments")?;
                Command::CalibrateAltitude
            }
            CommandKind::ResetEeprom => {
                expect_arity(code, args, 0, "no arguments")?;
                Command::ResetEeprom
            }
            CommandKind::Start => {
                expect_arity(code, args, 0, "no arguments")?;
                Command::Start
            }
            CommandKind::CalibrateImu => {
                expect_arity(code, args, 0, "no arguments")?;
                Command::CalibrateImu
            }
        };
        Ok(command)
    }
}

fn push_arg(text: &mut String, arg: &str) {
    text.push_str(", ");
    text.push_str(arg);
}

fn expect_arity(
    code: &'static str,
    args: &[&str],
    count: usize,
    expected: &'static str,
) -> Result<(), CommandError> {
    if args.len() < count {
        return Err(CommandError::MissingArgument { code, expected });
    }
    if args.len() > count {
        return Err(CommandError::InvalidArgument {
            code,
            value: args[count..].join(" "),
            expected,
        });
    }
    Ok(())
}

fn parse_on_off(code: &'static str, value: &str) -> Result<OnOff, CommandError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "ON" => Ok(OnOff::On),
        "OFF" => Ok(OnOff::Off),
        _ => Err(CommandError::InvalidArgument {
            code,
            value: value.to_string(),
            expected: "ON or OFF",
        }),
    }
}

fn parse_time_setting(value: &str) -> Result<TimeSetting, CommandError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("GPS") {
        return Ok(TimeSetting::Gps);
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map(TimeSetting::Clock)
        .map_err(|_| CommandError::InvalidArgument {
            code: "ST",
            value: value.to_string(),
            expected: "GPS or HH:MM:SS",
        })
}

fn parse_simulation_mode(value: &str) -> Result<SimulationMode, CommandError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "ENABLE" => Ok(SimulationMode::Enable),
        "ACTIVATE" => Ok(SimulationMode::Activate),
        "DISABLE" => Ok(SimulationMode::Disable),
        _ => Err(CommandError::InvalidArgument {
            code: "SIM",
            value: value.to_string(),
            expected: "ENABLE, ACTIVATE or DISABLE",
        }),
    }
}

fn parse_mechanism(value: &str) -> Result<Mechanism, CommandError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "CAM1" => Ok(Mechanism::Cam1),
        "CAM2" => Ok(Mechanism::Cam2),
        "GYRO" => Ok(Mechanism::Gyro),
        _ => Err(CommandError::InvalidArgument {
            code: "MEC",
            value: value.to_string(),
            expected: "CAM1, CAM2 or GYRO",
        }),
    }
}

pub(crate) fn parse_pressure(code: &'static str, value: &str) -> Result<u32, CommandError> {
    value
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidArgument {
            code,
            value: value.to_string(),
            expected: "a pressure in pascals",
        })
}
