use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TelemetryError;

/// Number of comma-separated fields in one telemetry frame.
pub const FIELD_COUNT: usize = 28;

/// Position of the reserved field, which carries no data.
pub const RESERVED_FIELD_INDEX: usize = 25;

/// Column headings of the session log, one per persisted field.
pub const LOG_HEADER: [&str; 27] = [
    "TEAM_ID",
    "MISSION_TIME",
    "PACKET_COUNT",
    "MODE",
    "STATE",
    "ALTITUDE",
    "TEMPERATURE",
    "PRESSURE",
    "VOLTAGE",
    "GYRO_R",
    "GYRO_P",
    "GYRO_Y",
    "ACCEL_R",
    "ACCEL_P",
    "ACCEL_Y",
    "MAG_R",
    "MAG_P",
    "MAG_Y",
    "AUTO_GYRO_ROTATION_RATE",
    "GPS_TIME",
    "GPS_ALTITUDE",
    "GPS_LATITUDE",
    "GPS_LONGITUDE",
    "GPS_SATS",
    "CMD_ECHO",
    "DESC_RATE",
    "GEOG_HEAD",
];

/// Display unit of a log column, if it has one.
pub fn unit_for(column: &str) -> Option<&'static str> {
    let unit = match column {
        "ALTITUDE" | "GPS_ALTITUDE" => "m",
        "TEMPERATURE" => "°C",
        "PRESSURE" => "kPa",
        "VOLTAGE" => "V",
        "GYRO_R" | "GYRO_P" | "GYRO_Y" | "AUTO_GYRO_ROTATION_RATE" => "°s⁻¹",
        "ACCEL_R" | "ACCEL_P" | "ACCEL_Y" => "°s⁻²",
        "MAG_R" | "MAG_P" | "MAG_Y" => "G",
        "GPS_LATITUDE" => "°N",
        "GPS_LONGITUDE" => "°E",
        "DESC_RATE" => "ms⁻¹",
        "GEOG_HEAD" => "°",
        _ => return None,
    };
    Some(unit)
}

/// Payload operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Flight,
    Simulation,
}

impl Mode {
    /// Single-letter wire code.
    pub fn code(self) -> &'static str {
        match self {
            Mode::Flight => "F",
            Mode::Simulation => "S",
        }
    }
}

impl FromStr for Mode {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(Mode::Flight),
            "S" => Ok(Mode::Simulation),
            other => Err(TelemetryError::InvalidField {
                field: "mode",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Flight => f.write_str("Flight"),
            Mode::Simulation => f.write_str("Simulation"),
        }
    }
}

/// Flight phase reported by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    LaunchPad,
    Ascent,
    Apogee,
    Descent,
    ProbeRelease,
    Landed,
}

impl MissionState {
    pub const ALL: [MissionState; 6] = [
        MissionState::LaunchPad,
        MissionState::Ascent,
        MissionState::Apogee,
        MissionState::Descent,
        MissionState::ProbeRelease,
        MissionState::Landed,
    ];

    /// Wire code, e.g. `PROBE_RELEASE`.
    pub fn code(self) -> &'static str {
        match self {
            MissionState::LaunchPad => "LAUNCH_PAD",
            MissionState::Ascent => "ASCENT",
            MissionState::Apogee => "APOGEE",
            MissionState::Descent => "DESCENT",
            MissionState::ProbeRelease => "PROBE_RELEASE",
            MissionState::Landed => "LANDED",
        }
    }
}

impl FromStr for MissionState {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MissionState::ALL
            .into_iter()
            .find(|state| state.code() == s)
            .ok_or_else(|| TelemetryError::InvalidField {
                field: "state",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Roll / pitch / yaw triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Axes {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl fmt::Display for Axes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.roll, self.pitch, self.yaw)
    }
}

/// GPS fix as reported by the payload receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gps {
    pub time: String,
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub sats: u32,
}

/// One decoded telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub team_id: u32,
    pub mission_time: String,
    pub packet_count: u32,
    pub mode: Mode,
    pub state: MissionState,
    pub altitude: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub voltage: f64,
    pub gyro: Axes,
    pub acceleration: Axes,
    pub magnetometer: Axes,
    pub auto_gyro_rotation_rate: f64,
    pub gps: Gps,
    pub cmd_echo: String,
    pub descent_rate: f64,
    pub heading: i32,
}

struct Fields<'a> {
    values: Vec<&'a str>,
}

impl Fields<'_> {
    fn text(&self, index: usize) -> String {
        self.values[index].to_string()
    }

    fn parse<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, TelemetryError> {
        let value = self.values[index];
        value.parse().map_err(|_| TelemetryError::InvalidField {
            field,
            value: value.to_string(),
        })
    }

    fn axes(&self, start: usize, field: &'static str) -> Result<Axes, TelemetryError> {
        Ok(Axes {
            roll: self.parse(start, field)?,
            pitch: self.parse(start + 1, field)?,
            yaw: self.parse(start + 2, field)?,
        })
    }
}

impl Telemetry {
    /// Parse the comma-separated field string of one frame.
    ///
    /// Fields are trimmed before coercion. The reserved field is ignored.
    pub fn parse(fields: &str) -> Result<Self, TelemetryError> {
        let values: Vec<&str> = fields.split(',').map(str::trim).collect();
        if values.len() != FIELD_COUNT {
            return Err(TelemetryError::FieldCount {
                expected: FIELD_COUNT,
                actual: values.len(),
            });
        }
        let f = Fields { values };

        Ok(Self {
            team_id: f.parse(0, "team_id")?,
            mission_time: f.text(1),
            packet_count: f.parse(2, "packet_count")?,
            mode: f.parse(3, "mode")?,
            state: f.parse(4, "state")?,
            altitude: f.parse(5, "altitude")?,
            temperature: f.parse(6, "temperature")?,
            pressure: f.parse(7, "pressure")?,
            voltage: f.parse(8, "voltage")?,
            gyro: f.axes(9, "gyro")?,
            acceleration: f.axes(12, "acceleration")?,
            magnetometer: f.axes(15, "magnetometer")?,
            auto_gyro_rotation_rate: f.parse(18, "auto_gyro_rotation_rate")?,
            gps: Gps {
                time: f.text(19),
                altitude: f.parse(20, "gps_altitude")?,
                latitude: f.parse(21, "gps_latitude")?,
                longitude: f.parse(22, "gps_longitude")?,
                sats: f.parse(23, "gps_sats")?,
            },
            cmd_echo: f.text(24),
            descent_rate: f.parse(26, "descent_rate")?,
            heading: f.parse(27, "geographic_heading")?,
        })
    }

    /// One session-log line, columns in [`LOG_HEADER`] order.
    pub fn to_log_row(&self) -> String {
        let columns: [String; 27] = [
            self.team_id.to_string(),
            self.mission_time.clone(),
            self.packet_count.to_string(),
            self.mode.code().to_string(),
            self.state.code().to_string(),
            self.altitude.to_string(),
            self.temperature.to_string(),
            self.pressure.to_string(),
            self.voltage.to_string(),
            self.gyro.roll.to_string(),
            self.gyro.pitch.to_string(),
            self.gyro.yaw.to_string(),
            self.acceleration.roll.to_string(),
            self.acceleration.pitch.to_string(),
            self.acceleration.yaw.to_string(),
            self.magnetometer.roll.to_string(),
            self.magnetometer.pitch.to_string(),
            self.magnetometer.yaw.to_string(),
            self.auto_gyro_rotation_rate.to_string(),
            self.gps.time.clone(),
            self.gps.altitude.to_string(),
            self.gps.latitude.to_string(),
            self.gps.longitude.to_string(),
            self.gps.sats.to_string(),
            self.cmd_echo.clone(),
            self.descent_rate.to_string(),
            self.heading.to_string(),
        ];
        columns.join(",")
    }
}

impl FromStr for Telemetry {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Telemetry::parse(s)
    }
}

/// Session-log header line.
pub fn log_header() -> String {
    LOG_HEADER.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "3171,12:00:00,1,F,ASCENT,100.0,20.0,1000.0,3.7,0,0,0,0,0,0,0,0,0,5,12:00:00,100.0,1.0,2.0,8,CX ON,,1.5,90";

    #[test]
    fn parses_reference_frame() {
        let telemetry = Telemetry::parse(SAMPLE).unwrap();
        assert_eq!(telemetry.team_id, 3171);
        assert_eq!(telemetry.mission_time, "12:00:00");
        assert_eq!(telemetry.packet_count, 1);
        assert_eq!(telemetry.mode, Mode::Flight);
        assert_eq!(telemetry.state, MissionState::Ascent);
        assert_eq!(telemetry.altitude, 100.0);
        assert_eq!(telemetry.voltage, 3.7);
        assert_eq!(telemetry.auto_gyro_rotation_rate, 5.0);
        assert_eq!(telemetry.gps.sats, 8);
        assert_eq!(telemetry.gps.latitude, 1.0);
        assert_eq!(telemetry.cmd_echo, "CX ON");
        assert_eq!(telemetry.descent_rate, 1.5);
        assert_eq!(telemetry.heading, 90);
    }

    #[test]
    fn trims_whitespace_around_fields() {
        let spaced = SAMPLE.replace(',', " , ");
        let telemetry = Telemetry::parse(&spaced).unwrap();
        assert_eq!(telemetry.packet_count, 1);
        assert_eq!(telemetry.cmd_echo, "CX ON");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let short = SAMPLE.rsplit_once(',').unwrap().0;
        assert!(matches!(
            Telemetry::parse(short),
            Err(TelemetryError::FieldCount {
                expected: 28,
                actual: 27
            })
        ));
        let long = format!("{SAMPLE},extra");
        assert!(matches!(
            Telemetry::parse(&long),
            Err(TelemetryError::FieldCount { actual: 29, .. })
        ));
    }

    #[test]
    fn rejects_uncoercible_fields() {
        let bad_mode = SAMPLE.replacen(",F,", ",X,", 1);
        assert!(matches!(
            Telemetry::parse(&bad_mode),
            Err(TelemetryError::InvalidField { field: "mode", .. })
        ));

        let bad_altitude = SAMPLE.replacen("100.0", "high", 1);
        assert!(matches!(
            Telemetry::parse(&bad_altitude),
            Err(TelemetryError::InvalidField {
                field: "altitude",
                ..
            })
        ));
    }

    #[test]
    fn state_codes_round_trip_through_from_str() {
        for state in MissionState::ALL {
            assert_eq!(state.code().parse::<MissionState>().unwrap(), state);
        }
        assert!("ORBIT".parse::<MissionState>().is_err());
    }

    #[test]
    fn log_row_has_one_column_per_heading() {
        let row = Telemetry::parse(SAMPLE).unwrap().to_log_row();
        let columns: Vec<&str> = row.split(',').collect();
        assert_eq!(columns.len(), LOG_HEADER.len());
        assert_eq!(columns[3], "F");
        assert_eq!(columns[4], "ASCENT");
        assert_eq!(columns[24], "CX ON");
        assert_eq!(columns[26], "90");
    }

    #[test]
    fn units_cover_numeric_columns() {
        assert_eq!(unit_for("PRESSURE"), Some("kPa"));
        assert_eq!(unit_for("GYRO_P"), Some("°s⁻¹"));
        assert_eq!(unit_for("MISSION_TIME"), None);
    }
}
