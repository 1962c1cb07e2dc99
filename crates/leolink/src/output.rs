use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use leolink_device::PortInfo;
use leolink_frame::{unit_for, Telemetry};
use leolink_link::{LinkStats, SessionOutcome};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

fn with_unit(value: impl ToString, column: &str) -> String {
    match unit_for(column) {
        Some(unit) => format!("{} {unit}", value.to_string()),
        None => value.to_string(),
    }
}

pub fn print_telemetry(telemetry: &Telemetry, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(telemetry).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "PACKET", "TIME", "MODE", "STATE", "ALTITUDE", "TEMP", "PRESSURE", "VOLTAGE",
                    "SATS", "CMD_ECHO",
                ])
                .add_row(vec![
                    telemetry.packet_count.to_string(),
                    telemetry.mission_time.clone(),
                    telemetry.mode.to_string(),
                    telemetry.state.to_string(),
                    with_unit(telemetry.altitude, "ALTITUDE"),
                    with_unit(telemetry.temperature, "TEMPERATURE"),
                    with_unit(telemetry.pressure, "PRESSURE"),
                    with_unit(telemetry.voltage, "VOLTAGE"),
                    telemetry.gps.sats.to_string(),
                    telemetry.cmd_echo.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packet={} time={} mode={} state={} alt={} temp={} pressure={} voltage={} sats={} echo={:?}",
                telemetry.packet_count,
                telemetry.mission_time,
                telemetry.mode,
                telemetry.state,
                with_unit(telemetry.altitude, "ALTITUDE"),
                with_unit(telemetry.temperature, "TEMPERATURE"),
                with_unit(telemetry.pressure, "PRESSURE"),
                with_unit(telemetry.voltage, "VOLTAGE"),
                telemetry.gps.sats,
                telemetry.cmd_echo,
            );
        }
    }
}

#[derive(Serialize)]
struct SentOutput<'a> {
    port: &'a str,
    sent: &'a str,
}

pub fn print_sent(port: &str, text: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SentOutput { port, sent: text };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("sent to {port}: {text}"),
    }
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    outcome: &'static str,
    log: Option<String>,
    summary: Option<String>,
    stats: &'a LinkStats,
}

/// Session result goes to stderr so stdout stays one record per line.
pub fn print_session(outcome: &SessionOutcome, stats: &LinkStats, format: OutputFormat) {
    let (label, log, summary) = match outcome {
        SessionOutcome::Kept { path, summary } => (
            "kept",
            Some(path.display().to_string()),
            summary.as_ref().map(|path| path.display().to_string()),
        ),
        SessionOutcome::Discarded => ("discarded", None, None),
        SessionOutcome::AlreadyClosed => ("already-closed", None, None),
    };

    match format {
        OutputFormat::Json => {
            let out = SessionOutput {
                outcome: label,
                log,
                summary,
                stats,
            };
            eprintln!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            eprintln!(
                "session {label}: accepted={} duplicates={} dropped={} malformed={} sent={}",
                stats.frames_accepted,
                stats.duplicates,
                stats.packets_dropped,
                stats.malformed_frames,
                stats.commands_sent
            );
            if let Some(log) = log {
                eprintln!("log: {log}");
            }
            if let Some(summary) = summary {
                eprintln!("summary: {summary}");
            }
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    description: &'a str,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|port| PortOutput {
                    name: &port.name,
                    description: &port.description,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![port.name.clone(), port.description.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                println!("{}  {}", port.name, port.description);
            }
        }
    }
}
