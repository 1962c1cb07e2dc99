use clap::{Args, Subcommand};
use std::path::PathBuf;

use leolink_link::LinkConfig;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the payload and print telemetry until Ctrl-C.
    Monitor(MonitorArgs),
    /// Send a single command to the payload.
    Send(SendArgs),
    /// List serial ports the radio modem could be on.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: LinkConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, config, format),
        Command::Send(args) => send::run(args, config, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port of the radio modem, or `unix:<path>` for a socket bridge.
    pub port: String,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
    /// Do not write the session log.
    #[arg(long)]
    pub no_store: bool,
    /// Run simulation mode with the pressure profile in FILE.
    #[arg(long, value_name = "FILE")]
    pub simulate: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial port of the radio modem, or `unix:<path>` for a socket bridge.
    pub port: String,
    /// Command code: CX, ST, SIM, SIMP, CAL, RST, MEC, START, CALIMU.
    pub code: String,
    /// Command arguments, e.g. `on`, `gps`, `cam1 off`.
    pub args: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
