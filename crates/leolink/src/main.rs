mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use leolink_link::LinkConfig;

use crate::cmd::Command;
use crate::exit::{config_error, CliResult};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "leolink", version, about = "CanSat ground-station telemetry link")]
struct Cli {
    /// Link configuration file (TOML).
    #[arg(long, value_name = "FILE", env = "LEOLINK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Team identifier stamped into commands; overrides the config file.
    #[arg(long, value_name = "ID", global = true)]
    team_id: Option<u32>,

    /// Directory for session logs; overrides the config file.
    #[arg(long, value_name = "DIR", global = true)]
    log_root: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "LEOLINK_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn link_config(&self) -> CliResult<LinkConfig> {
        let mut config = match &self.config {
            Some(path) => LinkConfig::from_file(path).map_err(|err| {
                config_error(&format!("failed loading {}", path.display()), err)
            })?,
            None => LinkConfig::default(),
        };
        if let Some(team_id) = self.team_id {
            config.team_id = team_id;
        }
        if let Some(log_root) = &self.log_root {
            config.log_root = log_root.clone();
        }
        config
            .validate()
            .map_err(|err| config_error("invalid configuration", err))?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cli
        .link_config()
        .and_then(|config| cmd::run(cli.command, config, format));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
