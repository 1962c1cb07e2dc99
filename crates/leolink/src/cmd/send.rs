use std::sync::Arc;

use chrono::{Local, NaiveTime};
use leolink_frame::{Command, CommandError, CommandKind, TimeSource};
use leolink_link::{Link, LinkConfig, TracingLogger};
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, config: LinkConfig, format: OutputFormat) -> CliResult<i32> {
    let command = resolve_command(&args.code, &args.args, Local::now().time())
        .map_err(|err| CliError::new(USAGE, format!("invalid command: {err}")))?;
    let wire = command.to_wire(config.team_id);

    let mut link = Link::new(config, Arc::new(TracingLogger))
        .map_err(|err| link_error("session start failed", err))?;
    link.disable_store();
    link.initialise_connection(&args.port)
        .map_err(|err| link_error("connect failed", err))?;
    link.send_command(command)
        .map_err(|err| link_error("send failed", err))?;
    print_sent(&args.port, &wire, format);

    let outcome = link.close().map_err(|err| link_error("close failed", err))?;
    debug!(?outcome, "send session closed");
    Ok(SUCCESS)
}

/// Build a command from CLI words. `ST GCS` reads the ground clock at `now`.
fn resolve_command(code: &str, args: &[String], now: NaiveTime) -> Result<Command, CommandError> {
    let kind: CommandKind = code.parse()?;
    if kind == CommandKind::SetTime {
        if let [source] = args {
            if source.eq_ignore_ascii_case("gcs") {
                return Ok(Command::SetTime(TimeSource::Gcs.resolve(now)));
            }
        }
    }
    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    Command::from_parts(kind, &words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 34, 56).unwrap()
    }

    #[test]
    fn resolves_lowercase_words() {
        let command = resolve_command("mec", &words(&["cam1", "off"]), noon()).unwrap();
        assert_eq!(command.to_wire(3171), "CMD, 3171, MEC, CAM1, OFF");
    }

    #[test]
    fn ground_clock_uses_supplied_time() {
        let command = resolve_command("st", &words(&["GCS"]), noon()).unwrap();
        assert_eq!(command.to_wire(3171), "CMD, 3171, ST, 12:34:56");

        let command = resolve_command("st", &words(&["gps"]), noon()).unwrap();
        assert_eq!(command.to_wire(3171), "CMD, 3171, ST, GPS");
    }

    #[test]
    fn rejects_unknown_code_and_bad_arity() {
        assert!(matches!(
            resolve_command("xx", &[], noon()),
            Err(CommandError::UnknownCode(_))
        ));
        assert!(matches!(
            resolve_command("cx", &[], noon()),
            Err(CommandError::MissingArgument { .. })
        ));
    }
}
