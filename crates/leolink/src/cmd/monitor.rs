use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use leolink_frame::SimulationMode;
use leolink_link::{Link, LinkConfig, TracingLogger};
use tracing::info;

use crate::cmd::MonitorArgs;
use crate::exit::{io_error, link_error, CliError, CliResult, DEVICE_ERROR, INTERNAL, SUCCESS};
use crate::output::{print_session, print_telemetry, OutputFormat};

pub fn run(args: MonitorArgs, config: LinkConfig, format: OutputFormat) -> CliResult<i32> {
    let profile = match &args.simulate {
        Some(path) => Some(fs::read_to_string(path).map_err(|err| {
            io_error(&format!("failed reading {}", path.display()), err)
        })?),
        None => None,
    };

    let mut link = Link::new(config, Arc::new(TracingLogger))
        .map_err(|err| link_error("session start failed", err))?;
    if args.no_store {
        link.disable_store();
    }
    link.initialise_connection(&args.port)
        .map_err(|err| link_error("connect failed", err))?;

    if let Some(profile) = &profile {
        start_simulation(&mut link, profile)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let interval = link.config().poll_interval();
    let mut printed = 0usize;
    let mut lost = false;

    let reached_count = |printed: usize| args.count.is_some_and(|count| printed >= count);

    while running.load(Ordering::SeqCst) && !reached_count(printed) {
        if let Some(telemetry) = link.tick() {
            print_telemetry(&telemetry, format);
            printed = printed.saturating_add(1);
            if reached_count(printed) {
                break;
            }
        } else if !link.device_is_connected() {
            lost = true;
            break;
        }
        thread::sleep(interval);
    }

    let stats = link.stats();
    let outcome = link.close().map_err(|err| link_error("close failed", err))?;
    print_session(&outcome, &stats, format);

    if lost {
        return Err(CliError::new(DEVICE_ERROR, "device disconnected"));
    }
    Ok(SUCCESS)
}

fn start_simulation(link: &mut Link, profile: &str) -> CliResult<()> {
    link.simulation_mode_control(SimulationMode::Enable)
        .map_err(|err| link_error("simulation enable failed", err))?;
    link.simulation_mode_control(SimulationMode::Activate)
        .map_err(|err| link_error("simulation activate failed", err))?;
    let queued = link
        .queue_simulated_pressure(profile)
        .map_err(|err| link_error("simulation profile rejected", err))?;
    info!(queued, "simulation started");
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
