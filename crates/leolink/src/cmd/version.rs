use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("leolink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: leolink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LEOLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "backends: serial=true, unix-socket={}, memory=true",
        cfg!(unix)
    );
    println!(
        "defaults: baud={}, max_payload={}",
        leolink_device::DEFAULT_BAUD_RATE,
        leolink_device::DEFAULT_MAX_PAYLOAD_LEN
    );

    Ok(SUCCESS)
}
