use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("meshlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: meshlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("MESHLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "frame: magic={:02x}{:02x} max_payload={}",
        meshlink_frame::MAGIC[0],
        meshlink_frame::MAGIC[1],
        meshlink_frame::MAX_PAYLOAD
    );
    println!(
        "features: serial={}, async={}, cli=true",
        cfg!(feature = "serial"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
