use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("vrlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: vrlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("VRLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: device={}, serial={}, async={}, cli=true",
        cfg!(feature = "device"),
        cfg!(feature = "serial"),
        cfg!(feature = "async")
    );
    println!(
        "default_baud: {}",
        vrlink_transport::DEFAULT_BAUD_RATE
    );

    Ok(SUCCESS)
}
