mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "vrlink", version, about = "Voice-recognition module CLI")]
struct Cli {
    /// Serial port the module is attached to.
    #[arg(long, short = 'p', env = "VRLINK_PORT", global = true)]
    port: Option<String>,

    /// Baud rate of the serial link.
    #[arg(long, env = "VRLINK_BAUD", default_value_t = vrlink_transport::DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Reply timeout for single-reply commands (e.g. 2s, 500ms).
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        port: cli.port,
        baud: cli.baud,
        timeout: cli.timeout,
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
    };
    let result = cmd::run(cli.command, &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
