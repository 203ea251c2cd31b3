use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use vrlink_device::{GroupControl, IoMode, VoiceModule};
use vrlink_session::SessionConfig;
use vrlink_transport::{SerialConfig, SerialTransport};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod check;
pub mod group;
pub mod listen;
pub mod load;
pub mod ports;
pub mod self_test;
pub mod system;
pub mod train;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query module settings, recognizer contents or record state.
    #[command(subcommand)]
    Check(CheckCommand),
    /// Train one or more records.
    Train(TrainArgs),
    /// Manage record signatures.
    #[command(subcommand)]
    Signature(SignatureCommand),
    /// Load records into the recognizer.
    Load(LoadArgs),
    /// Empty the recognizer.
    Clear,
    /// Manage record groups.
    #[command(subcommand)]
    Group(GroupCommand),
    /// Change persistent module settings.
    #[command(subcommand)]
    System(SystemCommand),
    /// Factory self-test transfers.
    #[command(subcommand)]
    SelfTest(SelfTestCommand),
    /// Print recognition events as they arrive.
    Listen(ListenArgs),
    /// List serial ports on this machine.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

/// Connection settings shared by every module command.
#[derive(Debug, Clone)]
pub struct Context {
    pub port: Option<String>,
    pub baud: u32,
    pub timeout: Option<String>,
    pub format: OutputFormat,
}

impl Context {
    /// Open the configured port and wrap it in a module handle.
    pub fn open_module(&self) -> CliResult<VoiceModule<SerialTransport>> {
        let port = self.port.as_deref().ok_or_else(|| {
            CliError::new(USAGE, "no serial port given (use --port or VRLINK_PORT)")
        })?;

        let mut config = SessionConfig::default();
        if let Some(timeout) = &self.timeout {
            config.reply_timeout = parse_duration(timeout)?;
        }

        let serial = SerialConfig::new(port).with_baud_rate(self.baud);
        let transport =
            SerialTransport::open(&serial).map_err(|err| transport_error("open failed", err))?;
        Ok(VoiceModule::with_config(transport, config))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Check(command) => check::run(command, ctx),
        Command::Train(args) => train::run(args, ctx),
        Command::Signature(command) => train::signature(command, ctx),
        Command::Load(args) => load::run(args, ctx),
        Command::Clear => load::clear(ctx),
        Command::Group(command) => group::run(command, ctx),
        Command::System(command) => system::run(command, ctx),
        Command::SelfTest(command) => self_test::run(command, ctx),
        Command::Listen(args) => listen::run(args, ctx),
        Command::Ports => ports::run(ctx.format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Persistent settings: baud rate, IO mode, pulse width, auto load.
    Settings,
    /// Records loaded in the recognizer.
    Recognizer,
    /// Train state of records (all records when none are given).
    Records {
        /// Record ids (comma-separated).
        #[arg(value_delimiter = ',')]
        ids: Vec<u8>,
    },
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Record ids to train (comma-separated).
    #[arg(value_delimiter = ',', required = true)]
    pub ids: Vec<u8>,
    /// Attach a text signature; only valid with a single record.
    #[arg(long)]
    pub signature: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SignatureCommand {
    /// Set the text signature of a record.
    Set { record: u8, text: String },
    /// Remove the signature of a record.
    Delete { record: u8 },
    /// Show the signature of a record.
    Check { record: u8 },
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Record ids to load (comma-separated).
    #[arg(value_delimiter = ',', required = true)]
    pub ids: Vec<u8>,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Show the group control mode.
    Control,
    /// Set the group control mode.
    SetControl {
        #[arg(value_enum)]
        mode: GroupControlArg,
    },
    /// Store records in a user group.
    Set {
        group: u8,
        /// Record ids (comma-separated).
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<u8>,
    },
    /// Show one user group, or all of them.
    Check { group: Option<u8> },
    /// Load a built-in system group into the recognizer.
    LoadSystem { group: u8 },
    /// Load a user group into the recognizer.
    LoadUser { group: u8 },
}

#[derive(Subcommand, Debug)]
pub enum SystemCommand {
    /// Change the module baud rate.
    Baud {
        rate: u32,
        /// Read the settings back at the new rate.
        #[arg(long)]
        verify: bool,
    },
    /// Set how output pins react to a recognition.
    IoMode {
        #[arg(value_enum)]
        mode: IoModeArg,
    },
    /// Set the output pulse width level (0-15).
    PulseWidth { level: u8 },
    /// Reset output pins (all pins when none are given).
    ResetIo {
        #[arg(value_delimiter = ',')]
        outputs: Vec<u8>,
    },
    /// Records loaded at power-on; disables auto load when none are given.
    AutoLoad {
        #[arg(value_delimiter = ',')]
        ids: Vec<u8>,
    },
    /// Restore factory settings.
    Restore,
}

#[derive(Subcommand, Debug)]
pub enum SelfTestCommand {
    /// Read the self-test image.
    Read,
    /// Write a self-test image from a file.
    Write { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Load these records before listening (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub load: Option<Vec<u8>>,
    /// Exit after N recognitions.
    #[arg(long)]
    pub count: Option<usize>,
    /// Wait per poll for a recognition (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub poll: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum IoModeArg {
    Pulse,
    Toggle,
    Set,
    Clear,
}

impl From<IoModeArg> for IoMode {
    fn from(arg: IoModeArg) -> Self {
        match arg {
            IoModeArg::Pulse => IoMode::Pulse,
            IoModeArg::Toggle => IoMode::Toggle,
            IoModeArg::Set => IoMode::Set,
            IoModeArg::Clear => IoMode::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum GroupControlArg {
    Disabled,
    User,
    System,
}

impl From<GroupControlArg> for GroupControl {
    fn from(arg: GroupControlArg) -> Self {
        match arg {
            GroupControlArg::Disabled => GroupControl::Disabled,
            GroupControlArg::User => GroupControl::User,
            GroupControlArg::System => GroupControl::System,
        }
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn missing_port_is_a_usage_error() {
        let ctx = Context {
            port: None,
            baud: 38400,
            timeout: None,
            format: OutputFormat::Json,
        };
        let err = ctx.open_module().map(|_| ()).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn bad_timeout_is_rejected_before_opening() {
        let ctx = Context {
            port: Some("/dev/vrlink-missing".to_string()),
            baud: 38400,
            timeout: Some("soon".to_string()),
            format: OutputFormat::Json,
        };
        let err = ctx.open_module().map(|_| ()).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
