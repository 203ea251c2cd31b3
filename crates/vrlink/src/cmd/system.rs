use crate::cmd::{Context, SystemCommand};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{emit, Done};

pub fn run(command: SystemCommand, ctx: &Context) -> CliResult<i32> {
    let mut module = ctx.open_module()?;

    let done = match command {
        SystemCommand::Baud { rate, verify } => {
            module
                .switch_baud_rate(rate)
                .map_err(|err| device_error("set baud rate failed", err))?;
            tracing::info!(rate, "module baud rate changed; use --baud {rate} from now on");
            if verify {
                let settings = module
                    .check_system_settings()
                    .map_err(|err| device_error("baud rate readback failed", err))?;
                emit(&settings, ctx.format);
                return Ok(SUCCESS);
            }
            "system baud"
        }
        SystemCommand::IoMode { mode } => {
            module
                .set_io_mode(mode.into())
                .map_err(|err| device_error("set io mode failed", err))?;
            "system io-mode"
        }
        SystemCommand::PulseWidth { level } => {
            module
                .set_pulse_width(level)
                .map_err(|err| device_error("set pulse width failed", err))?;
            "system pulse-width"
        }
        SystemCommand::ResetIo { outputs } => {
            module
                .reset_io(&outputs)
                .map_err(|err| device_error("reset io failed", err))?;
            "system reset-io"
        }
        SystemCommand::AutoLoad { ids } => {
            if ids.is_empty() {
                module
                    .disable_auto_load()
                    .map_err(|err| device_error("disable auto load failed", err))?;
            } else {
                module
                    .set_auto_load(&ids)
                    .map_err(|err| device_error("set auto load failed", err))?;
            }
            "system auto-load"
        }
        SystemCommand::Restore => {
            module
                .restore_system_settings()
                .map_err(|err| device_error("restore settings failed", err))?;
            "system restore"
        }
    };

    emit(&Done::new(done), ctx.format);
    Ok(SUCCESS)
}
