use crate::cmd::{CheckCommand, Context};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::emit;

pub fn run(command: CheckCommand, ctx: &Context) -> CliResult<i32> {
    let mut module = ctx.open_module()?;

    match command {
        CheckCommand::Settings => {
            let settings = module
                .check_system_settings()
                .map_err(|err| device_error("check settings failed", err))?;
            emit(&settings, ctx.format);
        }
        CheckCommand::Recognizer => {
            let status = module
                .check_recognizer()
                .map_err(|err| device_error("check recognizer failed", err))?;
            emit(&status, ctx.format);
        }
        CheckCommand::Records { ids } => {
            let report = module
                .check_records(&ids)
                .map_err(|err| device_error("check records failed", err))?;
            emit(&report, ctx.format);
        }
    }

    Ok(SUCCESS)
}
