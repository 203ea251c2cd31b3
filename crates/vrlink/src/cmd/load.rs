use crate::cmd::{Context, LoadArgs};
use crate::exit::{device_error, CliResult, FAILURE, SUCCESS};
use crate::output::{emit, Done};

/// Exits with `FAILURE` when the module loaded none of the records.
pub fn run(args: LoadArgs, ctx: &Context) -> CliResult<i32> {
    let mut module = ctx.open_module()?;
    let outcome = module
        .load(&args.ids)
        .map_err(|err| device_error("load failed", err))?;
    emit(&outcome, ctx.format);

    if outcome.loaded == 0 {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

pub fn clear(ctx: &Context) -> CliResult<i32> {
    let mut module = ctx.open_module()?;
    module
        .clear()
        .map_err(|err| device_error("clear failed", err))?;
    emit(&Done::new("clear"), ctx.format);
    Ok(SUCCESS)
}
