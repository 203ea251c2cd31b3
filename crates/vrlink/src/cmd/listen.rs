use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cmd::{parse_duration, Context, ListenArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS};
use crate::output::emit;

pub fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let poll = parse_duration(&args.poll)?;
    let mut module = ctx.open_module()?;

    if let Some(ids) = &args.load {
        let outcome = module
            .load(ids)
            .map_err(|err| device_error("load failed", err))?;
        tracing::info!(loaded = outcome.loaded, "records loaded");
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let recognition = module
            .recognize(poll)
            .map_err(|err| device_error("receive failed", err))?;
        let Some(recognition) = recognition else {
            continue;
        };

        emit(&recognition, ctx.format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
