use vrlink_device::Signature;

use crate::cmd::{Context, SignatureCommand, TrainArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{emit, hex, Done, SignatureOutput};

pub fn run(args: TrainArgs, ctx: &Context) -> CliResult<i32> {
    let signature = match &args.signature {
        Some(text) => {
            if args.ids.len() != 1 {
                return Err(CliError::new(
                    USAGE,
                    "--signature needs exactly one record",
                ));
            }
            Some(Signature::text(text).map_err(|err| device_error("bad signature", err))?)
        }
        None => None,
    };

    let mut module = ctx.open_module()?;
    tracing::info!(records = ?args.ids, "training; speak when prompted");

    let outcome = match signature {
        Some(signature) => module.train_with_signature(args.ids[0], &signature),
        None => module.train(&args.ids),
    }
    .map_err(|err| device_error("train failed", err))?;

    emit(&outcome, ctx.format);
    Ok(SUCCESS)
}

pub fn signature(command: SignatureCommand, ctx: &Context) -> CliResult<i32> {
    match command {
        SignatureCommand::Set { record, text } => {
            let signature =
                Signature::text(&text).map_err(|err| device_error("bad signature", err))?;
            let mut module = ctx.open_module()?;
            module
                .set_signature(record, &signature)
                .map_err(|err| device_error("set signature failed", err))?;
            emit(&Done::new("signature set"), ctx.format);
        }
        SignatureCommand::Delete { record } => {
            let mut module = ctx.open_module()?;
            module
                .delete_signature(record)
                .map_err(|err| device_error("delete signature failed", err))?;
            emit(&Done::new("signature delete"), ctx.format);
        }
        SignatureCommand::Check { record } => {
            let mut module = ctx.open_module()?;
            let signature = module
                .check_signature(record)
                .map_err(|err| device_error("check signature failed", err))?;
            let out = SignatureOutput {
                record,
                signature: signature
                    .as_deref()
                    .map(|sig| String::from_utf8_lossy(sig).into_owned()),
                signature_hex: signature.as_deref().map(hex),
            };
            emit(&out, ctx.format);
        }
    }

    Ok(SUCCESS)
}
