use vrlink_device::TEST_IMAGE_SIZE;

use crate::cmd::{Context, SelfTestCommand};
use crate::exit::{device_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{emit, hex, Done, ImageOutput};

pub fn run(command: SelfTestCommand, ctx: &Context) -> CliResult<i32> {
    match command {
        SelfTestCommand::Read => {
            let mut module = ctx.open_module()?;
            let image = module
                .self_test_read()
                .map_err(|err| device_error("self-test read failed", err))?;
            emit(
                &ImageOutput {
                    size: image.len(),
                    hex: hex(&image),
                },
                ctx.format,
            );
        }
        SelfTestCommand::Write { file } => {
            let data = std::fs::read(&file)
                .map_err(|err| io_error(&format!("read {} failed", file.display()), err))?;
            let image: [u8; TEST_IMAGE_SIZE] = data.as_slice().try_into().map_err(|_| {
                CliError::new(
                    USAGE,
                    format!(
                        "self-test image must be {TEST_IMAGE_SIZE} bytes, got {}",
                        data.len()
                    ),
                )
            })?;

            let mut module = ctx.open_module()?;
            module
                .self_test_write(&image)
                .map_err(|err| device_error("self-test write failed", err))?;
            emit(&Done::new("self-test write"), ctx.format);
        }
    }

    Ok(SUCCESS)
}
