use crate::cmd::{Context, GroupCommand};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{emit, Done, GroupControlOutput};

pub fn run(command: GroupCommand, ctx: &Context) -> CliResult<i32> {
    let mut module = ctx.open_module()?;

    match command {
        GroupCommand::Control => {
            let group_control = module
                .check_group_control()
                .map_err(|err| device_error("check group control failed", err))?;
            emit(&GroupControlOutput { group_control }, ctx.format);
        }
        GroupCommand::SetControl { mode } => {
            module
                .set_group_control(mode.into())
                .map_err(|err| device_error("set group control failed", err))?;
            emit(&Done::new("group set-control"), ctx.format);
        }
        GroupCommand::Set { group, ids } => {
            module
                .set_user_group(group, &ids)
                .map_err(|err| device_error("set user group failed", err))?;
            emit(&Done::new("group set"), ctx.format);
        }
        GroupCommand::Check { group } => {
            let groups = module
                .check_user_group(group)
                .map_err(|err| device_error("check user group failed", err))?;
            emit(&groups, ctx.format);
        }
        GroupCommand::LoadSystem { group } => {
            let status = module
                .load_system_group(group)
                .map_err(|err| device_error("load system group failed", err))?;
            emit(&status, ctx.format);
        }
        GroupCommand::LoadUser { group } => {
            let status = module
                .load_user_group(group)
                .map_err(|err| device_error("load user group failed", err))?;
            emit(&status, ctx.format);
        }
    }

    Ok(SUCCESS)
}
