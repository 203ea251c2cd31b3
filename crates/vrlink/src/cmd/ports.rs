use vrlink_transport::available_ports;

use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat, PortsOutput};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("port scan failed", err))?;
    emit(&PortsOutput { ports }, format);
    Ok(SUCCESS)
}
