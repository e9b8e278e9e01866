use adcstream_source::available_ports;

use crate::exit::{source_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| source_error("port enumeration failed", err))?;
    print_ports(&ports, format);
    Ok(SUCCESS)
}
