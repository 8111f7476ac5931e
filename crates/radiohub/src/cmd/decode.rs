use std::fs;
use std::io::Read;

use radiohub::device::{self, DeviceManagement};
use radiohub_frame::slip::END;
use radiohub_hub::{HubConfig, RadioHub};
use radiohub_transport::MemoryPort;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{hub_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{EventPrinter, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut bytes = read_input(&args)?;
    if !bytes.contains(&END) {
        bytes.insert(0, END);
        bytes.push(END);
    }

    let config = HubConfig {
        registry: device::registry_config(),
        ..HubConfig::default()
    };
    let mut hub = RadioHub::with_config(MemoryPort::new(), MemoryPort::new(), config);
    hub.register(DeviceManagement::new())
        .map_err(|err| hub_error("register failed", err))?;
    hub.enable();

    let mut printer = EventPrinter::new(format, None);
    hub.feed(&bytes, &mut printer);

    if printer.printed() == 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no message decoded ({} frames dropped)", printer.dropped()),
        ));
    }
    Ok(SUCCESS)
}

/// Hex argument, file contents, or stdin. Input without any END byte is
/// taken as a single frame body.
fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(bytes)
}
