use radiohub_frame::{FrameConfig, FrameWriter};
use radiohub_transport::MemoryPort;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut msg = args.request.to_message()?;
    let port = MemoryPort::new();
    let config = FrameConfig {
        wakeup_bytes: args.request.wakeup,
        ..FrameConfig::default()
    };
    let mut writer = FrameWriter::with_config(port.clone(), config);
    writer
        .send(&mut msg)
        .map_err(|err| frame_error("encode failed", err))?;

    print_encoded(
        msg.endpoint_id(),
        msg.message_id(),
        msg.as_bytes(),
        &port.take_tx(),
        format,
    );
    Ok(SUCCESS)
}
