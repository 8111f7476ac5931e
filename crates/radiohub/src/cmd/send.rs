use radiohub::device::{self, DeviceManagement};
use radiohub_frame::FrameConfig;
use radiohub_hub::{open, HubConfig};
use tracing::info;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{hub_error, CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut msg = args.request.to_message()?;

    let config = HubConfig {
        frame: FrameConfig {
            wakeup_bytes: args.request.wakeup,
            write_timeout: Some(timeout),
            ..FrameConfig::default()
        },
        registry: device::registry_config(),
    };
    let mut hub = open(&args.path, config).map_err(|err| hub_error("open failed", err))?;
    hub.register(DeviceManagement::new())
        .map_err(|err| hub_error("register failed", err))?;
    hub.enable();

    hub.send(&mut msg)
        .map_err(|err| hub_error("send failed", err))?;
    info!(
        endpoint = msg.endpoint_id(),
        message = msg.message_id(),
        frame = %msg,
        "request sent"
    );

    if args.wait {
        let event = hub
            .wait_event(timeout)
            .map_err(|err| hub_error("receive failed", err))?;
        print_event(&event, format);
    }

    Ok(SUCCESS)
}
