//! Ping a radio module and print its device information.
//!
//! The serial device must already be configured (baud rate, raw mode):
//!   stty -F /dev/ttyUSB0 115200 raw -echo min 0 time 1
//!
//! Run with:
//!   cargo run --example ping -- /dev/ttyUSB0

use std::time::Duration;

use radiohub::device::{self, DeviceManagement, Request};
use radiohub::hub::{open, HubConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let config = HubConfig {
        registry: device::registry_config(),
        ..HubConfig::default()
    };
    let mut hub = open(&path, config)?;
    hub.register(DeviceManagement::new())?;
    hub.enable();

    for request in [Request::Ping, Request::GetDeviceInfo, Request::GetFirmwareVersion] {
        hub.send(&mut request.to_message())?;
        let event = hub.wait_event(Duration::from_secs(2))?;
        println!("{event}");
    }

    Ok(())
}
