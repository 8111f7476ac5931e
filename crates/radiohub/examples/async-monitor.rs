//! Decode device-management frames from an async byte stream.
//!
//! A task plays the radio module and writes two responses into an in-memory
//! pipe; the host side deframes them with `SlipCodec` and dispatches each
//! frame through the endpoint registry.
//!
//! Run with:
//!   cargo run --example async-monitor --features async

use futures_util::{SinkExt, StreamExt};
use radiohub::device::{self, DeviceManagement};
use radiohub::endpoint::EndpointRegistry;
use radiohub::frame::{SlipCodec, WireMessage};
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (module_side, host_side) = tokio::io::duplex(256);

    let module = tokio::spawn(async move {
        let mut sink = FramedWrite::new(module_side, SlipCodec::new());

        let mut ping = WireMessage::request(16, device::ENDPOINT_ID, device::PING_RSP);
        ping.append_u8(device::status::OK);
        sink.send(ping).await?;

        let mut clock = WireMessage::request(16, device::ENDPOINT_ID, device::GET_DATE_TIME_RSP);
        clock.append_u8(device::status::OK);
        clock.append_u32(1_600_000_000);
        sink.send(clock).await
    });

    let mut registry = EndpointRegistry::with_config(device::registry_config());
    registry.register(DeviceManagement::new())?;
    let mut result = registry.result_store();

    let mut frames = FramedRead::new(host_side, SlipCodec::new());
    while let Some(frame) = frames.next().await {
        let mut frame = frame?;
        result.clear();
        let outcome = registry.dispatch(&mut frame, &mut result);
        if outcome.is_decoded() {
            println!("{result}");
        } else {
            eprintln!("dropped {frame}: {outcome}");
        }
    }

    module.await??;
    Ok(())
}
