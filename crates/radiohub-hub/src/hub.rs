use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use radiohub_endpoint::{DispatchOutcome, Endpoint, EndpointRegistry};
use radiohub_frame::{FrameReader, FrameWriter, KeyValueStore, WireMessage};
use radiohub_transport::{open_device, ByteSink, ByteSource, IoPort};
use tracing::{debug, info, trace};

use crate::config::HubConfig;
use crate::error::{HubError, Result};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Receives what the hub decodes.
pub trait HubClient {
    /// A frame passed its CRC check and was decoded by its endpoint.
    fn on_data_event(&mut self, result: &KeyValueStore);

    /// A frame was dropped. `frame` is as it was when dispatch gave up.
    fn on_dropped(&mut self, frame: &WireMessage, outcome: DispatchOutcome) {
        let _ = (frame, outcome);
    }
}

impl<F: FnMut(&KeyValueStore)> HubClient for F {
    fn on_data_event(&mut self, result: &KeyValueStore) {
        self(result)
    }
}

/// Owns both directions of a radio link and the endpoints that speak on it.
pub struct RadioHub<R, W> {
    registry: EndpointRegistry,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    result: KeyValueStore,
    config: HubConfig,
}

impl<R: ByteSource, W: ByteSink> RadioHub<R, W> {
    /// Create a hub with default configuration.
    pub fn new(source: R, sink: W) -> Self {
        Self::with_config(source, sink, HubConfig::default())
    }

    /// Create a hub with explicit configuration.
    pub fn with_config(source: R, sink: W, config: HubConfig) -> Self {
        let registry = EndpointRegistry::with_config(config.registry);
        let result = registry.result_store();
        Self {
            registry,
            reader: FrameReader::with_config(source, config.frame.clone()),
            writer: FrameWriter::with_config(sink, config.frame.clone()),
            result,
            config,
        }
    }

    /// Add an endpoint. Call during startup, before polling.
    pub fn register<E: Endpoint + 'static>(&mut self, endpoint: E) -> Result<()> {
        self.registry.register(endpoint)?;
        Ok(())
    }

    /// Start receiving from a clean state.
    pub fn enable(&mut self) {
        self.reader.reset();
        self.result.clear();
        info!(endpoints = ?self.registry.endpoint_ids(), "radio hub enabled");
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.reader.reset();
    }

    /// Read everything the port has ready and dispatch each frame.
    ///
    /// Returns the number of bytes consumed.
    pub fn poll<C: HubClient + ?Sized>(&mut self, client: &mut C) -> Result<usize> {
        let registry = &self.registry;
        let result = &mut self.result;
        let consumed = self
            .reader
            .poll(|frame| dispatch(registry, result, frame, client))?;
        Ok(consumed)
    }

    /// Dispatch bytes that arrived by some other route than the port.
    pub fn feed<C: HubClient + ?Sized>(&mut self, bytes: &[u8], client: &mut C) {
        let registry = &self.registry;
        let result = &mut self.result;
        self.reader
            .feed(bytes, |frame| dispatch(registry, result, frame, client));
    }

    /// Poll until one frame decodes or `timeout` elapses.
    ///
    /// Frames dropped while waiting only show up in the debug log.
    pub fn wait_event(&mut self, timeout: Duration) -> Result<KeyValueStore> {
        let deadline = Instant::now() + timeout;
        let mut event = None;
        loop {
            self.poll(&mut |result: &KeyValueStore| {
                if event.is_none() {
                    event = Some(result.clone());
                }
            })?;
            if let Some(event) = event.take() {
                return Ok(event);
            }
            if Instant::now() >= deadline {
                return Err(HubError::Timeout(timeout));
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    /// Append the CRC, SLIP-encode and write `msg` (blocking until drained).
    pub fn send(&mut self, msg: &mut WireMessage) -> Result<()> {
        self.writer.send(msg)?;
        Ok(())
    }

    /// Send a request with no payload.
    pub fn send_request(&mut self, endpoint_id: u8, message_id: u8) -> Result<()> {
        self.writer.send_request(endpoint_id, message_id)?;
        Ok(())
    }

    /// Empty request with room for a payload of up to the configured size.
    pub fn new_request(&self, endpoint_id: u8, message_id: u8) -> WireMessage {
        WireMessage::request(self.config.frame.max_message_size, endpoint_id, message_id)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn reader(&self) -> &FrameReader<R> {
        &self.reader
    }

    pub fn writer(&self) -> &FrameWriter<W> {
        &self.writer
    }

    /// Current hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Consume the hub and return the port halves.
    pub fn into_parts(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }
}

/// Open an already-configured serial device and build a hub on it.
pub fn open(
    path: impl AsRef<Path>,
    config: HubConfig,
) -> Result<RadioHub<IoPort<File>, IoPort<File>>> {
    let reader = open_device(path)?;
    let writer = reader.try_clone()?;
    Ok(RadioHub::with_config(reader, writer, config))
}

fn dispatch<C: HubClient + ?Sized>(
    registry: &EndpointRegistry,
    result: &mut KeyValueStore,
    frame: &mut WireMessage,
    client: &mut C,
) {
    result.clear();
    let outcome = registry.dispatch(frame, result);
    if outcome.is_decoded() {
        trace!(
            endpoint = frame.endpoint_id(),
            message = frame.message_id(),
            records = result.record_count(),
            "frame decoded"
        );
        client.on_data_event(result);
    } else {
        debug!(reason = %outcome, frame = %frame, "frame dropped");
        client.on_dropped(frame, outcome);
    }
}
