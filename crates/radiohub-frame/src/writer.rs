use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use radiohub_transport::ByteSink;
use tracing::{trace, warn};

use crate::config::{FrameConfig, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{FrameError, Result};
use crate::message::{WireMessage, CRC_SIZE, MIN_SIZE};
use crate::slip;

// Every byte escaped, plus both delimiters.
const INITIAL_BUFFER_CAPACITY: usize = 2 * DEFAULT_MAX_MESSAGE_SIZE + 2;

/// Sends CRC-protected, SLIP-encoded frames to a [`ByteSink`].
pub struct FrameWriter<K> {
    inner: K,
    buf: BytesMut,
    config: FrameConfig,
}

impl<K: ByteSink> FrameWriter<K> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: K) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: K, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Append the CRC to `msg`, encode it and write it out (blocking until
    /// the sink has taken every byte).
    ///
    /// `msg` keeps its CRC trailer afterwards.
    pub fn send(&mut self, msg: &mut WireMessage) -> Result<()> {
        let size = msg.len() + CRC_SIZE;
        let max = self.config.max_message_size.min(msg.capacity());
        if size > max {
            return Err(FrameError::MessageTooLarge { size, max });
        }

        msg.append_crc16();
        self.buf.clear();
        slip::encode_with_wakeup(msg.as_bytes(), self.config.wakeup_bytes, &mut self.buf);
        trace!(
            endpoint = msg.endpoint_id(),
            message = msg.message_id(),
            frame = %msg,
            wire_len = self.buf.len(),
            "sending frame"
        );

        drain(&mut self.inner, &self.buf, self.config.write_timeout)?;
        self.flush()
    }

    /// Send a request that carries no payload.
    pub fn send_request(&mut self, endpoint_id: u8, message_id: u8) -> Result<()> {
        let mut msg = WireMessage::request(MIN_SIZE, endpoint_id, message_id);
        self.send(&mut msg)
    }

    /// Write already-encoded bytes, looping until the sink has taken them all.
    pub fn write_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        drain(&mut self.inner, bytes, self.config.write_timeout)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &K {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut K {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> K {
        self.inner
    }

    /// Update the number of wakeup bytes sent ahead of each frame.
    pub fn set_wakeup_bytes(&mut self, wakeup_bytes: usize) {
        self.config.wakeup_bytes = wakeup_bytes;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Push `bytes` into `sink`, re-querying writable space whenever it fills.
///
/// With a timeout, gives up once the sink has made no progress for that long.
fn drain<K: ByteSink>(sink: &mut K, bytes: &[u8], timeout: Option<Duration>) -> Result<()> {
    let mut offset = 0;
    let mut stalled_since: Option<Instant> = None;

    while offset < bytes.len() {
        let space = sink.available_for_write()?;
        let written = if space == 0 {
            0
        } else {
            let end = offset + space.min(bytes.len() - offset);
            sink.write(&bytes[offset..end])?
        };

        if written > 0 {
            offset += written;
            stalled_since = None;
            continue;
        }

        let since = *stalled_since.get_or_insert_with(Instant::now);
        if let Some(timeout) = timeout {
            if since.elapsed() >= timeout {
                warn!(written = offset, total = bytes.len(), ?timeout, "write stalled");
                return Err(FrameError::WriteTimeout {
                    written: offset,
                    total: bytes.len(),
                    timeout,
                });
            }
        }
        thread::yield_now();
    }
    Ok(())
}
