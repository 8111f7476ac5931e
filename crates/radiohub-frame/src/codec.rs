//! `tokio_util::codec` adapter for event-loop hosts.
//!
//! Uses the same SLIP transition as [`crate::reader::FrameReader`], so the
//! async and polled paths agree byte for byte.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::FrameConfig;
use crate::error::FrameError;
use crate::message::{WireMessage, CRC_SIZE};
use crate::slip::{self, SlipDecoder};

/// SLIP codec over [`WireMessage`].
///
/// Decoded items are raw frames with their CRC still attached. Encoding
/// appends the CRC before escaping.
#[derive(Debug)]
pub struct SlipCodec {
    decoder: SlipDecoder,
    rx: WireMessage,
    config: FrameConfig,
}

impl SlipCodec {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            decoder: SlipDecoder::new(),
            rx: WireMessage::new(config.max_message_size),
            config,
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.rx.clear();
    }
}

impl Default for SlipCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SlipCodec {
    type Item = WireMessage;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut frame = None;
        let mut consumed = 0;
        for &byte in src.iter() {
            consumed += 1;
            self.decoder
                .decode_byte(byte, &mut self.rx, &mut |msg: &mut WireMessage| {
                    frame = Some(msg.clone());
                });
            if frame.is_some() {
                break;
            }
        }
        src.advance(consumed);
        Ok(frame)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.decode(src)?;
        if frame.is_none() {
            // An unterminated frame at end of stream is noise.
            self.reset();
        }
        Ok(frame)
    }
}

impl Encoder<WireMessage> for SlipCodec {
    type Error = FrameError;

    fn encode(&mut self, mut item: WireMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.len() + CRC_SIZE;
        let max = self.config.max_message_size.min(item.capacity());
        if size > max {
            return Err(FrameError::MessageTooLarge { size, max });
        }
        item.append_crc16();
        slip::encode_with_wakeup(item.as_bytes(), self.config.wakeup_bytes, dst);
        Ok(())
    }
}
