//! Wire-level building blocks for the radio module protocol.
//!
//! Every message on the serial link is a small binary frame:
//! - a 1-byte endpoint id and a 1-byte message id
//! - an optional status byte and payload
//! - a CRC16 (X.25, little-endian) trailer
//!
//! wrapped in SLIP so frames can be recovered from a raw byte stream.
//! Buffers never reallocate: receive storage is sized once and reused.

#[cfg(feature = "async")]
pub mod codec;
pub mod buffer;
pub mod config;
pub mod crc;
pub mod dict;
pub mod error;
pub mod message;
pub mod reader;
pub mod slip;
pub mod writer;

pub use buffer::BoundedBuffer;
#[cfg(feature = "async")]
pub use codec::SlipCodec;
pub use config::{FrameConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use dict::KeyValueStore;
pub use error::{FrameError, Result};
pub use message::{hex_string, hex_string_lsb, WireMessage};
pub use reader::FrameReader;
pub use slip::{SlipDecoder, SlipState};
pub use writer::FrameWriter;
