use std::fmt::{self, Write as _};

use crate::buffer::BoundedBuffer;
use crate::crc;

/// Endpoint id and message id.
pub const HEADER_SIZE: usize = 2;
/// Little-endian CRC16 trailer.
pub const CRC_SIZE: usize = 2;
/// Smallest frame that can carry a valid CRC.
pub const MIN_SIZE: usize = HEADER_SIZE + CRC_SIZE;

pub const ENDPOINT_ID_INDEX: usize = 0;
pub const MESSAGE_ID_INDEX: usize = 1;
pub const STATUS_INDEX: usize = 2;
/// First payload byte of a response (after the status byte).
pub const RESPONSE_DATA_INDEX: usize = 3;
/// First payload byte of an event (no status byte).
pub const EVENT_DATA_INDEX: usize = 2;

/// Returned by the id and status accessors when the message is too short.
pub const INVALID_ID: u8 = 0xFF;

/// One protocol frame before SLIP encoding (or after decoding).
///
/// Layout: endpoint id, message id, then either a status byte followed by
/// response data or event data directly, then the CRC16 while on the wire.
/// Reads past the end yield zero or empty values; appends past the capacity
/// are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireMessage {
    buf: BoundedBuffer,
}

impl WireMessage {
    /// Empty message with `capacity` bytes of storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BoundedBuffer::new(capacity),
        }
    }

    /// Message holding a copy of `bytes`, sized to fit exactly.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: BoundedBuffer::from(bytes),
        }
    }

    /// Request with the given header and room for `capacity` bytes in total.
    pub fn request(capacity: usize, endpoint_id: u8, message_id: u8) -> Self {
        let mut msg = Self::new(capacity);
        msg.new_request(endpoint_id, message_id);
        msg
    }

    /// Clear and write a fresh request header.
    pub fn new_request(&mut self, endpoint_id: u8, message_id: u8) {
        self.buf.clear();
        self.buf.append(endpoint_id);
        self.buf.append(message_id);
    }

    pub fn endpoint_id(&self) -> u8 {
        self.buf.get(ENDPOINT_ID_INDEX).unwrap_or(INVALID_ID)
    }

    pub fn message_id(&self) -> u8 {
        self.buf.get(MESSAGE_ID_INDEX).unwrap_or(INVALID_ID)
    }

    pub fn response_status(&self) -> u8 {
        self.buf.get(STATUS_INDEX).unwrap_or(INVALID_ID)
    }

    /// Bytes after the header, or `None` if the header is incomplete.
    /// Call after the CRC has been removed.
    pub fn payload_length(&self) -> Option<usize> {
        self.buf.len().checked_sub(HEADER_SIZE)
    }

    /// Bytes after the status byte, or `None` if there is no status byte.
    pub fn response_payload_length(&self) -> Option<usize> {
        self.buf.len().checked_sub(RESPONSE_DATA_INDEX)
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.buf.get(offset).unwrap_or(0)
    }

    pub fn read_u16(&self, offset: usize) -> u16 {
        self.read_le::<2>(offset).map(u16::from_le_bytes).unwrap_or(0)
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        self.read_le::<4>(offset).map(u32::from_le_bytes).unwrap_or(0)
    }

    pub fn read_u64(&self, offset: usize) -> u64 {
        self.read_le::<8>(offset).map(u64::from_le_bytes).unwrap_or(0)
    }

    fn read_le<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.buf.as_slice().get(offset..end)?.try_into().ok()
    }

    /// Bytes starting at `offset`.
    ///
    /// With a length the result is empty unless the whole range fits; with
    /// `None` it is the rest of the message (empty at or past the end).
    pub fn read_bytes(&self, offset: usize, len: Option<usize>) -> &[u8] {
        let bytes = self.buf.as_slice();
        let range = match len {
            Some(len) => offset.checked_add(len).and_then(|end| bytes.get(offset..end)),
            None => bytes.get(offset..),
        };
        range.unwrap_or(&[])
    }

    pub fn append_u8(&mut self, value: u8) -> usize {
        usize::from(self.buf.append(value))
    }

    pub fn append_u16(&mut self, value: u16) -> usize {
        self.buf.extend_from_slice(&value.to_le_bytes())
    }

    pub fn append_u32(&mut self, value: u32) -> usize {
        self.buf.extend_from_slice(&value.to_le_bytes())
    }

    pub fn append_u64(&mut self, value: u64) -> usize {
        self.buf.extend_from_slice(&value.to_le_bytes())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> usize {
        self.buf.extend_from_slice(bytes)
    }

    /// Append the X.25 checksum of the current contents (little-endian).
    pub fn append_crc16(&mut self) -> usize {
        let crc = crc::calc_x25(self.buf.as_slice());
        self.append_u16(crc)
    }

    /// Whether the trailing two bytes are a valid checksum of the rest.
    pub fn check_crc16(&self) -> bool {
        crc::check_x25(self.buf.as_slice())
    }

    /// Strip the CRC trailer. Does nothing (and returns `false`) on frames
    /// shorter than [`MIN_SIZE`].
    pub fn remove_crc16(&mut self) -> bool {
        if self.buf.len() < MIN_SIZE {
            return false;
        }
        self.buf.truncate_from_end(CRC_SIZE);
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Underlying buffer.
    pub fn buffer(&self) -> &BoundedBuffer {
        &self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut BoundedBuffer {
        &mut self.buf
    }

    /// Dash-separated hex dump of the contents.
    pub fn hex_string(&self) -> String {
        hex_string(self.as_bytes())
    }
}

impl From<BoundedBuffer> for WireMessage {
    fn from(buf: BoundedBuffer) -> Self {
        Self { buf }
    }
}

impl From<WireMessage> for BoundedBuffer {
    fn from(msg: WireMessage) -> Self {
        msg.buf
    }
}

impl AsRef<[u8]> for WireMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex_string())
    }
}

/// Lower-case hex, one dash between bytes: `01-0a-ff`.
pub fn hex_string(bytes: &[u8]) -> String {
    join_hex(bytes.iter())
}

/// Like [`hex_string`] with the byte order reversed, for little-endian
/// fields shown most significant byte first.
pub fn hex_string_lsb(bytes: &[u8]) -> String {
    join_hex(bytes.iter().rev())
}

fn join_hex<'a>(bytes: impl Iterator<Item = &'a u8>) -> String {
    let mut out = String::new();
    for (i, byte) in bytes.enumerate() {
        if i > 0 {
            out.push('-');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_report_sentinels() {
        let empty = WireMessage::new(8);
        assert_eq!(empty.endpoint_id(), INVALID_ID);
        assert_eq!(empty.message_id(), INVALID_ID);
        assert_eq!(empty.response_status(), INVALID_ID);
        assert_eq!(empty.payload_length(), None);
        assert_eq!(empty.response_payload_length(), None);

        let header_only = WireMessage::from_bytes(&[0x01, 0x02]);
        assert_eq!(header_only.endpoint_id(), 0x01);
        assert_eq!(header_only.message_id(), 0x02);
        assert_eq!(header_only.response_status(), INVALID_ID);
        assert_eq!(header_only.payload_length(), Some(0));
        assert_eq!(header_only.response_payload_length(), None);
    }

    #[test]
    fn new_request_resets_contents() {
        let mut msg = WireMessage::from_bytes(&[9, 9, 9, 9]);
        msg.new_request(0x01, 0x03);
        assert_eq!(msg.as_bytes(), &[0x01, 0x03]);
    }

    #[test]
    fn little_endian_accessors() {
        let mut msg = WireMessage::request(32, 0x01, 0x04);
        assert_eq!(msg.append_u8(0x00), 1);
        assert_eq!(msg.append_u16(0x1234), 2);
        assert_eq!(msg.append_u32(0xDEAD_BEEF), 4);
        assert_eq!(msg.append_u64(0x0102_0304_0506_0708), 8);

        assert_eq!(msg.response_status(), 0x00);
        assert_eq!(msg.read_u16(3), 0x1234);
        assert_eq!(msg.read_bytes(3, Some(2)), &[0x34, 0x12]);
        assert_eq!(msg.read_u32(5), 0xDEAD_BEEF);
        assert_eq!(msg.read_u64(9), 0x0102_0304_0506_0708);
        assert_eq!(msg.response_payload_length(), Some(14));
    }

    #[test]
    fn reads_past_the_end_yield_zero() {
        let msg = WireMessage::from_bytes(&[1, 2, 3]);
        assert_eq!(msg.read_u8(3), 0);
        assert_eq!(msg.read_u16(2), 0);
        assert_eq!(msg.read_u32(0), 0);
        assert_eq!(msg.read_u64(usize::MAX), 0);
    }

    #[test]
    fn read_bytes_edges() {
        let msg = WireMessage::from_bytes(&[1, 2, 3, 4]);
        assert_eq!(msg.read_bytes(1, Some(3)), &[2, 3, 4]);
        assert!(msg.read_bytes(1, Some(4)).is_empty());
        assert_eq!(msg.read_bytes(2, None), &[3, 4]);
        assert!(msg.read_bytes(4, None).is_empty());
        assert!(msg.read_bytes(9, None).is_empty());
        assert!(msg.read_bytes(usize::MAX, Some(2)).is_empty());
    }

    #[test]
    fn appends_are_capped_at_capacity() {
        let mut msg = WireMessage::request(5, 0x01, 0x01);
        assert_eq!(msg.append_u32(0xAABB_CCDD), 3);
        assert_eq!(msg.as_bytes(), &[0x01, 0x01, 0xDD, 0xCC, 0xBB]);
        assert_eq!(msg.append_u8(1), 0);
        assert_eq!(msg.append_crc16(), 0);
    }

    #[test]
    fn ping_request_crc() {
        let mut msg = WireMessage::request(8, 0x01, 0x01);
        assert_eq!(msg.append_crc16(), 2);
        assert_eq!(msg.as_bytes(), &[0x01, 0x01, 0x16, 0x07]);
        assert!(msg.check_crc16());

        assert!(msg.remove_crc16());
        assert_eq!(msg.as_bytes(), &[0x01, 0x01]);
        assert_eq!(msg.payload_length(), Some(0));
    }

    #[test]
    fn crc_detects_corruption() {
        let mut msg = WireMessage::request(16, 0x02, 0x10);
        msg.append_bytes(b"payload");
        msg.append_crc16();

        for index in 0..msg.len() {
            let mut corrupted = msg.clone();
            corrupted.buffer_mut().as_mut_slice()[index] ^= 0x01;
            assert!(!corrupted.check_crc16());
        }
    }

    #[test]
    fn remove_crc16_needs_minimum_size() {
        let mut msg = WireMessage::from_bytes(&[1, 2, 3]);
        assert!(!msg.remove_crc16());
        assert_eq!(msg.len(), 3);
    }

    #[test]
    fn hex_helpers() {
        assert_eq!(hex_string(&[0x01, 0x0A, 0xFF]), "01-0a-ff");
        assert_eq!(hex_string_lsb(&[0x01, 0x0A, 0xFF]), "ff-0a-01");
        assert_eq!(hex_string(&[]), "");
        assert_eq!(WireMessage::from_bytes(&[0xC0, 0xDB]).to_string(), "c0-db");
    }

    #[test]
    fn equality_follows_contents() {
        let mut msg = WireMessage::request(16, 0x01, 0x01);
        msg.append_crc16();
        assert_eq!(msg.clone(), msg);

        assert!(msg.remove_crc16());
        assert_eq!(msg, WireMessage::from_bytes(&[0x01, 0x01]));
    }
}
