use std::time::Duration;

/// Default receive buffer size, and the largest frame accepted for sending.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256;

/// Default number of bytes pulled from the transport per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64;

/// Frame reader/writer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Capacity of the receive message and upper bound for outbound frames
    /// (header, payload and CRC; SLIP escaping not counted).
    pub max_message_size: usize,
    /// Extra `END` bytes sent ahead of each frame to wake a sleeping module.
    pub wakeup_bytes: usize,
    /// Give up draining a frame when the transport makes no room for this long.
    /// `None` waits forever.
    pub write_timeout: Option<Duration>,
    /// Scratch size for each transport read.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            wakeup_bytes: 0,
            write_timeout: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
