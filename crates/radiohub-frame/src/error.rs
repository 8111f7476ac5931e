use std::time::Duration;

/// Errors that can occur while moving frames over a transport.
///
/// Protocol-level problems (bad escapes, CRC mismatches, short payloads)
/// are not errors: those frames are dropped and the stream resynchronises.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The underlying transport failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] radiohub_transport::TransportError),

    /// The message (with its CRC) exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The transport ran dry before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The transport did not accept the whole frame in time.
    #[error("write stalled after {written} of {total} bytes ({timeout:?})")]
    WriteTimeout {
        written: usize,
        total: usize,
        timeout: Duration,
    },
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(radiohub_transport::TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
