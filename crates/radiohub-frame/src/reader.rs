use std::collections::VecDeque;

use radiohub_transport::ByteSource;
use tracing::{debug, trace};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::message::WireMessage;
use crate::slip::{SlipDecoder, SlipState};

/// Pulls bytes from a [`ByteSource`] and splits them into SLIP frames.
///
/// Frames are handed out raw: the CRC trailer is still attached and has not
/// been checked. Receive storage is sized once from
/// [`FrameConfig::max_message_size`].
pub struct FrameReader<S> {
    inner: S,
    decoder: SlipDecoder,
    rx: WireMessage,
    chunk: Box<[u8]>,
    pending: VecDeque<WireMessage>,
    config: FrameConfig,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: S, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: SlipDecoder::new(),
            rx: WireMessage::new(config.max_message_size),
            chunk: vec![0u8; config.read_chunk_size.max(1)].into_boxed_slice(),
            pending: VecDeque::new(),
            config,
        }
    }

    /// Read whatever the source has ready and run `on_frame` for each
    /// completed frame. Never waits for more input.
    ///
    /// Returns the number of bytes consumed.
    pub fn poll<F>(&mut self, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(&mut WireMessage),
    {
        while let Some(mut frame) = self.pending.pop_front() {
            on_frame(&mut frame);
        }

        let mut consumed = 0;
        loop {
            let available = self.inner.available()?;
            if available == 0 {
                break;
            }
            let want = available.min(self.chunk.len());
            let read = self.inner.read(&mut self.chunk[..want])?;
            if read == 0 {
                break;
            }
            consumed += read;
            self.decoder
                .decode(&self.chunk[..read], &mut self.rx, |frame| {
                    trace!(len = frame.len(), frame = %frame, "frame received");
                    on_frame(frame);
                });
        }
        Ok(consumed)
    }

    /// Decode bytes that arrived by some other route (an interrupt handler,
    /// a test, a file).
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_frame: F)
    where
        F: FnMut(&mut WireMessage),
    {
        self.decoder.decode(bytes, &mut self.rx, |frame| {
            trace!(len = frame.len(), frame = %frame, "frame received");
            on_frame(frame);
        });
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the source has
    /// nothing more to give.
    pub fn read_frame(&mut self) -> Result<WireMessage> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }

            let read = self.inner.read(&mut self.chunk)?;
            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            let pending = &mut self.pending;
            self.decoder
                .decode(&self.chunk[..read], &mut self.rx, |frame| {
                    trace!(len = frame.len(), frame = %frame, "frame received");
                    pending.push_back(frame.clone());
                });
        }
    }

    /// Drop any partial or queued frame and wait for the next frame start.
    pub fn reset(&mut self) {
        debug!(state = ?self.decoder.state(), queued = self.pending.len(), "frame reader reset");
        self.decoder.reset();
        self.rx.clear();
        self.pending.clear();
    }

    /// Current deframer state.
    pub fn state(&self) -> SlipState {
        self.decoder.state()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use radiohub_transport::{MemoryPort, TransportError};

    use super::*;
    use crate::slip::{encode, END};

    fn wire_for(frames: &[&[u8]]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for frame in frames {
            encode(frame, &mut wire);
        }
        wire.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let port = MemoryPort::new();
        port.push_rx(&[0xC0, 0x01, 0x01, 0x16, 0x07, 0xC0]);

        let mut reader = FrameReader::new(port);
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.as_bytes(), &[0x01, 0x01, 0x16, 0x07]);
        assert!(frame.check_crc16());
    }

    #[test]
    fn read_multiple_frames() {
        let port = MemoryPort::new();
        port.push_rx(&wire_for(&[b"one", b"two", b"three"]));

        let mut reader = FrameReader::new(port);
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"one");
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"two");
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"three");
    }

    #[test]
    fn partial_read_handling() {
        let reader = ByteByByteSource {
            bytes: wire_for(&[b"slow"]),
            pos: 0,
        };
        let mut reader = FrameReader::new(reader);
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(MemoryPort::new());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let port = MemoryPort::new();
        port.push_rx(&[END, 0x01, 0x02]);

        let mut reader = FrameReader::new(port);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.state(), SlipState::InFrame);
    }

    #[test]
    fn poll_delivers_frames_as_bytes_arrive() {
        let port = MemoryPort::new();
        let probe = port.clone();
        let mut reader = FrameReader::new(port);
        let mut frames = Vec::new();

        let wire = wire_for(&[b"split"]);
        probe.push_rx(&wire[..3]);
        let consumed = reader.poll(|f| frames.push(f.as_bytes().to_vec())).unwrap();
        assert_eq!(consumed, 3);
        assert!(frames.is_empty());

        probe.push_rx(&wire[3..]);
        reader.poll(|f| frames.push(f.as_bytes().to_vec())).unwrap();
        assert_eq!(frames, vec![b"split".to_vec()]);
        assert_eq!(probe.rx_len(), 0);
    }

    #[test]
    fn poll_reads_in_chunks() {
        let port = MemoryPort::new();
        let payload = [0x55u8; 200];
        port.push_rx(&wire_for(&[&payload]));

        let cfg = FrameConfig {
            read_chunk_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(port, cfg);
        let mut frames = Vec::new();
        let consumed = reader.poll(|f| frames.push(f.len())).unwrap();
        assert_eq!(consumed, 202);
        assert_eq!(frames, vec![200]);
    }

    #[test]
    fn oversized_frame_is_truncated_to_max_message_size() {
        let port = MemoryPort::new();
        port.push_rx(&wire_for(&[&[0xAB; 40]]));

        let cfg = FrameConfig {
            max_message_size: 8,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(port, cfg);
        assert_eq!(reader.read_frame().unwrap().len(), 8);
    }

    #[test]
    fn feed_shares_the_deframer() {
        let mut reader = FrameReader::new(MemoryPort::new());
        let mut frames = Vec::new();
        reader.feed(&[END, 0x01], |f| frames.push(f.as_bytes().to_vec()));
        reader.feed(&[0x02, END], |f| frames.push(f.as_bytes().to_vec()));
        assert_eq!(frames, vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn reset_drops_partial_and_queued_frames() {
        let port = MemoryPort::new();
        port.push_rx(&wire_for(&[b"a", b"b"]));
        let mut reader = FrameReader::new(port.clone());
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"a");

        reader.reset();
        assert_eq!(reader.state(), SlipState::Idle);

        port.push_rx(&[0x01, 0x02, END]);
        port.push_rx(&wire_for(&[b"c"]));
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"c");
    }

    #[test]
    fn transport_errors_propagate() {
        let mut reader = FrameReader::new(FailingSource);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Closed)
        ));
        assert!(reader.poll(|_| {}).is_err());
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(MemoryPort::new());

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().max_message_size, 256);
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteSource {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl ByteSource for ByteByByteSource {
        fn available(&mut self) -> radiohub_transport::Result<usize> {
            Ok(usize::from(self.pos < self.bytes.len()))
        }

        fn read(&mut self, buf: &mut [u8]) -> radiohub_transport::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn available(&mut self) -> radiohub_transport::Result<usize> {
            Err(TransportError::Closed)
        }

        fn read(&mut self, _buf: &mut [u8]) -> radiohub_transport::Result<usize> {
            Err(TransportError::Closed)
        }
    }
}
