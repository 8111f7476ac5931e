use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

/// Default number of bytes reported as writable per call.
///
/// Matches the TX FIFO of the usual USB/UART bridges in front of the radio
/// module, so large frames are drained in several writes just like on the
/// embedded host.
pub const DEFAULT_WRITE_WINDOW: usize = 64;

const READ_CHUNK_SIZE: usize = 256;

/// Adapts any `Read + Write` stream to [`ByteSource`] and [`ByteSink`].
///
/// Std streams cannot report how many bytes are pending, so `available()`
/// performs one read into an internal buffer and reports its size. On a
/// blocking stream that call blocks until data arrives; streams configured
/// with a read timeout or non-blocking mode report `0` instead.
pub struct IoPort<T> {
    inner: T,
    rx: BytesMut,
    write_window: usize,
}

impl<T: Read + Write> IoPort<T> {
    /// Wrap a stream with the default write window.
    pub fn new(inner: T) -> Self {
        Self::with_write_window(inner, DEFAULT_WRITE_WINDOW)
    }

    /// Wrap a stream with an explicit write window (clamped to at least 1).
    pub fn with_write_window(inner: T, write_window: usize) -> Self {
        Self {
            inner,
            rx: BytesMut::with_capacity(READ_CHUNK_SIZE),
            write_window: write_window.max(1),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the port and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Pull one chunk from the stream into the receive buffer.
    ///
    /// Returns `Ok(0)` for end of stream, timeouts and `WouldBlock`.
    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    if n > 0 {
                        trace!(bytes = n, "port received");
                    }
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Read + Write> ByteSource for IoPort<T> {
    fn available(&mut self) -> Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        let n = self.rx.len().min(buf.len());
        buf[..n].copy_from_slice(&self.rx[..n]);
        self.rx.advance(n);
        Ok(n)
    }
}

impl<T: Read + Write> ByteSink for IoPort<T> {
    fn available_for_write(&mut self) -> Result<usize> {
        Ok(self.write_window)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(self.write_window);
        match self.inner.write(&buf[..len]) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl IoPort<File> {
    /// Open a second handle on the same device, e.g. to split reading and
    /// writing between two owners. The receive buffer is not shared.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::with_write_window(cloned, self.write_window))
    }
}

/// Open an already-configured device (tty, fifo, regular file) for reading
/// and writing.
///
/// Baud rate, parity and flow control are the caller's business; configure
/// the device before handing it to radiohub.
pub fn open_device(path: impl AsRef<Path>) -> Result<IoPort<File>> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(?path, "opened device");
    Ok(IoPort::new(file))
}

impl<T> std::fmt::Debug for IoPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoPort")
            .field("buffered", &self.rx.len())
            .field("write_window", &self.write_window)
            .finish()
    }
}
