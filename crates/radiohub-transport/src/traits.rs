use crate::error::Result;

/// Readable half of a serial link.
///
/// Mirrors the polled-driver model: callers ask how many bytes are waiting,
/// then read at most that many. A source that cannot tell ahead of time may
/// report the size of whatever it has buffered internally.
pub trait ByteSource {
    /// Number of bytes that can be read right now without waiting.
    fn available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes. Returns the number of bytes copied,
    /// `0` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Writable half of a serial link.
pub trait ByteSink {
    /// Number of bytes the sink can accept right now.
    fn available_for_write(&mut self) -> Result<usize>;

    /// Write up to `buf.len()` bytes. Returns how many were accepted, which
    /// may be fewer than requested.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush any bytes held by the sink.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn available_for_write(&mut self) -> Result<usize> {
        (**self).available_for_write()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn available_for_write(&mut self) -> Result<usize> {
        (**self).available_for_write()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
