use std::sync::{Arc, Mutex, MutexGuard};

use bytes::{Buf, BytesMut};

use crate::error::Result;
use crate::traits::{ByteSink, ByteSource};

type Queue = Arc<Mutex<BytesMut>>;

/// In-memory duplex port.
///
/// A port reads from its receive queue and writes into its transmit queue.
/// Clones share both queues, so a test can keep one handle to inject bytes
/// "from the radio" and inspect what the stack transmitted while another
/// handle is owned by the code under test.
#[derive(Debug, Clone)]
pub struct MemoryPort {
    rx: Queue,
    tx: Queue,
    write_window: Option<usize>,
    stalled_polls: usize,
}

impl MemoryPort {
    /// Create a port with independent receive and transmit queues.
    pub fn new() -> Self {
        Self {
            rx: Queue::default(),
            tx: Queue::default(),
            write_window: None,
            stalled_polls: 0,
        }
    }

    /// Create two ports wired back to back: what one writes the other reads.
    pub fn pair() -> (Self, Self) {
        let left_to_right = Queue::default();
        let right_to_left = Queue::default();
        let left = Self {
            rx: Arc::clone(&right_to_left),
            tx: Arc::clone(&left_to_right),
            write_window: None,
            stalled_polls: 0,
        };
        let right = Self {
            rx: left_to_right,
            tx: right_to_left,
            write_window: None,
            stalled_polls: 0,
        };
        (left, right)
    }

    /// Limit how many bytes a single write accepts.
    pub fn with_write_window(mut self, window: usize) -> Self {
        self.write_window = Some(window.max(1));
        self
    }

    /// Report no writable space for the next `polls` calls to
    /// `available_for_write`.
    pub fn stall_writes(&mut self, polls: usize) {
        self.stalled_polls = polls;
    }

    /// Queue bytes to be read by this port.
    pub fn push_rx(&self, bytes: &[u8]) {
        lock(&self.rx).extend_from_slice(bytes);
    }

    /// Drain everything this port has transmitted so far.
    pub fn take_tx(&self) -> Vec<u8> {
        lock(&self.tx).split().to_vec()
    }

    /// Number of transmitted bytes not yet taken.
    pub fn tx_len(&self) -> usize {
        lock(&self.tx).len()
    }

    /// Number of received bytes not yet read.
    pub fn rx_len(&self) -> usize {
        lock(&self.rx).len()
    }
}

impl Default for MemoryPort {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for MemoryPort {
    fn available(&mut self) -> Result<usize> {
        Ok(self.rx_len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut rx = lock(&self.rx);
        let n = rx.len().min(buf.len());
        buf[..n].copy_from_slice(&rx[..n]);
        rx.advance(n);
        Ok(n)
    }
}

impl ByteSink for MemoryPort {
    fn available_for_write(&mut self) -> Result<usize> {
        if self.stalled_polls > 0 {
            self.stalled_polls -= 1;
            return Ok(0);
        }
        Ok(self.write_window.unwrap_or(usize::MAX))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = buf.len().min(self.write_window.unwrap_or(usize::MAX));
        lock(&self.tx).extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

fn lock(queue: &Queue) -> MutexGuard<'_, BytesMut> {
    // A panic while holding the lock cannot leave a BytesMut half-updated.
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
