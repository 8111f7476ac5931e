//! Byte source / byte sink transport abstraction.
//!
//! The protocol layers above never talk to a serial driver directly. They
//! only need two capabilities:
//! - a [`ByteSource`] that reports how many bytes are readable and reads them
//! - a [`ByteSink`] that reports how much space is writable and writes into it
//!
//! Each host environment implements these once. [`IoPort`] adapts any
//! already-configured `Read + Write` stream (a tty opened as a file, a pipe,
//! a socket); [`MemoryPort`] is an in-process loopback for tests and demos.

pub mod error;
pub mod memory;
pub mod port;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryPort;
pub use port::{open_device, IoPort, DEFAULT_WRITE_WINDOW};
pub use traits::{ByteSink, ByteSource};
