//! Host-side protocol stack for radio modules on a serial link.
//!
//! Messages travel as SLIP frames with a CRC16 (X.25) trailer. Each message
//! starts with an endpoint id and a message id; received messages are
//! routed to the endpoint registered under that id, which decodes the
//! payload into key/value records.
//!
//! # Crate Structure
//!
//! - [`transport`] - Serial port abstraction and in-memory test port
//! - [`frame`] - Buffers, CRC16, wire messages, key/value store, SLIP
//! - [`endpoint`] - Endpoint trait, message tables and the dispatch registry
//! - [`hub`] - [`hub::RadioHub`], owner of both directions of a link
//! - [`device`] - Reference device-management endpoint (endpoint `0x01`)

/// Re-export transport types.
pub mod transport {
    pub use radiohub_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use radiohub_frame::*;
}

/// Re-export endpoint types.
pub mod endpoint {
    pub use radiohub_endpoint::*;
}

/// Re-export hub types.
pub mod hub {
    pub use radiohub_hub::*;
}

pub mod device;
