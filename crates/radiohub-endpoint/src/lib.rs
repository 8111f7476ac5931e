//! Endpoint registry for the radio module protocol.
//!
//! Each endpoint owns a 1-byte id and a table mapping message ids to a name
//! and a payload decoder. The registry checks a frame's CRC, finds the
//! endpoint named in its header and lets it turn the payload into
//! key/value records.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use endpoint::{DecodeFn, Endpoint, MessageEntry, MessageTable, TableEndpoint, ERROR_KEY, EVENT_KEY};
pub use error::{EndpointError, Result};
pub use registry::{DispatchOutcome, EndpointRegistry};
