//! Host-side hub for a radio module on a serial link.
//!
//! [`RadioHub`] owns the receive path (port, SLIP deframer, endpoint
//! registry) and the transmit path (CRC, SLIP encoder, drain loop).
//! Decoded messages are delivered to a [`HubClient`] as key/value records.

pub mod config;
pub mod error;
pub mod hub;

pub use config::HubConfig;
pub use error::{HubError, Result};
pub use hub::{open, HubClient, RadioHub};
