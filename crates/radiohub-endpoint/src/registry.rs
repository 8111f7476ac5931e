use std::collections::HashMap;
use std::fmt;

use radiohub_frame::{KeyValueStore, WireMessage};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::endpoint::Endpoint;
use crate::error::{EndpointError, Result};

/// What happened to a frame handed to [`EndpointRegistry::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The result store holds the decoded records.
    Decoded,
    /// The frame's CRC did not verify. The frame is left untouched.
    CrcMismatch,
    /// No endpoint is registered under this id.
    UnknownEndpoint(u8),
    /// The endpoint's decoder rejected the payload (too short).
    Malformed { endpoint: u8, message: u8 },
}

impl DispatchOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoded => f.write_str("decoded"),
            Self::CrcMismatch => f.write_str("crc mismatch"),
            Self::UnknownEndpoint(id) => write!(f, "unknown endpoint 0x{id:02x}"),
            Self::Malformed { endpoint, message } => {
                write!(f, "malformed payload (endpoint 0x{endpoint:02x}, message 0x{message:02x})")
            }
        }
    }
}

/// Endpoint-id keyed set of protocol collaborators.
///
/// Endpoints are registered during startup and never removed.
pub struct EndpointRegistry {
    endpoints: HashMap<u8, Box<dyn Endpoint>>,
    config: RegistryConfig,
}

impl EndpointRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            endpoints: HashMap::new(),
            config,
        }
    }

    /// Register an endpoint under its own id.
    pub fn register<E: Endpoint + 'static>(&mut self, endpoint: E) -> Result<()> {
        self.register_boxed(Box::new(endpoint))
    }

    pub fn register_boxed(&mut self, endpoint: Box<dyn Endpoint>) -> Result<()> {
        let id = endpoint.id();
        let existing = self.endpoints.contains_key(&id);
        if existing && !self.config.replace_existing {
            return Err(EndpointError::DuplicateEndpoint(id));
        }
        if !existing && self.endpoints.len() >= self.config.max_endpoints {
            return Err(EndpointError::RegistryFull {
                max: self.config.max_endpoints,
            });
        }

        debug!(
            endpoint = id,
            name = endpoint.name(),
            messages = endpoint.table().len(),
            replaced = existing,
            "endpoint registered"
        );
        self.endpoints.insert(id, endpoint);
        Ok(())
    }

    /// Check, strip and decode one raw frame.
    ///
    /// On a CRC mismatch `msg` is left as received; otherwise the CRC
    /// trailer has been removed when this returns.
    pub fn dispatch(&self, msg: &mut WireMessage, result: &mut KeyValueStore) -> DispatchOutcome {
        if !msg.check_crc16() {
            return DispatchOutcome::CrcMismatch;
        }
        // Frames shorter than header plus CRC keep their trailer, so the
        // header is read from the CRC bytes.
        msg.remove_crc16();

        let endpoint_id = msg.endpoint_id();
        let Some(endpoint) = self.endpoints.get(&endpoint_id) else {
            return DispatchOutcome::UnknownEndpoint(endpoint_id);
        };

        if endpoint.decode(msg, result) {
            DispatchOutcome::Decoded
        } else {
            DispatchOutcome::Malformed {
                endpoint: endpoint_id,
                message: msg.message_id(),
            }
        }
    }

    /// Fresh result store sized from the config.
    pub fn result_store(&self) -> KeyValueStore {
        KeyValueStore::new(self.config.result_capacity)
    }

    pub fn get(&self, id: u8) -> Option<&dyn Endpoint> {
        self.endpoints.get(&id).map(|endpoint| endpoint.as_ref())
    }

    pub fn has_endpoint(&self, id: u8) -> bool {
        self.endpoints.contains_key(&id)
    }

    /// Registered endpoint ids in ascending order.
    pub fn endpoint_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.endpoints.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("endpoints", &self.endpoint_ids())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::endpoint::{MessageEntry, MessageTable, TableEndpoint, ERROR_KEY, EVENT_KEY};

    fn decode_status(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
        if msg.payload_length().unwrap_or(0) < 1 {
            return false;
        }
        let status = if msg.response_status() == 0 { "ok" } else { "error" };
        result.append("Status", status);
        true
    }

    fn device_endpoint() -> TableEndpoint {
        TableEndpoint::new(
            0x01,
            "Device Management",
            MessageTable::from_entries(&[
                MessageEntry::new(0x01, "Ping Request", |_, _| true),
                MessageEntry::new(0x02, "Ping Response", decode_status),
            ]),
        )
    }

    fn framed(bytes: &[u8]) -> WireMessage {
        let mut msg = WireMessage::new(bytes.len() + 2);
        msg.append_bytes(bytes);
        msg.append_crc16();
        msg
    }

    struct CountingEndpoint {
        table: MessageTable,
        calls: Rc<Cell<usize>>,
    }

    impl Endpoint for CountingEndpoint {
        fn id(&self) -> u8 {
            0x02
        }

        fn name(&self) -> &str {
            "Counting"
        }

        fn table(&self) -> &MessageTable {
            &self.table
        }

        fn decode(&self, _msg: &WireMessage, _result: &mut KeyValueStore) -> bool {
            self.calls.set(self.calls.get() + 1);
            true
        }
    }

    #[test]
    fn ping_request_is_decoded() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let mut msg = WireMessage::from_bytes(&[0x01, 0x01, 0x16, 0x07]);
        let mut result = registry.result_store();
        assert_eq!(registry.dispatch(&mut msg, &mut result), DispatchOutcome::Decoded);

        assert_eq!(msg.endpoint_id(), 0x01);
        assert_eq!(msg.message_id(), 0x01);
        assert_eq!(msg.payload_length(), Some(0));
        assert_eq!(result.get_str(EVENT_KEY).as_deref(), Some("Ping Request"));
    }

    #[test]
    fn response_fields_are_decoded() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let mut msg = framed(&[0x01, 0x02, 0x00]);
        let mut result = registry.result_store();
        assert!(registry.dispatch(&mut msg, &mut result).is_decoded());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["Event"], "Ping Response");
        assert_eq!(json["Status"], "ok");
    }

    #[test]
    fn crc_mismatch_is_not_decoded() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let mut msg = WireMessage::from_bytes(&[0x01, 0x01, 0x16, 0x08]);
        let mut result = registry.result_store();
        assert_eq!(registry.dispatch(&mut msg, &mut result), DispatchOutcome::CrcMismatch);
        assert_eq!(msg.len(), 4);
        assert!(result.is_empty());
    }

    #[test]
    fn unknown_endpoint_invokes_no_handler() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = EndpointRegistry::new();
        registry
            .register(CountingEndpoint {
                table: MessageTable::new(),
                calls: Rc::clone(&calls),
            })
            .unwrap();

        let mut msg = framed(&[0xFE, 0x01]);
        let mut result = registry.result_store();
        assert_eq!(
            registry.dispatch(&mut msg, &mut result),
            DispatchOutcome::UnknownEndpoint(0xFE)
        );
        assert_eq!(calls.get(), 0);
        assert!(result.is_empty());

        let mut msg = framed(&[0x02, 0x01]);
        assert!(registry.dispatch(&mut msg, &mut result).is_decoded());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn short_frames_keep_crc_as_header() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = EndpointRegistry::new();
        registry
            .register(CountingEndpoint {
                table: MessageTable::new(),
                calls: Rc::clone(&calls),
            })
            .unwrap();
        let mut result = registry.result_store();

        // CRC only: both checksum bytes become the header.
        let mut msg = framed(&[]);
        assert_eq!(msg.len(), 2);
        let crc_low = msg.as_bytes()[0];
        assert_eq!(
            registry.dispatch(&mut msg, &mut result),
            DispatchOutcome::UnknownEndpoint(crc_low)
        );
        assert_eq!(msg.len(), 2);

        // One header byte: the message id is the low CRC byte.
        let mut msg = framed(&[0x02]);
        let wire = msg.as_bytes().to_vec();
        assert_eq!(registry.dispatch(&mut msg, &mut result), DispatchOutcome::Decoded);
        assert_eq!(calls.get(), 1);
        assert_eq!(msg.as_bytes(), &wire[..]);
        assert_eq!(msg.endpoint_id(), 0x02);
        assert_eq!(msg.message_id(), wire[1]);
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let mut msg = framed(&[0x01, 0x02]);
        let mut result = registry.result_store();
        let outcome = registry.dispatch(&mut msg, &mut result);
        assert_eq!(
            outcome,
            DispatchOutcome::Malformed {
                endpoint: 0x01,
                message: 0x02
            }
        );
        assert!(!outcome.is_decoded());
    }

    #[test]
    fn unsupported_message_is_decoded_with_error() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let mut msg = framed(&[0x01, 0x7F, 0x00]);
        let mut result = registry.result_store();
        assert!(registry.dispatch(&mut msg, &mut result).is_decoded());
        assert_eq!(
            result.get_str(ERROR_KEY).as_deref(),
            Some("unsupported message id: 127 received")
        );
    }

    #[test]
    fn duplicate_endpoint_rejected() {
        let mut registry = EndpointRegistry::new();
        registry.register(device_endpoint()).unwrap();

        let err = registry.register(device_endpoint()).unwrap_err();
        assert!(matches!(err, EndpointError::DuplicateEndpoint(0x01)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_endpoint_replaced_when_configured() {
        let mut registry = EndpointRegistry::with_config(RegistryConfig {
            replace_existing: true,
            ..RegistryConfig::default()
        });
        registry.register(device_endpoint()).unwrap();
        registry
            .register(TableEndpoint::new(0x01, "Replacement", MessageTable::new()))
            .unwrap();

        assert_eq!(registry.get(0x01).map(|e| e.name()), Some("Replacement"));
    }

    #[test]
    fn registry_full_rejected() {
        let mut registry = EndpointRegistry::with_config(RegistryConfig {
            max_endpoints: 2,
            ..RegistryConfig::default()
        });
        registry.register(TableEndpoint::new(0x01, "a", MessageTable::new())).unwrap();
        registry.register(TableEndpoint::new(0x02, "b", MessageTable::new())).unwrap();

        let err = registry
            .register(TableEndpoint::new(0x03, "c", MessageTable::new()))
            .unwrap_err();
        assert!(matches!(err, EndpointError::RegistryFull { max: 2 }));
        assert_eq!(registry.endpoint_ids(), vec![0x01, 0x02]);
        assert!(registry.has_endpoint(0x02));
        assert!(!registry.has_endpoint(0x03));
    }

    #[test]
    fn outcome_display() {
        assert_eq!(DispatchOutcome::UnknownEndpoint(0xFE).to_string(), "unknown endpoint 0xfe");
        assert_eq!(DispatchOutcome::CrcMismatch.to_string(), "crc mismatch");
    }
}
