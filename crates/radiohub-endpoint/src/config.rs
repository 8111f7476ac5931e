use radiohub_frame::dict::DEFAULT_CAPACITY;

/// Controls endpoint registration and result storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Capacity of the key/value store handed to decoders.
    pub result_capacity: usize,
    /// Maximum number of endpoints that can be registered.
    pub max_endpoints: usize,
    /// When true, registering an id twice replaces the earlier endpoint
    /// instead of failing with `EndpointError::DuplicateEndpoint`.
    pub replace_existing: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            result_capacity: DEFAULT_CAPACITY,
            max_endpoints: 16,
            replace_existing: false,
        }
    }
}
