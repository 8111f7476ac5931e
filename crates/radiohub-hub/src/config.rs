use radiohub_endpoint::RegistryConfig;
use radiohub_frame::FrameConfig;

/// Hub configuration: framing on the wire and endpoint dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubConfig {
    pub frame: FrameConfig,
    pub registry: RegistryConfig,
}

impl HubConfig {
    /// Send `wakeup_bytes` extra frame delimiters ahead of every request.
    pub fn with_wakeup_bytes(mut self, wakeup_bytes: usize) -> Self {
        self.frame.wakeup_bytes = wakeup_bytes;
        self
    }
}
