/// Errors that can occur while setting up the endpoint registry.
///
/// Dispatching a frame never fails; see `DispatchOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Another endpoint already uses this id.
    #[error("endpoint 0x{0:02x} is already registered")]
    DuplicateEndpoint(u8),

    /// The configured endpoint limit was reached.
    #[error("endpoint registry full (max {max})")]
    RegistryFull { max: usize },
}

pub type Result<T> = std::result::Result<T, EndpointError>;
