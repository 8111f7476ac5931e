use std::time::Duration;

/// Errors that can occur in hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] radiohub_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] radiohub_frame::FrameError),

    /// Endpoint registration error.
    #[error("endpoint error: {0}")]
    Endpoint(#[from] radiohub_endpoint::EndpointError),

    /// No decoded event arrived in time.
    #[error("no event received within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, HubError>;
