use std::fmt;
use std::io;

use radiohub_frame::FrameError;
use radiohub_hub::HubError;
use radiohub_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::MessageTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::WriteTimeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn hub_error(context: &str, err: HubError) -> CliError {
    match err {
        HubError::Transport(err) => transport_error(context, err),
        HubError::Frame(err) => frame_error(context, err),
        HubError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[test]
    fn missing_device_is_a_transport_error() {
        let err = TransportError::Open {
            path: PathBuf::from("/dev/ttyMISSING"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let cli = hub_error("open failed", HubError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("open failed: "));
    }

    #[test]
    fn timeouts_map_to_124() {
        let cli = hub_error("wait failed", HubError::Timeout(Duration::from_millis(10)));
        assert_eq!(cli.code, TIMEOUT);

        let cli = frame_error(
            "send failed",
            FrameError::WriteTimeout {
                written: 0,
                total: 6,
                timeout: Duration::from_millis(10),
            },
        );
        assert_eq!(cli.code, TIMEOUT);
    }

    #[test]
    fn oversized_message_is_invalid_data() {
        let cli = frame_error("send failed", FrameError::MessageTooLarge { size: 300, max: 256 });
        assert_eq!(cli.code, DATA_INVALID);
    }
}
