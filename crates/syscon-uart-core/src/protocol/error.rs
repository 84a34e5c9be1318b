//! Protocol errors

use thiserror::Error;

/// Transport faults. Any of these ends the session.
///
/// Malformed answers are not reported here; they come back as a
/// [`CommandResult`](super::CommandResult) carrying the local error status.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for ProtocolError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(err.to_string()),
            _ => ProtocolError::SerialError(err.to_string()),
        }
    }
}
