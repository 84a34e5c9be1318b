//! Serial Protocol Communication
//!
//! Implements the syscon UART command protocol.
//!
//! Three wire variants share one command model: an ASCII command line goes
//! out, and the answer comes back as a status code plus string tokens.

pub mod checksum;
mod config;
mod error;
pub mod frame;
pub mod serial;
mod session;

pub use config::SessionConfig;
pub use error::ProtocolError;
pub use frame::{CommandResult, FrameCodec, FrameError, WireVariant, LOCAL_ERROR_STATUS};
pub use serial::{list_ports, open_port, PortInfo};
pub use session::{SerialLink, Session};

/// Default time to wait for an answer after a command, in milliseconds
pub const DEFAULT_COMMAND_WAIT_MS: u64 = 1000;

/// Default serial read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
