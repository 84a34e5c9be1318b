//! Session configuration
//!
//! Stored as JSON so a bench setup can be reused between runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use super::{WireVariant, DEFAULT_COMMAND_WAIT_MS, DEFAULT_READ_TIMEOUT_MS};

/// Serial session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Wire variant spoken by the syscon
    pub variant: WireVariant,
    /// Time to wait for an answer after each command, in milliseconds
    pub command_wait_ms: u64,
    /// Read timeout of the underlying port, in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            variant: WireVariant::Cxr,
            command_wait_ms: DEFAULT_COMMAND_WAIT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// Configuration for `port_name` with default timing
    pub fn new(port_name: impl Into<String>, variant: WireVariant) -> Self {
        Self {
            port_name: port_name.into(),
            variant,
            ..Self::default()
        }
    }

    /// Baud rate implied by the wire variant
    pub fn baud_rate(&self) -> u32 {
        self.variant.baud_rate()
    }

    /// Per-command answer wait
    pub fn command_wait(&self) -> Duration {
        Duration::from_millis(self.command_wait_ms)
    }

    /// Port read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}
