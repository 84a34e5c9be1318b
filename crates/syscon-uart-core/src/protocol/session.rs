//! Transport session
//!
//! Owns the serial link and runs one command at a time: write the encoded
//! frames, wait a fixed window, read whatever arrived, decode it.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    open_port, CommandResult, FrameCodec, FrameError, ProtocolError, SessionConfig, WireVariant,
};
use crate::auth::{AuthError, AuthKeys, Handshake};

/// Byte transport underneath a [`Session`]
pub trait SerialLink {
    /// Write all of `data`
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Everything received since the previous call, possibly nothing
    fn read_available(&mut self) -> Result<Vec<u8>, ProtocolError>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.write_all(data)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        self.flush()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }

    fn read_available(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let available = self.bytes_to_read()? as usize;
        let mut buffer = vec![0u8; available];
        if available > 0 {
            self.read_exact(&mut buffer)
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        }
        Ok(buffer)
    }
}

/// Command session with one syscon
pub struct Session<L: SerialLink> {
    /// Exclusively owned transport
    link: L,
    /// Variant, timing and port settings
    config: SessionConfig,
    /// Set once the AUTH1/AUTH2 handshake has succeeded
    authenticated: bool,
}

impl Session<Box<dyn SerialPort>> {
    /// Open the configured serial port and start a session on it
    pub fn open(config: &SessionConfig) -> Result<Self, ProtocolError> {
        let port = open_port(config)?;
        Ok(Self::with_config(port, config.clone()))
    }
}

impl<L: SerialLink> Session<L> {
    /// Start a session on `link` with default timing
    pub fn new(link: L, variant: WireVariant) -> Self {
        Self::with_config(
            link,
            SessionConfig {
                variant,
                ..SessionConfig::default()
            },
        )
    }

    /// Start a session on `link`; the wire variant comes from `config`
    pub fn with_config(link: L, config: SessionConfig) -> Self {
        Self {
            link,
            config,
            authenticated: false,
        }
    }

    /// Wire variant of this session
    pub fn variant(&self) -> WireVariant {
        self.config.variant
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True once [`auth`](Self::auth) has succeeded
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Underlying link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Underlying link, mutably
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Close the session and hand back the link
    pub fn into_link(self) -> L {
        self.link
    }

    /// Write raw bytes
    pub fn send(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        debug!(bytes = data.len(), frame = %data.escape_ascii(), "tx");
        self.link.write_bytes(data)
    }

    /// Bytes received since the last call
    pub fn receive(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let data = self.link.read_available()?;
        debug!(bytes = data.len(), frame = %data.escape_ascii(), "rx");
        Ok(data)
    }

    /// Send `text`, wait `wait`, and decode the answer.
    ///
    /// Only transport faults are returned as errors. A malformed answer
    /// yields a result with [`LOCAL_ERROR_STATUS`](super::LOCAL_ERROR_STATUS)
    /// and the diagnostic as its single token. Nothing is retried.
    pub fn command(&mut self, text: &str, wait: Duration) -> Result<CommandResult, ProtocolError> {
        if let Some(rejected) = self.submit(text)? {
            return Ok(rejected);
        }
        self.collect(wait)
    }

    /// Write the frames for `text`, priming first where the variant needs it.
    ///
    /// Returns the local error result instead of writing when priming was
    /// rejected. Pair with [`collect`](Self::collect).
    pub fn submit(&mut self, text: &str) -> Result<Option<CommandResult>, ProtocolError> {
        let variant = self.variant();

        if let Some(priming) = variant.priming_command(text) {
            let primed = self.command(priming, self.config.command_wait())?;
            if primed.status != 0 {
                warn!(status = primed.status, "{} rejected", priming);
                return Ok(Some(CommandResult::local_error(FrameError::Setcmdlong)));
            }
        }

        debug!(%variant, command = text, "command");
        for frame in variant.encode(text) {
            self.send(&frame)?;
        }
        Ok(None)
    }

    /// Wait `wait`, then read and decode the answer to the last submitted command
    pub fn collect(&mut self, wait: Duration) -> Result<CommandResult, ProtocolError> {
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        let answer = self.receive()?;
        match self.variant().decode(&answer) {
            Ok(result) => {
                debug!(status = result.status, tokens = result.tokens.len(), "answer");
                Ok(result)
            }
            Err(err) => {
                warn!("local protocol error: {}", err);
                Ok(CommandResult::local_error(err))
            }
        }
    }

    /// Authenticate with the compiled-in syscon keys.
    ///
    /// Does nothing if the session is already authenticated.
    pub fn auth(&mut self) -> Result<(), AuthError> {
        let mut handshake = Handshake::new(&AuthKeys::SYSCON);
        self.run_handshake(&mut handshake)
    }

    /// Authenticate using a caller-supplied handshake, which keeps its
    /// state history for inspection afterwards.
    pub fn run_handshake(&mut self, handshake: &mut Handshake<'_>) -> Result<(), AuthError> {
        if self.authenticated {
            return Ok(());
        }
        handshake.run(self)?;
        self.authenticated = true;
        Ok(())
    }
}
