//! Shared test utilities: in-memory serial links and syscon answer builders.

#![allow(dead_code)]

use std::collections::VecDeque;

use syscon_uart_core::auth::crypto::encrypt_cbc;
use syscon_uart_core::auth::handshake::{AUTH_BODY_SIZE, AUTH_MESSAGE_SIZE};
use syscon_uart_core::auth::{AuthKeys, KEY_SIZE};
use syscon_uart_core::protocol::checksum;
use syscon_uart_core::protocol::{ProtocolError, SerialLink, Session, SessionConfig, WireVariant};

/// Link that records every write and replays queued answers, one per read
#[derive(Debug, Default)]
pub struct ScriptedLink {
    pub writes: Vec<Vec<u8>>,
    pub reads: usize,
    answers: VecDeque<Vec<u8>>,
    fallback: Option<Vec<u8>>,
    fail_writes: bool,
    fail_reads: bool,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers<I, A>(answers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Answer every read with `answer` once the queue is empty
    pub fn answering_always(mut self, answer: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some(answer.into());
        self
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Accepts writes, then fails every read
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// All writes joined together, as text
    pub fn written_text(&self) -> String {
        String::from_utf8(self.writes.concat()).unwrap()
    }

    /// Writes joined into logical command lines, split on `\r\n`
    pub fn command_lines(&self) -> Vec<String> {
        self.written_text()
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }
}

impl SerialLink for ScriptedLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if self.fail_writes {
            return Err(ProtocolError::SerialError("write failed".to_string()));
        }
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(ProtocolError::SerialError("read failed".to_string()));
        }
        Ok(self
            .answers
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_default())
    }
}

/// CXR peer that acknowledges every complete command with a fixed status
#[derive(Debug, Default)]
pub struct EchoPeer {
    pub status: u32,
    pub writes: Vec<Vec<u8>>,
    pending: Vec<u8>,
}

impl EchoPeer {
    pub fn with_status(status: u32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

impl SerialLink for EchoPeer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.writes.push(data.to_vec());
        self.pending.extend_from_slice(data);
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, ProtocolError> {
        if !self.pending.ends_with(b"\r\n") {
            return Ok(Vec::new());
        }
        self.pending.clear();
        Ok(cxr_answer("R", &format!("OK {:08X}", self.status)))
    }
}

/// Session with zero waits so tests never sleep
pub fn session<L: SerialLink>(link: L, variant: WireVariant) -> Session<L> {
    let config = SessionConfig {
        command_wait_ms: 0,
        ..SessionConfig::new("", variant)
    };
    Session::with_config(link, config)
}

fn checksum_hex(text: &str) -> String {
    checksum::format(checksum::checksum(text.as_bytes()))
}

/// `<magic>:<XX>:<body>\r\n`
pub fn cxr_answer(magic: &str, body: &str) -> Vec<u8> {
    format!("{}:{}:{}\r\n", magic, checksum_hex(body), body).into_bytes()
}

/// `<text>:<XX>\r\n`
pub fn sw_line(text: &str) -> String {
    format!("{}:{}\r\n", text, checksum_hex(text))
}

/// AUTH1 response plaintext carrying `nonce`
pub fn auth1_plaintext(keys: &AuthKeys, nonce: [u8; 8]) -> [u8; AUTH_BODY_SIZE] {
    let mut plaintext = [0u8; AUTH_BODY_SIZE];
    plaintext[..8].copy_from_slice(&nonce);
    plaintext[0x10..0x20].copy_from_slice(&keys.reference);
    plaintext
}

/// Encrypted AUTH1 response behind `header`
pub fn auth1_challenge(
    keys: &AuthKeys,
    header: &[u8; KEY_SIZE],
    plaintext: &[u8; AUTH_BODY_SIZE],
) -> [u8; AUTH_MESSAGE_SIZE] {
    let body = encrypt_cbc(&keys.device_to_host, &keys.iv, plaintext).unwrap();
    let mut challenge = [0u8; AUTH_MESSAGE_SIZE];
    challenge[..KEY_SIZE].copy_from_slice(header);
    challenge[KEY_SIZE..].copy_from_slice(&body);
    challenge
}

/// Valid AUTH1 response for the retail keys
pub fn valid_challenge(nonce: [u8; 8]) -> [u8; AUTH_MESSAGE_SIZE] {
    let keys = AuthKeys::SYSCON;
    auth1_challenge(&keys, &keys.auth1_response_header, &auth1_plaintext(&keys, nonce))
}
