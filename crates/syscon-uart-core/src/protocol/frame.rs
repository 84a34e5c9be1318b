//! Frame encoding/decoding
//!
//! Each wire variant frames the same ASCII command differently:
//!
//! - CXR:  `C:<XX>:<command>\r\n`, long commands split over several writes,
//!   answers as `R:<XX>:<body>` or `E:<XX>:<body>`
//! - SW:   `<command>:<XX>\r\n`, answers as one or more `<text>:<XX>` lines
//! - CXRF: `<command>\r\n`, answers are unstructured text
//!
//! `<XX>` is always the additive checksum of the command or answer text
//! only, never of the framing punctuation around it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::checksum;

/// Status reserved for local parse/protocol errors
pub const LOCAL_ERROR_STATUS: u32 = 0xFFFF_FFFF;

/// Command that unlocks commands of 64 bytes or more on the SW variant
pub const SETCMDLONG_COMMAND: &str = "SETCMDLONG FF FF";

/// SW commands at least this long need [`SETCMDLONG_COMMAND`] first
pub const SW_LONG_COMMAND_LEN: usize = 0x40;

/// Command bytes carried by the first CXR write
const CXR_FIRST_CHUNK: usize = 10;

/// Command bytes carried by each following CXR write
const CXR_CHUNK: usize = 15;

const LINE_END: &[u8] = b"\r\n";

/// Decoded answer to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Status reported by the peer, or [`LOCAL_ERROR_STATUS`]
    pub status: u32,
    /// Answer fields; a single diagnostic for local errors
    pub tokens: Vec<String>,
}

impl CommandResult {
    /// Create a result from a status and its tokens
    pub fn new(status: u32, tokens: Vec<String>) -> Self {
        Self { status, tokens }
    }

    /// Result describing a local decode failure
    pub fn local_error(err: FrameError) -> Self {
        Self {
            status: LOCAL_ERROR_STATUS,
            tokens: vec![err.to_string()],
        }
    }

    /// True if the answer could not be decoded locally
    pub fn is_local_error(&self) -> bool {
        self.status == LOCAL_ERROR_STATUS
    }

    /// True if the peer reported status 0
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    /// First token, if any
    pub fn first_token(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }
}

/// Local protocol errors. The message is the diagnostic token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Answer length")]
    AnswerLength,

    #[error("Magic")]
    Magic,

    #[error("Checksum")]
    Checksum,

    #[error("Data length")]
    DataLength,

    #[error("Setcmdlong")]
    Setcmdlong,

    #[error("Encoding")]
    Encoding,
}

/// Framing/timing profile of the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireVariant {
    /// CXR syscon, `C:`/`R:`/`E:` framed, 57600 baud
    Cxr,
    /// SW syscon, checksum-suffixed lines, 57600 baud
    Sw,
    /// CXRF syscon, raw lines, 115200 baud
    CxrF,
}

impl WireVariant {
    /// Baud rate used by this variant
    pub fn baud_rate(&self) -> u32 {
        match self {
            WireVariant::Cxr | WireVariant::Sw => 57600,
            WireVariant::CxrF => 115200,
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            WireVariant::Cxr => "cxr",
            WireVariant::Sw => "sw",
            WireVariant::CxrF => "cxrf",
        }
    }
}

impl fmt::Display for WireVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WireVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cxr" => Ok(WireVariant::Cxr),
            "sw" => Ok(WireVariant::Sw),
            "cxrf" => Ok(WireVariant::CxrF),
            other => Err(format!("unknown wire variant '{}'", other)),
        }
    }
}

/// Encoding of commands into physical writes and decoding of answers
pub trait FrameCodec {
    /// Encode a command into the writes that carry it, in order
    fn encode(&self, command: &str) -> Vec<Vec<u8>>;

    /// Decode everything read after a command
    fn decode(&self, answer: &[u8]) -> Result<CommandResult, FrameError>;

    /// Command that must succeed before `command` may be sent
    fn priming_command(&self, _command: &str) -> Option<&'static str> {
        None
    }
}

impl FrameCodec for WireVariant {
    fn encode(&self, command: &str) -> Vec<Vec<u8>> {
        let command = command.as_bytes();
        match self {
            WireVariant::Cxr => encode_cxr(command),
            WireVariant::Sw => {
                let suffix = format!(":{}", checksum::format(checksum::checksum(command)));
                vec![[command, suffix.as_bytes(), LINE_END].concat()]
            }
            WireVariant::CxrF => vec![[command, LINE_END].concat()],
        }
    }

    fn decode(&self, answer: &[u8]) -> Result<CommandResult, FrameError> {
        if !answer.is_ascii() {
            return Err(FrameError::Encoding);
        }
        let answer = std::str::from_utf8(answer)
            .map_err(|_| FrameError::Encoding)?
            .trim();

        match self {
            WireVariant::Cxr => decode_cxr(answer),
            WireVariant::Sw => decode_sw(answer),
            WireVariant::CxrF => Ok(CommandResult::new(0, vec![answer.to_string()])),
        }
    }

    fn priming_command(&self, command: &str) -> Option<&'static str> {
        match self {
            WireVariant::Sw if command.len() >= SW_LONG_COMMAND_LEN => Some(SETCMDLONG_COMMAND),
            _ => None,
        }
    }
}

/// CXR frames longer than the first chunk are split: the header plus 10
/// command bytes, then 15-byte slices, the last one carrying the line end.
fn encode_cxr(command: &[u8]) -> Vec<Vec<u8>> {
    let mut head = format!("C:{}:", checksum::format(checksum::checksum(command))).into_bytes();

    if command.len() <= CXR_FIRST_CHUNK {
        head.extend_from_slice(command);
        head.extend_from_slice(LINE_END);
        return vec![head];
    }

    let (first, rest) = command.split_at(CXR_FIRST_CHUNK);
    head.extend_from_slice(first);

    let mut writes = vec![head];
    writes.extend(rest.chunks(CXR_CHUNK).map(<[u8]>::to_vec));
    if let Some(last) = writes.last_mut() {
        last.extend_from_slice(LINE_END);
    }
    writes
}

fn decode_cxr(answer: &str) -> Result<CommandResult, FrameError> {
    let parts: Vec<&str> = answer.split(':').collect();
    let &[magic, claimed, body] = parts.as_slice() else {
        return Err(FrameError::AnswerLength);
    };

    if magic != "R" && magic != "E" {
        return Err(FrameError::Magic);
    }
    if !checksum::verify(body.as_bytes(), claimed) {
        return Err(FrameError::Checksum);
    }

    let data: Vec<&str> = body.split(' ').collect();
    let shape_ok = if magic == "E" {
        data.len() == 2
    } else {
        data.len() >= 2
    };
    if !shape_ok {
        return Err(FrameError::DataLength);
    }

    let status = parse_hex(data[1])?;
    let tokens = if data[0] == "OK" {
        data[2..].iter().map(|s| s.to_string()).collect()
    } else {
        Vec::new()
    };
    Ok(CommandResult::new(status, tokens))
}

fn decode_sw(answer: &str) -> Result<CommandResult, FrameError> {
    let mut texts = Vec::new();
    for line in answer.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (text, claimed) = line.rsplit_once(':').ok_or(FrameError::AnswerLength)?;
        if !checksum::verify(text.as_bytes(), claimed) {
            return Err(FrameError::Checksum);
        }
        texts.push(text);
    }

    let lines: Vec<String> = texts.iter().map(|text| format!("{}\n", text)).collect();
    let last = texts.last().copied().unwrap_or_default();
    let ret: Vec<&str> = last.split(' ').collect();

    let numeric = ret.len() >= 2
        && ret[1].len() == 8
        && ret[1].bytes().all(|b| b.is_ascii_hexdigit());
    if !numeric {
        return Ok(CommandResult::new(0, lines));
    }

    let status = parse_hex(ret[1])?;
    let tokens = if texts.len() == 1 {
        ret[2..].iter().map(|s| s.to_string()).collect()
    } else {
        lines[..lines.len() - 1].to_vec()
    };
    Ok(CommandResult::new(status, tokens))
}

fn parse_hex(field: &str) -> Result<u32, FrameError> {
    u32::from_str_radix(field, 16).map_err(|_| FrameError::AnswerLength)
}
