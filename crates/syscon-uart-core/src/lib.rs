//! # syscon-uart Core Library
//!
//! Serial protocol engine for the PS3 system controller ("syscon") UART.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Additive checksum and frame codecs for the CXR, SW and CXRF wire variants
//! - A blocking transport session over a serial link
//! - The AUTH1/AUTH2 AES-128-CBC challenge/response handshake
//! - An EEPROM patch writer built on top of an authenticated session
//!
//! ## Example
//!
//! ```rust,ignore
//! use syscon_uart_core::protocol::{Session, SessionConfig, WireVariant};
//!
//! let config = SessionConfig::new("/dev/ttyUSB0", WireVariant::Cxr);
//! let mut session = Session::open(&config)?;
//!
//! let version = session.command("VER", config.command_wait())?;
//! println!("Version: {:?}", version.tokens.first());
//!
//! session.auth()?;
//! ```

pub mod auth;
pub mod patch;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::{AuthError, AuthFailure, AuthKeys, HandshakeState};
    pub use crate::patch::{BlockReport, PatchError, PatchPlan, PatchTarget};
    pub use crate::protocol::{
        CommandResult, FrameCodec, ProtocolError, SerialLink, Session, SessionConfig,
        WireVariant,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
