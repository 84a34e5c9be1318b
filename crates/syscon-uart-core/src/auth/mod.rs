//! Syscon authentication
//!
//! The AUTH1/AUTH2 challenge/response exchange proves to the syscon that
//! the host holds the pre-shared AES keys. Privileged commands such as
//! `EEP SET` are only honoured afterwards.

pub mod crypto;
mod error;
pub mod handshake;
mod keys;

pub use crypto::CipherError;
pub use error::{AuthError, AuthFailure};
pub use handshake::{Handshake, HandshakeState};
pub use keys::{AuthKeys, KEY_SIZE};
