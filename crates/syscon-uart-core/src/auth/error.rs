//! Authentication errors

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Reason the handshake ended in the failed state.
///
/// The message is the reason string reported to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("scopen response invalid")]
    ScopenInvalid,

    #[error("Auth1 response invalid")]
    Auth1ResponseInvalid,

    #[error("Auth1 response header invalid")]
    Auth1HeaderInvalid,

    #[error("Auth1 response body invalid")]
    Auth1BodyInvalid,

    #[error("Auth failed")]
    AuthFailed,
}

/// Errors returned by [`Session::auth`](crate::protocol::Session::auth)
#[derive(Error, Debug)]
pub enum AuthError {
    /// The syscon did not complete the exchange
    #[error(transparent)]
    Rejected(#[from] AuthFailure),

    /// The serial link failed mid-exchange
    #[error(transparent)]
    Transport(#[from] ProtocolError),
}

impl AuthError {
    /// Handshake failure reason, if the link itself did not fail
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AuthError::Rejected(reason) => Some(*reason),
            AuthError::Transport(_) => None,
        }
    }
}
