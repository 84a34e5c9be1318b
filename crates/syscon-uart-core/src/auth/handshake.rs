//! AUTH1/AUTH2 handshake
//!
//! ```text
//! host                                   syscon
//!  | AUTH1 <probe>                          |
//!  |--------------------------------------->|
//!  |         header ‖ CBC(sc2tb, body)      |
//!  |<---------------------------------------|
//!  | AUTH2 header ‖ CBC(tb2sc, swapped)     |
//!  |--------------------------------------->|
//!  |                 status / SC_SUCCESS    |
//!  |<---------------------------------------|
//! ```
//!
//! Challenge validation and AUTH2 construction are pure functions of the
//! key material; [`Handshake`] drives them over a [`Session`].

use tracing::{info, warn};

use super::crypto::{decrypt_cbc, encrypt_cbc};
use super::{AuthError, AuthFailure, AuthKeys, KEY_SIZE};
use crate::protocol::{CommandResult, SerialLink, Session, WireVariant};

/// Length of the AUTH1 probe, the AUTH1 response and the AUTH2 message
pub const AUTH_MESSAGE_SIZE: usize = 0x40;

/// Length of the decrypted AUTH1 response body
pub const AUTH_BODY_SIZE: usize = AUTH_MESSAGE_SIZE - KEY_SIZE;

/// AUTH1 probe: 0x10 followed by zeros
pub const AUTH1_PROBE: [u8; AUTH_MESSAGE_SIZE] = auth1_probe();

/// Opens the secure channel on CXRF
pub const SCOPEN_COMMAND: &str = "scopen";

/// CXRF answer to `scopen` when the channel is ready
pub const SC_READY: &str = "SC_READY";

/// CXRF answer to AUTH2 when authentication succeeded
pub const SC_SUCCESS: &str = "SC_SUCCESS";

const fn auth1_probe() -> [u8; AUTH_MESSAGE_SIZE] {
    let mut probe = [0u8; AUTH_MESSAGE_SIZE];
    probe[0] = 0x10;
    probe
}

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet
    Idle,
    /// AUTH1 written, waiting for the challenge
    ChallengeSent,
    /// AUTH2 built and being sent
    ResponseSent,
    /// The syscon accepted AUTH2
    Authenticated,
    /// The exchange was rejected or the link failed
    Failed,
}

/// One run of the AUTH1/AUTH2 exchange
#[derive(Debug)]
pub struct Handshake<'k> {
    keys: &'k AuthKeys,
    state: HandshakeState,
    history: Vec<HandshakeState>,
}

impl<'k> Handshake<'k> {
    /// New handshake in the [`Idle`](HandshakeState::Idle) state
    pub fn new(keys: &'k AuthKeys) -> Self {
        Self {
            keys,
            state: HandshakeState::Idle,
            history: vec![HandshakeState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> &[HandshakeState] {
        &self.history
    }

    /// Run the exchange over `session`.
    ///
    /// Ends in `Authenticated` or `Failed`.
    pub fn run<L: SerialLink>(&mut self, session: &mut Session<L>) -> Result<(), AuthError> {
        match self.exchange(session) {
            Ok(()) => {
                self.enter(HandshakeState::Authenticated);
                Ok(())
            }
            Err(err) => {
                warn!("authentication failed: {}", err);
                self.enter(HandshakeState::Failed);
                Err(err)
            }
        }
    }

    fn exchange<L: SerialLink>(&mut self, session: &mut Session<L>) -> Result<(), AuthError> {
        let variant = session.variant();
        let wait = session.config().command_wait();

        if variant == WireVariant::CxrF {
            let scopen = session.command(SCOPEN_COMMAND, wait)?;
            if !scopen.first_token().is_some_and(|t| t.contains(SC_READY)) {
                return Err(AuthFailure::ScopenInvalid.into());
            }
        }

        let auth1 = match session.submit(&auth1_command(variant))? {
            Some(rejected) => rejected,
            None => {
                self.enter(HandshakeState::ChallengeSent);
                session.collect(wait)?
            }
        };

        let challenge = extract_challenge(variant, &auth1)?;
        let auth2 = respond_to_challenge(self.keys, &challenge)?;
        self.enter(HandshakeState::ResponseSent);

        let answer = session.command(&auth2_command(variant, &auth2), wait)?;
        let accepted = match variant {
            WireVariant::CxrF => answer.first_token().is_some_and(|t| t.contains(SC_SUCCESS)),
            WireVariant::Cxr | WireVariant::Sw => answer.is_ok(),
        };
        if !accepted {
            return Err(AuthFailure::AuthFailed.into());
        }
        Ok(())
    }

    fn enter(&mut self, state: HandshakeState) {
        info!(from = ?self.state, to = ?state, "handshake");
        self.state = state;
        self.history.push(state);
    }
}

/// AUTH1 command line for `variant`
pub fn auth1_command(variant: WireVariant) -> String {
    let probe = hex::encode_upper(AUTH1_PROBE);
    match variant {
        WireVariant::CxrF => probe,
        WireVariant::Cxr | WireVariant::Sw => format!("AUTH1 {}", probe),
    }
}

/// AUTH2 command line for `variant`
pub fn auth2_command(variant: WireVariant, message: &[u8; AUTH_MESSAGE_SIZE]) -> String {
    let body = hex::encode_upper(message);
    match variant {
        WireVariant::CxrF => body,
        WireVariant::Cxr | WireVariant::Sw => format!("AUTH2 {}", body),
    }
}

/// Pull the 64-byte challenge out of the AUTH1 answer.
///
/// CXR/SW carry it as the first token of a status-0 answer. CXRF echoes
/// the probe first, so the challenge is the second `\r`-separated piece
/// minus its leading `\n`.
pub fn extract_challenge(
    variant: WireVariant,
    answer: &CommandResult,
) -> Result<[u8; AUTH_MESSAGE_SIZE], AuthFailure> {
    let encoded = match variant {
        WireVariant::CxrF => answer
            .first_token()
            .and_then(|raw| raw.split('\r').nth(1))
            .and_then(|piece| piece.get(1..))
            .filter(|hex_str| hex_str.len() == AUTH_MESSAGE_SIZE * 2),
        WireVariant::Cxr | WireVariant::Sw => answer.first_token().filter(|_| answer.is_ok()),
    }
    .ok_or(AuthFailure::Auth1ResponseInvalid)?;

    let bytes = hex::decode(encoded).map_err(|_| AuthFailure::Auth1ResponseInvalid)?;
    bytes
        .try_into()
        .map_err(|_| AuthFailure::Auth1ResponseInvalid)
}

/// Check the challenge header and decrypted body, returning the plaintext
pub fn verify_challenge(
    keys: &AuthKeys,
    challenge: &[u8; AUTH_MESSAGE_SIZE],
) -> Result<[u8; AUTH_BODY_SIZE], AuthFailure> {
    if challenge[..KEY_SIZE] != keys.auth1_response_header {
        return Err(AuthFailure::Auth1HeaderInvalid);
    }

    let plaintext: [u8; AUTH_BODY_SIZE] =
        decrypt_cbc(&keys.device_to_host, &keys.iv, &challenge[KEY_SIZE..])
            .ok()
            .and_then(|body| body.try_into().ok())
            .ok_or(AuthFailure::Auth1BodyInvalid)?;

    let zero = [0u8; KEY_SIZE];
    let valid = plaintext[0x08..0x10] == zero[..8]
        && plaintext[0x10..0x20] == keys.reference
        && plaintext[0x20..0x30] == zero;
    if !valid {
        return Err(AuthFailure::Auth1BodyInvalid);
    }
    Ok(plaintext)
}

/// Build the AUTH2 message from a verified AUTH1 plaintext.
///
/// The two leading 8-byte halves are swapped, two zero blocks follow, and
/// the result is encrypted behind the AUTH2 header.
pub fn build_auth2(
    keys: &AuthKeys,
    plaintext: &[u8; AUTH_BODY_SIZE],
) -> Result<[u8; AUTH_MESSAGE_SIZE], AuthFailure> {
    let mut swapped = [0u8; AUTH_BODY_SIZE];
    swapped[0x00..0x08].copy_from_slice(&plaintext[0x08..0x10]);
    swapped[0x08..0x10].copy_from_slice(&plaintext[0x00..0x08]);

    let body = encrypt_cbc(&keys.host_to_device, &keys.iv, &swapped)
        .map_err(|_| AuthFailure::AuthFailed)?;

    let mut message = [0u8; AUTH_MESSAGE_SIZE];
    message[..KEY_SIZE].copy_from_slice(&keys.auth2_header);
    message[KEY_SIZE..].copy_from_slice(&body);
    Ok(message)
}

/// Validate a challenge and build the matching AUTH2 message
pub fn respond_to_challenge(
    keys: &AuthKeys,
    challenge: &[u8; AUTH_MESSAGE_SIZE],
) -> Result<[u8; AUTH_MESSAGE_SIZE], AuthFailure> {
    let plaintext = verify_challenge(keys, challenge)?;
    build_auth2(keys, &plaintext)
}
