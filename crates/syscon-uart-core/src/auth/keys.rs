//! Pre-shared key material

use std::fmt;

/// Size of every key, IV and header block
pub const KEY_SIZE: usize = 16;

/// Constants shared with the syscon.
///
/// These never change at runtime; a handshake borrows them.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKeys {
    /// Encrypts the AUTH2 body (testbench to syscon)
    pub host_to_device: [u8; KEY_SIZE],
    /// Decrypts the AUTH1 response body (syscon to testbench)
    pub device_to_host: [u8; KEY_SIZE],
    /// Value the syscon embeds in its AUTH1 response
    pub reference: [u8; KEY_SIZE],
    /// CBC initialization vector
    pub iv: [u8; KEY_SIZE],
    /// First block of a valid AUTH1 response
    pub auth1_response_header: [u8; KEY_SIZE],
    /// First block of the AUTH2 message
    pub auth2_header: [u8; KEY_SIZE],
}

impl AuthKeys {
    /// Keys used by retail syscon firmware
    pub const SYSCON: AuthKeys = AuthKeys {
        // 0x130 xor 0x4588
        host_to_device: [
            0x90, 0x7E, 0x73, 0x0F, 0x4D, 0x4E, 0x0A, 0x0B, 0x7B, 0x75, 0xF0, 0x30, 0xEB, 0x1D,
            0x9D, 0x36,
        ],
        // 0x130 xor 0x4578
        device_to_host: [
            0x71, 0xF0, 0x3F, 0x18, 0x4C, 0x01, 0xC5, 0xEB, 0xC3, 0xF6, 0xA2, 0x2A, 0x42, 0xBA,
            0x95, 0x25,
        ],
        // 0x45B8
        reference: [
            0x33, 0x50, 0xBD, 0x78, 0x20, 0x34, 0x5C, 0x29, 0x05, 0x6A, 0x22, 0x3B, 0xA2, 0x20,
            0xB3, 0x23,
        ],
        iv: [0; KEY_SIZE],
        auth1_response_header: [
            0x10, 0x10, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ],
        auth2_header: [
            0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ],
    };
}

impl Default for AuthKeys {
    fn default() -> Self {
        Self::SYSCON
    }
}

impl fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKeys")
            .field("auth1_response_header", &hex::encode_upper(self.auth1_response_header))
            .field("auth2_header", &hex::encode_upper(self.auth2_header))
            .finish_non_exhaustive()
    }
}
