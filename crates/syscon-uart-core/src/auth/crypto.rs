//! AES-128-CBC without padding

use aes::Aes128;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use super::KEY_SIZE;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Input length was not a whole number of blocks
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cipher input of {0} bytes is not a multiple of 16")]
pub struct CipherError(pub usize);

/// Encrypt whole blocks with AES-128-CBC
pub fn encrypt_cbc(
    key: &[u8; KEY_SIZE],
    iv: &[u8; KEY_SIZE],
    data: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CipherError(data.len()));
    }
    let mut buffer = data.to_vec();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buffer, data.len())
        .map_err(|_| CipherError(data.len()))?;
    Ok(buffer)
}

/// Decrypt whole blocks with AES-128-CBC
pub fn decrypt_cbc(
    key: &[u8; KEY_SIZE],
    iv: &[u8; KEY_SIZE],
    data: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CipherError(data.len()));
    }
    let mut buffer = data.to_vec();
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| CipherError(data.len()))?;
    Ok(buffer)
}
