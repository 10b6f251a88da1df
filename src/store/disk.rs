use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CredentialRecord, StoreError};
use crate::version::Version;

pub const FORMAT_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;

/// On-disk image of a soft token.
#[derive(Serialize, Deserialize)]
pub struct TokenFile {
    pub format:    u8,
    pub firmware:  Version,
    pub salt:      Vec<u8>,          // 8 bytes, source of the device id
    pub key_check: Option<Vec<u8>>,  // present iff a password is set
    pub payload:   Payload,
}

#[derive(Serialize, Deserialize)]
pub enum Payload {
    Plain(Vec<CredentialRecord>),
    Sealed { nonce: Vec<u8>, ciphertext: Vec<u8> },
}

/// Read + deserialize the token image at `path`.
pub(crate) fn read_token(path: &Path) -> Result<TokenFile, StoreError> {
    let bytes = std::fs::read(path)?;
    let token: TokenFile = ciborium::from_reader(bytes.as_slice())
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    if token.format != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!("unknown format {}", token.format)));
    }
    Ok(token)
}

/// Serialize and replace the token image. Writes a sibling file first so a
/// crash never leaves a half-written token.
pub(crate) fn write_token(path: &Path, token: &TokenFile) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(token, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &buf)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Advisory lock guarding one session against `path`. Callers hold the
/// `try_write` guard for as long as the token is open.
pub fn session_lock(path: &Path) -> Result<fd_lock::RwLock<std::fs::File>, StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("lock"))?;
    Ok(fd_lock::RwLock::new(file))
}

/// Encrypt the credential list under `storage_key`.
pub(crate) fn seal(
    storage_key: &[u8; 32],
    records: &[CredentialRecord],
) -> Result<Payload, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(records, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(storage_key)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), buf.as_slice())
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    Ok(Payload::Sealed { nonce: nonce_bytes.to_vec(), ciphertext })
}

/// Decrypt + deserialize a sealed credential list.
pub(crate) fn unseal(
    storage_key: &[u8; 32],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<CredentialRecord>, StoreError> {
    if nonce.len() != NONCE_LEN {
        return Err(StoreError::Corrupt("bad nonce length".into()));
    }
    let cipher = Aes256Gcm::new_from_slice(storage_key)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    ciborium::from_reader(plaintext.as_slice())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}
