use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::disk::{self, Payload, TokenFile, FORMAT_VERSION};
use super::{otp, AccessKey, CredentialRecord, CredentialStore, StoreError};
use crate::config::{
    MAX_CREDENTIALS, MIN_SHA512_VERSION, MIN_TOUCH_VERSION, NO_SPACE_STATUS_VERSION,
};
use crate::oath::{
    dynamic_truncate, format_digits, Code, Credential, CredentialData, CredentialId, HashAlgorithm,
    OathType, DEFAULT_PERIOD, DIGITS_RANGE,
};
use crate::up::{touch_prompt, UserPresence};
use crate::version::Version;

const SALT_LEN: usize = 8;
const KEY_CHECK_LABEL: &[u8] = b"oathkey key check";
const STORAGE_KEY_LABEL: &[u8] = b"oathkey storage key";

/// A file-backed OATH token. Behaves like the hardware application,
/// including its firmware-dependent limits.
pub struct SoftToken {
    path: PathBuf,
    firmware: Version,
    salt: Vec<u8>,
    device_id: String,
    key_check: Option<Vec<u8>>,
    storage_key: Option<[u8; 32]>,
    records: Vec<CredentialRecord>,
    sealed: Option<(Vec<u8>, Vec<u8>)>,
    presence: Box<dyn UserPresence>,
}

impl SoftToken {
    /// Write an empty, unprotected token image to `path`.
    pub fn create(path: &Path, firmware: Version) -> Result<(), StoreError> {
        let token = TokenFile {
            format: FORMAT_VERSION,
            firmware,
            salt: random_salt(),
            key_check: None,
            payload: Payload::Plain(Vec::new()),
        };
        disk::write_token(path, &token)?;
        tracing::info!(path = %path.display(), %firmware, "Token created");
        Ok(())
    }

    pub fn open(path: &Path, presence: Box<dyn UserPresence>) -> Result<Self, StoreError> {
        let TokenFile { firmware, salt, key_check, payload, .. } = disk::read_token(path)?;
        let (records, sealed) = match payload {
            Payload::Plain(records) => (records, None),
            Payload::Sealed { nonce, ciphertext } => (Vec::new(), Some((nonce, ciphertext))),
        };
        if key_check.is_some() != sealed.is_some() {
            return Err(StoreError::Corrupt("password state does not match payload".into()));
        }
        let device_id = device_id_for(&salt);
        tracing::debug!(%device_id, %firmware, locked = key_check.is_some(), "Token opened");
        Ok(Self {
            path: path.to_path_buf(),
            firmware,
            salt,
            device_id,
            key_check,
            storage_key: None,
            records,
            sealed,
            presence,
        })
    }

    pub fn credential_count(&self) -> usize {
        self.records.len()
    }

    fn ensure_unlocked(&self) -> Result<(), StoreError> {
        if self.locked() {
            return Err(StoreError::AuthRequired);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let payload = match (&self.key_check, &self.storage_key) {
            (None, _) => Payload::Plain(self.records.clone()),
            (Some(_), Some(key)) => disk::seal(key, &self.records)?,
            (Some(_), None) => return Err(StoreError::AuthRequired),
        };
        let token = TokenFile {
            format: FORMAT_VERSION,
            firmware: self.firmware,
            salt: self.salt.clone(),
            key_check: self.key_check.clone(),
            payload,
        };
        disk::write_token(&self.path, &token)
    }

    fn find(&self, id: &CredentialId) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(StoreError::NotFound)
    }

    fn to_credential(&self, record: &CredentialRecord) -> Credential {
        Credential::new(&self.device_id, record.id.clone(), record.oath_type, record.touch_required)
    }

    /// Full HMAC response of the record at `idx`. HOTP ignores `challenge`
    /// and advances its counter.
    fn respond(&mut self, idx: usize, challenge: &[u8]) -> Result<Vec<u8>, StoreError> {
        if self.records[idx].touch_required {
            let prompt = touch_prompt(&self.records[idx].id.to_string());
            self.presence.require(&prompt).map_err(|e| {
                tracing::warn!(error = %e, "Touch not confirmed");
                StoreError::SecurityConditionNotSatisfied
            })?;
        }

        let record = &self.records[idx];
        match record.oath_type {
            OathType::Totp => Ok(otp::hmac(record.algorithm, &record.secret, challenge)),
            OathType::Hotp => {
                let counter = record.counter;
                let digest =
                    otp::hmac(record.algorithm, &record.secret, &u64::from(counter).to_be_bytes());
                self.records[idx].counter = counter.wrapping_add(1);
                self.persist()?;
                tracing::debug!(counter, "HOTP counter advanced");
                Ok(digest)
            }
        }
    }

    fn truncated_code(
        &mut self,
        idx: usize,
        credential: &Credential,
        timestamp: u64,
    ) -> Result<Code, StoreError> {
        let period = credential.period.unwrap_or(DEFAULT_PERIOD);
        let challenge = otp::totp_challenge(timestamp, period);
        let digest = self.respond(idx, &challenge)?;
        let truncated = dynamic_truncate(&digest)
            .ok_or_else(|| StoreError::Corrupt("short HMAC response".into()))?;
        let digits = self.records[idx].digits;
        let value = format_digits(truncated, digits)
            .ok_or_else(|| StoreError::Corrupt(format!("unusable digit count {digits}")))?;
        Ok(Code::new(credential, timestamp, value))
    }
}

impl CredentialStore for SoftToken {
    fn version(&self) -> Version {
        self.firmware
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn locked(&self) -> bool {
        self.key_check.is_some() && self.storage_key.is_none()
    }

    fn derive_key(&self, password: &str) -> AccessKey {
        AccessKey::new(otp::derive_key(&self.salt, password))
    }

    fn validate(&mut self, key: &AccessKey) -> Result<(), StoreError> {
        let Some(expected) = &self.key_check else {
            return Ok(());
        };
        let actual = key_check_for(key);
        if !bool::from(actual.as_slice().ct_eq(expected.as_slice())) {
            return Err(StoreError::WrongKey);
        }
        let storage_key = storage_key_for(key);
        if let Some((nonce, ciphertext)) = self.sealed.take() {
            self.records = disk::unseal(&storage_key, &nonce, &ciphertext)?;
        }
        self.storage_key = Some(storage_key);
        tracing::debug!(device_id = %self.device_id, "Access key validated");
        Ok(())
    }

    fn set_key(&mut self, key: &AccessKey) -> Result<(), StoreError> {
        self.ensure_unlocked()?;
        self.key_check = Some(key_check_for(key));
        self.storage_key = Some(storage_key_for(key));
        self.persist()
    }

    fn unset_key(&mut self) -> Result<(), StoreError> {
        self.ensure_unlocked()?;
        self.key_check = None;
        self.storage_key = None;
        self.persist()
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.salt = random_salt();
        self.device_id = device_id_for(&self.salt);
        self.key_check = None;
        self.storage_key = None;
        self.sealed = None;
        self.records.clear();
        self.persist()?;
        tracing::info!(device_id = %self.device_id, "Token reset");
        Ok(())
    }

    fn list_credentials(&mut self) -> Result<Vec<Credential>, StoreError> {
        self.ensure_unlocked()?;
        Ok(self.records.iter().map(|r| self.to_credential(r)).collect())
    }

    fn put_credential(
        &mut self,
        data: &CredentialData,
        touch_required: bool,
    ) -> Result<Credential, StoreError> {
        self.ensure_unlocked()?;
        if !DIGITS_RANGE.contains(&data.digits) {
            return Err(StoreError::IncorrectData(format!("digits {}", data.digits)));
        }
        if touch_required && self.firmware < MIN_TOUCH_VERSION {
            return Err(StoreError::Unsupported("touch".into()));
        }
        if data.hash_algorithm == HashAlgorithm::Sha512
            && (self.firmware < MIN_SHA512_VERSION || self.firmware.is_fips())
        {
            return Err(StoreError::Unsupported("SHA512".into()));
        }

        let record = CredentialRecord {
            id: data.id(),
            oath_type: data.oath_type,
            algorithm: data.hash_algorithm,
            digits: data.digits,
            secret: otp::shorten_key(&data.secret, data.hash_algorithm),
            touch_required,
            counter: if data.oath_type == OathType::Hotp { data.counter } else { 0 },
        };
        let credential = self.to_credential(&record);

        match self.find(&record.id) {
            Ok(idx) => self.records[idx] = record,
            Err(_) if self.records.len() >= MAX_CREDENTIALS => {
                return Err(if self.firmware < NO_SPACE_STATUS_VERSION {
                    StoreError::CommandAborted
                } else {
                    StoreError::NoSpace
                });
            }
            Err(_) => self.records.push(record),
        }
        self.persist()?;
        tracing::info!(id = %credential.id, count = self.records.len(), "Credential stored");
        Ok(credential)
    }

    fn delete_credential(&mut self, id: &CredentialId) -> Result<(), StoreError> {
        self.ensure_unlocked()?;
        let idx = self.find(id)?;
        self.records.remove(idx);
        self.persist()?;
        tracing::info!(%id, "Credential deleted");
        Ok(())
    }

    fn calculate_all(
        &mut self,
        timestamp: u64,
    ) -> Result<Vec<(Credential, Option<Code>)>, StoreError> {
        self.ensure_unlocked()?;
        let mut entries = Vec::with_capacity(self.records.len());
        for idx in 0..self.records.len() {
            let credential = self.to_credential(&self.records[idx]);
            let record = &self.records[idx];
            let code = if record.oath_type == OathType::Totp && !record.touch_required {
                Some(self.truncated_code(idx, &credential, timestamp)?)
            } else {
                None
            };
            entries.push((credential, code));
        }
        Ok(entries)
    }

    fn calculate_code(
        &mut self,
        credential: &Credential,
        timestamp: u64,
    ) -> Result<Code, StoreError> {
        self.ensure_unlocked()?;
        if credential.device_id != self.device_id {
            return Err(StoreError::NotFound);
        }
        let idx = self.find(&credential.id)?;
        self.truncated_code(idx, credential, timestamp)
    }

    fn calculate(&mut self, id: &CredentialId, challenge: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.ensure_unlocked()?;
        let idx = self.find(id)?;
        self.respond(idx, challenge)
    }
}

fn random_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn device_id_for(salt: &[u8]) -> String {
    let digest = Sha256::digest(salt);
    STANDARD_NO_PAD.encode(&digest[..16])
}

fn key_check_for(key: &AccessKey) -> Vec<u8> {
    otp::hmac(HashAlgorithm::Sha1, key.as_bytes(), KEY_CHECK_LABEL)
}

fn storage_key_for(key: &AccessKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(STORAGE_KEY_LABEL);
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}
