pub mod credential;
pub mod disk;
pub mod otp;
pub mod soft;

use std::fmt;

use zeroize::Zeroize;

use crate::oath::{Code, Credential, CredentialData, CredentialId};
use crate::version::Version;

pub use credential::CredentialRecord;
pub use soft::SoftToken;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize: {0}")]
    Serialization(String),
    #[error("Encrypt: {0}")]
    Encryption(String),
    #[error("Corrupt: {0}")]
    Corrupt(String),
    #[error("Not found")]
    NotFound,
    #[error("No space left for credentials")]
    NoSpace,
    #[error("Command aborted")]
    CommandAborted,
    #[error("Security condition not satisfied")]
    SecurityConditionNotSatisfied,
    #[error("Authentication required")]
    AuthRequired,
    #[error("Wrong access key")]
    WrongKey,
    #[error("Token is in use by another session")]
    Busy,
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Incorrect data: {0}")]
    IncorrectData(String),
}

/// Key derived from the token password. Zeroed on drop, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey(Vec<u8>);

impl AccessKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

impl Drop for AccessKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// One open session against an OATH credential store.
///
/// Every call is a single blocking round-trip. Implementations do not retry.
pub trait CredentialStore {
    fn version(&self) -> Version;
    fn device_id(&self) -> &str;
    /// True while a password is set and has not been validated this session.
    fn locked(&self) -> bool;

    fn derive_key(&self, password: &str) -> AccessKey;
    fn validate(&mut self, key: &AccessKey) -> Result<(), StoreError>;
    fn set_key(&mut self, key: &AccessKey) -> Result<(), StoreError>;
    fn unset_key(&mut self) -> Result<(), StoreError>;
    /// Wipe every credential and the password. The device id changes.
    fn reset(&mut self) -> Result<(), StoreError>;

    fn list_credentials(&mut self) -> Result<Vec<Credential>, StoreError>;
    fn put_credential(
        &mut self,
        data: &CredentialData,
        touch_required: bool,
    ) -> Result<Credential, StoreError>;
    fn delete_credential(&mut self, id: &CredentialId) -> Result<(), StoreError>;

    /// Codes for everything computable without touch or a counter bump;
    /// `None` for the rest. Preserves storage order.
    fn calculate_all(
        &mut self,
        timestamp: u64,
    ) -> Result<Vec<(Credential, Option<Code>)>, StoreError>;
    fn calculate_code(
        &mut self,
        credential: &Credential,
        timestamp: u64,
    ) -> Result<Code, StoreError>;
    /// Full HMAC response for `challenge`.
    fn calculate(&mut self, id: &CredentialId, challenge: &[u8]) -> Result<Vec<u8>, StoreError>;
}
