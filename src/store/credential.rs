use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::oath::{CredentialId, HashAlgorithm, OathType};

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id:             CredentialId,
    pub oath_type:      OathType,
    pub algorithm:      HashAlgorithm,
    pub digits:         u8,
    pub secret:         Vec<u8>,   // HMAC key, shortened and padded
    pub touch_required: bool,
    pub counter:        u32,       // HOTP moving factor
}

impl Drop for CredentialRecord {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}
