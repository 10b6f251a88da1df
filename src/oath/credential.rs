use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::{HashAlgorithm, OathType, DEFAULT_DIGITS, DEFAULT_PERIOD, HIDDEN_ISSUER, STEAM_ISSUER};

/// Identifier a credential is stored under: `[period/][issuer:]name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialId(Vec<u8>);

impl CredentialId {
    pub fn format(issuer: Option<&str>, name: &str, oath_type: OathType, period: u32) -> Self {
        let mut id = String::new();
        if oath_type == OathType::Totp && period != DEFAULT_PERIOD {
            id.push_str(&format!("{period}/"));
        }
        if let Some(issuer) = issuer.filter(|i| !i.is_empty()) {
            id.push_str(issuer);
            id.push(':');
        }
        id.push_str(name);
        Self(id.into_bytes())
    }

    /// Split the id back into (issuer, name, period). HOTP ids carry no period.
    pub fn parse(&self, oath_type: OathType) -> (Option<String>, String, Option<u32>) {
        let data = String::from_utf8_lossy(&self.0).into_owned();
        match oath_type {
            OathType::Totp => {
                let (period, rest) = split_period(&data);
                match rest.split_once(':') {
                    Some((issuer, name)) if !issuer.is_empty() && !name.is_empty() => {
                        (Some(issuer.to_string()), name.to_string(), Some(period))
                    }
                    _ => (None, rest.to_string(), Some(period)),
                }
            }
            OathType::Hotp => match data.split_once(':') {
                Some((issuer, name)) => (Some(issuer.to_string()), name.to_string(), None),
                None => (None, data, None),
            },
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` starts with `other` and is longer than it.
    pub fn strictly_extends(&self, other: &CredentialId) -> bool {
        self.0.len() > other.0.len() && self.0.starts_with(&other.0)
    }
}

fn split_period(data: &str) -> (u32, &str) {
    if let Some((digits, rest)) = data.split_once('/') {
        if !digits.is_empty() && !rest.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(period) = digits.parse() {
                return (period, rest);
            }
        }
    }
    (DEFAULT_PERIOD, data)
}

impl From<&[u8]> for CredentialId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for CredentialId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A credential as reported by the token. Never carries the secret.
#[derive(Clone, Debug)]
pub struct Credential {
    pub device_id: String,
    pub id: CredentialId,
    pub issuer: Option<String>,
    pub name: String,
    pub oath_type: OathType,
    pub period: Option<u32>,
    pub touch_required: bool,
}

impl Credential {
    pub fn new(
        device_id: &str,
        id: CredentialId,
        oath_type: OathType,
        touch_required: bool,
    ) -> Self {
        let (issuer, name, period) = id.parse(oath_type);
        Self {
            device_id: device_id.to_string(),
            id,
            issuer,
            name,
            oath_type,
            period,
            touch_required,
        }
    }

    /// The string users see and queries are matched against.
    pub fn display_id(&self) -> String {
        self.id.to_string()
    }

    pub fn is_hidden(&self) -> bool {
        self.issuer.as_deref() == Some(HIDDEN_ISSUER)
    }

    pub fn is_steam(&self) -> bool {
        self.oath_type == OathType::Totp && self.issuer.as_deref() == Some(STEAM_ISSUER)
    }

    fn sort_key(&self) -> (String, String) {
        let primary = self.issuer.as_deref().unwrap_or(&self.name).to_lowercase();
        (primary, self.name.to_lowercase())
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.device_id == other.device_id && self.id == other.id
    }
}

impl Eq for Credential {}

impl Hash for Credential {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.device_id.hash(state);
        self.id.hash(state);
    }
}

impl Ord for Credential {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.device_id.cmp(&other.device_id))
    }
}

impl PartialOrd for Credential {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A credential candidate assembled on the host before admission.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialData {
    pub name: String,
    pub oath_type: OathType,
    pub hash_algorithm: HashAlgorithm,
    pub secret: Vec<u8>,
    pub digits: u8,
    pub period: u32,
    pub counter: u32,
    pub issuer: Option<String>,
}

impl CredentialData {
    pub fn new(name: &str, secret: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            oath_type: OathType::Totp,
            hash_algorithm: HashAlgorithm::Sha1,
            secret,
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            counter: 0,
            issuer: None,
        }
    }

    pub fn id(&self) -> CredentialId {
        CredentialId::format(self.issuer.as_deref(), &self.name, self.oath_type, self.period)
    }

    pub fn is_steam(&self) -> bool {
        self.oath_type == OathType::Totp && self.issuer.as_deref() == Some(STEAM_ISSUER)
    }
}

impl fmt::Debug for CredentialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialData")
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .field("oath_type", &self.oath_type)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("digits", &self.digits)
            .field("period", &self.period)
            .field("counter", &self.counter)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Drop for CredentialData {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}
