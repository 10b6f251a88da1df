//! OATH domain types shared by the store, the matcher and the command glue.

pub mod credential;
pub mod steam;
pub mod uri;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use credential::{Credential, CredentialData, CredentialId};
pub use uri::{parse_b32_key, UriError};

pub const DEFAULT_PERIOD: u32 = 30;
pub const DEFAULT_DIGITS: u8 = 6;
/// Code lengths the token accepts.
pub const DIGITS_RANGE: std::ops::RangeInclusive<u8> = 6..=8;
pub const HIDDEN_ISSUER: &str = "_hidden";
pub const STEAM_ISSUER: &str = "Steam";

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OathType {
    Hotp = 0x10,
    Totp = 0x20,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha1 = 0x01,
    Sha256 = 0x02,
    Sha512 = 0x03,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for OathType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOTP" => Ok(Self::Hotp),
            "TOTP" => Ok(Self::Totp),
            _ => Err(ParseEnumError { kind: "OATH type", value: s.to_string() }),
        }
    }
}

impl fmt::Display for OathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hotp => "HOTP",
            Self::Totp => "TOTP",
        })
    }
}

impl FromStr for HashAlgorithm {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(ParseEnumError { kind: "hash algorithm", value: s.to_string() }),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        })
    }
}

/// A computed one-time code and the time window it is valid for.
///
/// HOTP codes have no expiry, so `valid_to` is `u64::MAX`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Code {
    pub value: String,
    pub valid_from: u64,
    pub valid_to: u64,
}

impl Code {
    pub fn new(credential: &Credential, timestamp: u64, value: String) -> Self {
        match credential.oath_type {
            OathType::Totp => {
                let period = u64::from(credential.period.unwrap_or(DEFAULT_PERIOD).max(1));
                let step = timestamp / period;
                Self {
                    value,
                    valid_from: step * period,
                    valid_to: (step + 1) * period,
                }
            }
            OathType::Hotp => Self {
                value,
                valid_from: timestamp,
                valid_to: u64::MAX,
            },
        }
    }
}

/// RFC 4226 dynamic truncation of a full HMAC response to 31 bits.
pub fn dynamic_truncate(digest: &[u8]) -> Option<u32> {
    let offset = usize::from(digest.last()? & 0x0f);
    let window: [u8; 4] = digest.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(window) & 0x7fff_ffff)
}

/// Render a truncated value as a zero-padded decimal code.
///
/// `None` when `digits` is too large to form a modulus.
pub fn format_digits(truncated: u32, digits: u8) -> Option<String> {
    let modulus = 10u64.checked_pow(u32::from(digits))?;
    Some(format!("{:0width$}", u64::from(truncated) % modulus, width = usize::from(digits)))
}
