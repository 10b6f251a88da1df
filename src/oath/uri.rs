use std::collections::HashMap;

use url::Url;

use super::{CredentialData, HashAlgorithm, OathType, DEFAULT_DIGITS, DEFAULT_PERIOD, DIGITS_RANGE};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UriError {
    #[error("URI seems to have the wrong format: {0}")]
    Malformed(String),
    #[error("invalid URI scheme {0:?}, expected otpauth")]
    Scheme(String),
    #[error("missing {0} in URI")]
    Missing(&'static str),
    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
    #[error("invalid base32 secret")]
    Secret,
}

/// Decode a base32 secret, ignoring case, spaces and missing padding.
pub fn parse_b32_key(key: &str) -> Result<Vec<u8>, UriError> {
    let mut key: String = key
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let pad = (8 - key.len() % 8) % 8;
    key.extend(std::iter::repeat('=').take(pad));
    // Issuers hand out keys with non-zero trailing bits; accept them.
    let mut base32 = data_encoding::BASE32.specification();
    base32.check_trailing_bits = false;
    let encoding = base32.encoding().map_err(|_| UriError::Secret)?;
    encoding.decode(key.as_bytes()).map_err(|_| UriError::Secret)
}

impl CredentialData {
    /// Parse an `otpauth://TYPE/[ISSUER:]NAME?secret=...` URI.
    pub fn parse_uri(uri: &str) -> Result<Self, UriError> {
        let parsed = Url::parse(uri.trim()).map_err(|e| UriError::Malformed(e.to_string()))?;
        if parsed.scheme() != "otpauth" {
            return Err(UriError::Scheme(parsed.scheme().to_string()));
        }

        let oath_type: OathType = parsed
            .host_str()
            .ok_or(UriError::Missing("type"))?
            .parse()
            .map_err(|_| UriError::Invalid {
                field: "type",
                value: parsed.host_str().unwrap_or_default().to_string(),
            })?;

        // First value wins for repeated parameters.
        let mut params: HashMap<String, String> = HashMap::new();
        for (k, v) in parsed.query_pairs() {
            params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }

        let path = percent_decode(parsed.path().trim_start_matches('/'))?;
        let (path_issuer, name) = match path.split_once(':') {
            Some((issuer, name)) => (Some(issuer.to_string()), name.to_string()),
            None => (None, path),
        };

        let secret = parse_b32_key(params.get("secret").ok_or(UriError::Missing("secret"))?)?;
        let hash_algorithm: HashAlgorithm = match params.get("algorithm") {
            Some(a) => a.parse().map_err(|_| UriError::Invalid {
                field: "algorithm",
                value: a.clone(),
            })?,
            None => HashAlgorithm::Sha1,
        };

        let mut data = Self {
            name,
            oath_type,
            hash_algorithm,
            secret,
            digits: numeric_param(&params, "digits", DEFAULT_DIGITS)?,
            period: numeric_param(&params, "period", DEFAULT_PERIOD)?,
            counter: numeric_param(&params, "counter", 0)?,
            issuer: params.get("issuer").cloned().or(path_issuer),
        };

        // Steam URIs advertise 5 digits; the code is derived from the full response anyway.
        if data.is_steam() && data.digits == 5 {
            data.digits = 6;
        }
        if !DIGITS_RANGE.contains(&data.digits) {
            return Err(UriError::Invalid {
                field: "digits",
                value: data.digits.to_string(),
            });
        }
        Ok(data)
    }
}

fn numeric_param<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    field: &'static str,
    default: T,
) -> Result<T, UriError> {
    match params.get(field) {
        Some(v) => v.parse().map_err(|_| UriError::Invalid { field, value: v.clone() }),
        None => Ok(default),
    }
}

fn percent_decode(s: &str) -> Result<String, UriError> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| UriError::Malformed(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_b32_unpadded_lowercase_with_spaces() {
        assert_eq!(parse_b32_key("mzxw 6ytb oi").unwrap(), b"foobar");
        assert_eq!(parse_b32_key("MZXW6YTBOI======").unwrap(), b"foobar");
        assert_eq!(parse_b32_key("f5up4ub3dw").unwrap().len(), 6);
        assert_eq!(parse_b32_key("not base32!"), Err(UriError::Secret));
    }

    #[test]
    fn test_parse_full_uri() {
        let data = CredentialData::parse_uri(
            "otpauth://totp/Example:alice%40example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example&algorithm=SHA256&digits=8&period=60",
        )
        .unwrap();
        assert_eq!(data.name, "alice@example.com");
        assert_eq!(data.issuer.as_deref(), Some("Example"));
        assert_eq!(data.oath_type, OathType::Totp);
        assert_eq!(data.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(data.digits, 8);
        assert_eq!(data.period, 60);
        assert_eq!(data.counter, 0);
        assert_eq!(data.id().to_string(), "60/Example:alice@example.com");
    }

    #[test]
    fn test_issuer_param_overrides_path() {
        let data =
            CredentialData::parse_uri("otpauth://hotp/Path:bob?secret=MZXW6YTBOI&issuer=Param&counter=7")
                .unwrap();
        assert_eq!(data.issuer.as_deref(), Some("Param"));
        assert_eq!(data.name, "bob");
        assert_eq!(data.oath_type, OathType::Hotp);
        assert_eq!(data.counter, 7);
    }

    #[test]
    fn test_defaults_without_issuer() {
        let data = CredentialData::parse_uri("otpauth://totp/carol?secret=MZXW6YTBOI").unwrap();
        assert_eq!(data.issuer, None);
        assert_eq!(data.digits, DEFAULT_DIGITS);
        assert_eq!(data.period, DEFAULT_PERIOD);
        assert_eq!(data.hash_algorithm, HashAlgorithm::Sha1);
    }

    #[test]
    fn test_rejects_bad_uris() {
        assert!(matches!(
            CredentialData::parse_uri("https://totp/x?secret=MZXW6YTBOI"),
            Err(UriError::Scheme(_))
        ));
        assert_eq!(
            CredentialData::parse_uri("otpauth://totp/x").unwrap_err(),
            UriError::Missing("secret")
        );
        assert!(matches!(
            CredentialData::parse_uri("otpauth://motp/x?secret=MZXW6YTBOI"),
            Err(UriError::Invalid { field: "type", .. })
        ));
        assert!(matches!(
            CredentialData::parse_uri("otpauth://totp/x?secret=MZXW6YTBOI&digits=six"),
            Err(UriError::Invalid { field: "digits", .. })
        ));
        assert!(matches!(CredentialData::parse_uri("not a uri"), Err(UriError::Malformed(_))));
    }

    #[test]
    fn test_digits_outside_token_range_rejected() {
        for digits in ["0", "5", "9", "20", "255"] {
            let uri = format!("otpauth://totp/x?secret=MZXW6YTBOI&digits={digits}");
            assert_eq!(
                CredentialData::parse_uri(&uri).unwrap_err(),
                UriError::Invalid { field: "digits", value: digits.to_string() },
                "digits={digits}"
            );
        }
    }

    #[test]
    fn test_steam_five_digits_become_six() {
        let steam =
            CredentialData::parse_uri("otpauth://totp/Steam:g?secret=MZXW6YTBOI&digits=5").unwrap();
        assert!(steam.is_steam());
        assert_eq!(steam.digits, 6);

        // Only Steam TOTP gets the fix-up
        assert!(matches!(
            CredentialData::parse_uri("otpauth://hotp/Steam:g?secret=MZXW6YTBOI&digits=5"),
            Err(UriError::Invalid { field: "digits", .. })
        ));
    }
}
