//! Steam Guard codes: five characters from a reduced alphabet instead of digits.

use super::dynamic_truncate;

const STEAM_CHARS: &[u8] = b"23456789BCDFGHJKMNPQRTVWXY";
const STEAM_CODE_LEN: usize = 5;

/// Format a full (untruncated) HMAC response as a Steam code.
pub fn format_steam(digest: &[u8]) -> Option<String> {
    let mut value = dynamic_truncate(digest)? as usize;
    let mut code = String::with_capacity(STEAM_CODE_LEN);
    for _ in 0..STEAM_CODE_LEN {
        code.push(char::from(STEAM_CHARS[value % STEAM_CHARS.len()]));
        value /= STEAM_CHARS.len();
    }
    Some(code)
}
