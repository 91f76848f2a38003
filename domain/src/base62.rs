//! Base62 alphabet used for short code generation.

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Returns the base62 alphabet as bytes: digits, lowercase, then uppercase.
pub fn alphabet() -> &'static [u8] {
    &ALPHABET[..]
}

/// True when every character of `s` belongs to the alphabet.
#[cfg(test)]
pub(crate) fn is_base62(s: &str) -> bool {
    s.bytes().all(|b| ALPHABET.contains(&b))
}
