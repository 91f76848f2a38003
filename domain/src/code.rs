//! Short code generation strategies.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::Rng;

use crate::base62::alphabet;
use crate::{CodeGenerator, LinkSet, ShortCode};

/// Length of generated short codes.
pub const CODE_LEN: usize = 6;

/// Random draws attempted before falling back to the time hash.
pub const MAX_ATTEMPTS: usize = 10;

/// Draws codes uniformly from the base62 alphabet using the OS CSPRNG.
///
/// After `attempts` collisions with the existing set it falls back to a hash
/// of the current time, which is not guaranteed to be free.
#[derive(Clone, Copy, Debug)]
pub struct RandomCodeGenerator {
    len: usize,
    attempts: usize,
}

impl RandomCodeGenerator {
    pub fn new(len: usize, attempts: usize) -> Self {
        Self {
            len: len.max(1),
            attempts,
        }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(CODE_LEN, MAX_ATTEMPTS)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, existing: &LinkSet) -> ShortCode {
        generate_with(
            existing,
            self.attempts,
            || random_code(self.len),
            || time_hash_code(self.len),
        )
    }
}

/// Retry loop shared by generators: take the first drawn code not present in
/// `existing`, otherwise whatever `fallback` yields.
pub fn generate_with<D, F>(existing: &LinkSet, attempts: usize, mut draw: D, fallback: F) -> ShortCode
where
    D: FnMut() -> String,
    F: FnOnce() -> String,
{
    for _ in 0..attempts {
        let code = ShortCode(draw());
        if !existing.contains_code(&code) {
            return code;
        }
    }
    ShortCode(fallback())
}

/// One code of `len` characters, each sampled independently.
pub fn random_code(len: usize) -> String {
    let chars = alphabet();
    let mut rng = OsRng;
    (0..len)
        .map(|_| chars[rng.gen_range(0..chars.len())] as char)
        .collect()
}

/// Hex digest of the current time in nanoseconds, truncated to `len`.
pub fn time_hash_code(len: usize) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    let digest = blake3::hash(nanos.to_string().as_bytes());
    let hex = digest.to_hex();
    hex.as_str()[..len.clamp(1, hex.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base62::is_base62;
    use crate::LinkRecord;

    fn set_with(codes: &[&str]) -> LinkSet {
        codes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                LinkRecord::new(
                    ShortCode::new(*c).unwrap(),
                    format!("http://e.example/{i}"),
                    SystemTime::UNIX_EPOCH,
                )
            })
            .collect()
    }

    #[test]
    fn random_codes_have_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let code = random_code(CODE_LEN);
            assert_eq!(code.len(), CODE_LEN);
            assert!(is_base62(&code));
        }
    }

    #[test]
    fn skips_colliding_draws() {
        let existing = set_with(&["aaaaaa", "bbbbbb"]);
        let mut draws = vec!["aaaaaa", "bbbbbb", "cccccc"].into_iter();
        let code = generate_with(
            &existing,
            MAX_ATTEMPTS,
            || draws.next().unwrap_or("zzzzzz").to_string(),
            || "fallbk".to_string(),
        );
        assert_eq!(code.as_str(), "cccccc");
    }

    #[test]
    fn falls_back_to_time_hash_after_exhausting_attempts() {
        let existing = set_with(&["aaaaaa"]);
        let mut calls = 0;
        let code = generate_with(
            &existing,
            MAX_ATTEMPTS,
            || {
                calls += 1;
                "aaaaaa".to_string()
            },
            || time_hash_code(CODE_LEN),
        );
        assert_eq!(calls, MAX_ATTEMPTS);
        assert_eq!(code.as_str().len(), CODE_LEN);
        assert!(code.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generator_avoids_existing_codes() {
        let gen = RandomCodeGenerator::default();
        let mut set = LinkSet::new();
        for i in 0..200 {
            let code = gen.generate(&set);
            assert!(!set.contains_code(&code));
            set.push(LinkRecord::new(
                code,
                format!("http://e.example/{i}"),
                SystemTime::UNIX_EPOCH,
            ))
            .unwrap();
        }
        assert_eq!(set.len(), 200);
    }
}
