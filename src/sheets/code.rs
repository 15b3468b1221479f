//! Access code issuance.
//!
//! Codes are six base-36 characters, upper-cased. Uniqueness is not checked
//! here; the sheet insert's unique constraint decides.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

pub const CODE_LEN: usize = 6;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draws a fresh code from the thread-local RNG.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for storage and lookups.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_well_formed(code: &str) -> bool {
    lazy_static! {
        static ref CODE_RE: Regex = Regex::new(r"^[0-9A-Z]{6}$").unwrap();
    }
    CODE_RE.is_match(code)
}
