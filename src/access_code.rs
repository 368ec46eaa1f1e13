//! Access codes that bind a Telegram account to a pre-created user

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

pub const ACCESS_CODE_LENGTH: usize = 8;
const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

lazy_static! {
    static ref ACCESS_CODE_PATTERN: Regex = Regex::new(r"^[A-Z0-9]{6,10}$").expect("Access code pattern should be valid");
}

/// Generate a random access code
pub fn generate_access_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ACCESS_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..ACCESS_CODE_ALPHABET.len());
            ACCESS_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize user input to the stored code format
pub fn normalize_access_code(input: &str) -> Result<String, &'static str> {
    let code = input.trim().to_uppercase();

    if code.is_empty() {
        return Err("empty");
    }

    if !ACCESS_CODE_PATTERN.is_match(&code) {
        return Err("invalid_format");
    }

    Ok(code)
}
