//! Password hashing
//!
//! PBKDF2-HMAC-SHA256 with a random salt, encoded as
//! `pbkdf2-sha256$<rounds>$<salt>$<hash>`.

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD as B64};
use hmac::digest::generic_array::GenericArray;
use hmac::digest::{CtOutput, Output};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";

/// Rounds used for new hashes
pub const DEFAULT_ROUNDS: u32 = 10_000;

fn derive_key(password: &str, salt: &str, rounds: u32) -> Output<Sha256> {
    let mut key = Output::<Sha256>::default();
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
    key
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    hash_with_rounds(password, DEFAULT_ROUNDS)
}

pub fn hash_with_rounds(password: &str, rounds: u32) -> String {
    let rounds = rounds.max(1);
    let salt = B64.encode(uuid::Uuid::new_v4().as_bytes());
    let hash = B64.encode(derive_key(password, &salt, rounds));

    format!("{SCHEME}${rounds}${salt}${hash}")
}

/// Check a password against a stored hash.
///
/// Malformed hashes never verify. The final comparison is constant time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    let Ok(expected) = B64.decode(hash) else {
        return false;
    };
    if expected.len() != Output::<Sha256>::default().len() {
        return false;
    }

    let derived = CtOutput::<Sha256>::new(derive_key(password, salt, rounds));
    derived == CtOutput::new(GenericArray::clone_from_slice(&expected))
}
