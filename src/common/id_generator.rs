// src/common/id_generator.rs
//! Identifier generation
//!
//! Todo ids are UUID v4 so they are unique across users and instances.
//! Opaque one-off values (like the OAuth `state` parameter) use Crockford
//! Base32, which has no ambiguous characters (excludes I, L, O, U).

use rand::Rng;
use uuid::Uuid;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const STATE_LENGTH: usize = 24;

/// Generate a random Crockford Base32 string of specified length
pub fn generate_raw_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Value passed as `state` on the provider redirect
pub fn generate_oauth_state() -> String {
    generate_raw_id(STATE_LENGTH)
}

pub fn generate_todo_id() -> String {
    Uuid::new_v4().to_string()
}
