// ABOUTME: Bearer token generation and hashing
// ABOUTME: Tokens are random alphanumeric strings; sessions are keyed by their SHA-256 hex digest

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

pub const TOKEN_LENGTH: usize = 48;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
