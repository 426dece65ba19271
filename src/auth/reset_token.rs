use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

pub const RESET_TOKEN_BYTES: usize = 32;
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// A freshly minted verification/reset token. The plaintext goes out by
/// email exactly once; only the digest and expiry are persisted.
#[derive(Debug)]
pub struct ResetToken {
    pub plaintext: String,
    pub hashed: String,
    pub expires_at: OffsetDateTime,
}

pub fn generate() -> ResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    ResetToken {
        hashed: hash_token(&plaintext),
        expires_at: OffsetDateTime::now_utc() + RESET_TOKEN_TTL,
        plaintext,
    }
}

/// Digest used for storage and lookup; recomputed over the presented
/// plaintext when a token comes back.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_is_64_hex_chars() {
        let token = generate();
        assert_eq!(token.plaintext.len(), RESET_TOKEN_BYTES * 2);
        assert!(token.plaintext.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stored_form_is_the_sha256_of_the_plaintext() {
        let token = generate();
        assert_eq!(token.hashed, hash_token(&token.plaintext));
        assert_eq!(token.hashed.len(), 64);
        assert_ne!(token.hashed, token.plaintext);
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn tokens_are_unique() {
        let first = generate();
        let second = generate();
        assert_ne!(first.plaintext, second.plaintext);
    }

    #[test]
    fn expiry_is_about_an_hour_out() {
        let token = generate();
        let remaining = token.expires_at - OffsetDateTime::now_utc();
        assert!(remaining > Duration::minutes(59));
        assert!(remaining <= Duration::hours(1));
    }
}
