use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;

/// Entropy per session token: 256 bits.
pub const TOKEN_BYTES: usize = 32;

/// Generate a session token: 32 bytes from the OS RNG as lowercase hex.
///
/// The token is an anonymous bearer capability for one participant slot of
/// one room. Collision probability is negligible at this entropy, but the
/// store's uniqueness constraint still backstops it: a collision surfaces
/// as a retryable conflict, never a silent overwrite.
pub fn issue_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn token_is_64_lowercase_hex_chars() {
        let token = issue_session_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let batch: HashSet<String> = (0..1000).map(|_| issue_session_token()).collect();
        assert_eq!(batch.len(), 1000);
    }
}
