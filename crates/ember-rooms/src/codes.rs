use rand::Rng;

/// Code symbols: uppercase letters and digits, minus the four glyphs
/// people misread over the phone (`0`/`O`, `1`/`I`).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LEN: usize = 6;

/// Six symbols from the 32-symbol alphabet.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for storage, lookup, and client-side key
/// derivation: trimmed and uppercased.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_32_symbols_without_lookalikes() {
        assert_eq!(CODE_ALPHABET.len(), 32);
        for banned in [b'0', b'O', b'1', b'I'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
    }

    #[test]
    fn generated_codes_validate() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(is_valid_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_code("  ab2cd3\n"), "AB2CD3");
        assert_eq!(normalize_code("AB2CD3"), "AB2CD3");
    }

    #[test]
    fn validation_rejects_wrong_length_and_symbols() {
        assert!(!is_valid_code("AB2CD"));
        assert!(!is_valid_code("AB2CD34"));
        assert!(!is_valid_code("AB2CD0"));
        assert!(!is_valid_code("ab2cd3"));
        assert!(is_valid_code("AB2CD3"));
    }
}
