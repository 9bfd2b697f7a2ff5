use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Application-wide PBKDF2 salt. Fixed on purpose: both participants must
/// derive the same key from the code alone, with no extra exchange.
const ROOM_KEY_SALT: &[u8] = b"ember/room-key/v1";

/// PBKDF2-HMAC-SHA256 iteration count. High enough to slow offline
/// guessing of the 6-character code space, low enough for browser-class
/// clients.
const PBKDF2_ITERATIONS: u32 = 200_000;

pub const KEY_SIZE: usize = 32;

/// A room-scoped AES-256 key. Zeroed when dropped.
pub struct RoomKey([u8; KEY_SIZE]);

impl RoomKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// For tests and interop with externally provisioned keys.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Drop for RoomKey {
    fn drop(&mut self) {
        self.0.fill(0);
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.write_str("RoomKey(..)")
    }
}

/// Derive the symmetric key for a room from its human-shareable code.
///
/// Deterministic and pure: the same code always yields the same key, with
/// no network call and no secret beyond the code itself. The code is
/// normalized (trimmed, uppercased) first so both participants derive the
/// same key regardless of how they typed it.
///
/// Confidentiality rests entirely on code secrecy; see the crate docs.
pub fn derive_room_key(code: &str) -> RoomKey {
    let normalized = code.trim().to_ascii_uppercase();

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        normalized.as_bytes(),
        ROOM_KEY_SALT,
        PBKDF2_ITERATIONS,
        &mut key,
    );
    RoomKey(key)
}
