use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::keys::RoomKey;

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// What a client renders in place of a payload it cannot decrypt. The
/// failure is local and non-fatal; the rest of the room keeps working.
pub const DECRYPT_SENTINEL: &str = "message could not be decrypted";

/// Decryption failures are fail-closed: no partial plaintext, no panics.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    /// Blob shorter than nonce + tag, too short to contain a message.
    #[error("ciphertext too short")]
    TooShort,

    /// Tag verification failed: wrong key, tampered data, or garbage.
    /// Carries no detail about which.
    #[error("decryption failed")]
    Failed,

    /// The base64 wrapping was malformed.
    #[error("invalid ciphertext encoding")]
    Encoding,
}

/// Encrypt a payload with AES-256-GCM under the room key.
///
/// A fresh random 96-bit nonce is drawn from the OS RNG per call and
/// prepended, so the wire format is `nonce(12) || ciphertext+tag`.
pub fn encrypt(key: &RoomKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::Failed)?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `nonce || ciphertext+tag` blob.
///
/// Any tag failure, malformed input, or wrong key yields a typed
/// [`CipherError`], never a panic and never partial plaintext.
pub fn decrypt(key: &RoomKey, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CipherError::TooShort);
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(&blob[..NONCE_SIZE]);

    cipher
        .decrypt(nonce, &blob[NONCE_SIZE..])
        .map_err(|_| CipherError::Failed)
}

/// Encode a cipher blob for the JSON boundary.
pub fn encode_blob(blob: &[u8]) -> String {
    BASE64.encode(blob)
}

/// Decode a base64 cipher blob received from the relay.
pub fn decode_blob(encoded: &str) -> Result<Vec<u8>, CipherError> {
    BASE64.decode(encoded).map_err(|_| CipherError::Encoding)
}
