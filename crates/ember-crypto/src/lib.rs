//! Ember crypto library.
//!
//! Everything a participant needs to keep the relay blind: a room-scoped
//! key derived from the shared code, an AEAD cipher for message payloads,
//! and the session-token generator. Servers compile this crate with only
//! the `server` feature and get the token issuer alone; the cipher and
//! key derivation never link into relay binaries, so the relay could not
//! decrypt traffic even by accident.
//!
//! Trust boundary: the room code is the only secret. Anyone holding the
//! code can derive the key, so the channel is exactly as confidential as
//! the code. There is no key exchange to strengthen it.

#[cfg(feature = "client")]
pub mod encrypt;

#[cfg(feature = "client")]
pub mod keys;

pub mod token;

#[cfg(feature = "client")]
pub use encrypt::{CipherError, DECRYPT_SENTINEL, decrypt, decode_blob, encode_blob, encrypt};
#[cfg(feature = "client")]
pub use keys::{RoomKey, derive_room_key};
pub use token::issue_session_token;
