//! Ember client library.
//!
//! What a chat front end needs on top of the relay protocol: a
//! [`RoomSession`] owning the derived key and credentials for one room,
//! and a [`Timeline`] that keeps the message list in server order while
//! local sends are echoed optimistically. All encryption and decryption
//! happens here; the relay only ever carries sealed blobs.
//!
//! The `transport` feature adds [`ApiClient`] (HTTP) and
//! [`Subscription`] (WebSocket) for talking to a live relay. The core
//! stays transport-free so front ends can bring their own plumbing.

pub mod error;
pub mod session;
pub mod timeline;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::ClientError;
pub use session::RoomSession;
pub use timeline::{DecryptedMessage, PendingEcho, Timeline};

#[cfg(feature = "transport")]
pub use transport::{ApiClient, Subscription};
