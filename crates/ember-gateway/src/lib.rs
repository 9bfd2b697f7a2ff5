//! Live event delivery over WebSocket.
//!
//! The [`Dispatcher`] fans relay events out to every socket subscribed to
//! a room; [`connection::serve_room_socket`] drives one subscribed socket
//! from `Ready` until close.

pub mod connection;
pub mod dispatcher;

pub use dispatcher::Dispatcher;
