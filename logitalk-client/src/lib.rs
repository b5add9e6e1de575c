//! Client side of the LogiTalk chat
//!
//! A [`Session`] owns the user's identity and a single [`Connection`] to the
//! server. Everything the user should see is delivered as a
//! [`DisplayEvent`](logitalk_protocol::DisplayEvent) on the channel handed to
//! [`Session::connect`].
mod connection;
mod error;
mod session;

pub use connection::{
    ConnectOptions, Connection, ConnectionState, EventSender, READ_CHUNK_SIZE,
};
pub use error::{ConnectError, SendError};
pub use session::Session;
