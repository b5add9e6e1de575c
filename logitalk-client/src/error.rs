use std::time::Duration;
use thiserror::Error;

/// Failure to establish a connection. Never retried.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("could not connect: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not send join announcement: {0}")]
    Greeting(#[source] logitalk_protocol::Error),
}

/// Failure to deliver an outgoing frame
#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,

    #[error("write failed: {0}")]
    Write(#[from] logitalk_protocol::Error),
}
