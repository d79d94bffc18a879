//! Remote log bridge.
//!
//! A logger can mirror its output into a collector running in another
//! process. The bridge defines the JSON frames exchanged with the peer, the
//! [`RemoteSocket`] abstraction a connection must provide, a WebSocket
//! implementation of it, and the race between a connecting socket and the
//! connect deadline. The logger side of the handshake lives in
//! [`crate::logger`].

mod config;
pub(crate) mod connect;
pub mod protocol;
pub(crate) mod socket;
mod transport;


use std::io;

use thiserror::Error;

pub use config::{
    BridgeConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_FRAME_SIZE, DEFAULT_WRITE_TIMEOUT,
};
pub use protocol::{EnvSync, Frame, RemoteLog};
pub use socket::{MessageHandler, RemoteSocket, Teardown};
pub use transport::WsSocket;

/// Errors raised while establishing or using a remote connection.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The connect deadline elapsed before the socket opened.
    #[error("socket connection timed out")]
    Timeout,
    /// The socket reported an error instead of opening.
    #[error("socket connection failed")]
    ConnectionFailed,
    /// The peer did not complete a WebSocket opening handshake.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
    /// The socket is no longer open.
    #[error("socket is closed")]
    Closed,
    /// A frame exceeded the configured maximum size.
    #[error("frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),
    /// A frame could not be encoded or decoded.
    #[error("invalid frame: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[source] Box<tungstenite::Error>),
    #[error(transparent)]
    Io(#[from] io::Error),
}
