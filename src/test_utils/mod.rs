//! In-memory stand-ins for output streams and remote sockets.
//!
//! Compiled for the crate's own tests and, through the `test-util` feature,
//! for integration tests.

mod channel_socket;
mod shared_buffer;

pub use channel_socket::ChannelSocket;
pub use shared_buffer::SharedBuf;
