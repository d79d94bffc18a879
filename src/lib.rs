//! Logging and control-plane utilities shared by Percy SDKs.
//!
//! The [`Logger`] is a namespaced, level-filtered console logger that keeps
//! every call in memory and can forward its output to a collector in another
//! process. [`PercyClient`] talks to the local Percy CLI API.

pub mod bridge;
pub mod client;
pub mod colors;
pub mod config;
pub mod filters;
pub mod formatter;
pub mod level;
pub mod log_record;
pub mod logger;
pub mod sink;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use bridge::{
    BridgeConfig, BridgeError, EnvSync, Frame, RemoteLog, RemoteSocket, Teardown, WsSocket,
};
pub use colors::Color;
pub use client::{ClientConfig, ClientError, CoreVersion, PercyClient, PercyResponse};
pub use config::LoggerConfig;
pub use filters::{FilterError, NamespaceFilter};
pub use formatter::{LineFormatter, LogLine};
pub use level::{LogLevel, ParseLevelError};
pub use log_record::{ErrorPayload, LogRecord, Message, Meta};
pub use logger::{Group, LOGGER_NAMESPACE, Logger};
pub use sink::{ClearLine, OutputStream, SinkWriter, WriterStream};
