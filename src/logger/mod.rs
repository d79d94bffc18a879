//! Core logger implementation.
//!
//! [`Logger`] is a cheaply cloneable handle to state shared by every
//! [`Group`]: the level threshold, namespace filter, log store, deprecation
//! set and console sinks. Each call is stored and, when the level and
//! namespace allow it, formatted and written. While a remote peer is
//! connected, calls are forwarded to it instead.

mod group;
mod remote;

use std::collections::HashSet;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use crate::{
    bridge::{EnvSync, RemoteSocket},
    config::LoggerConfig,
    filters::{self, FilterError, NamespaceFilter},
    formatter::{LineFormatter, LogLine},
    level::LogLevel,
    log_record::{LogRecord, Message, Meta},
    sink::SinkWriter,
    store::LogStore,
};

pub use group::Group;

/// Namespace used for the logger's own diagnostics.
pub const LOGGER_NAMESPACE: &str = "logger";

struct LoggerState {
    level: LogLevel,
    namespaces: NamespaceFilter,
    store: LogStore,
    deprecations: HashSet<String>,
    last_log: Option<i64>,
    sink: SinkWriter,
    env: EnvSync,
}

impl LoggerState {
    fn should_log(&self, namespace: &str, level: &str) -> bool {
        filters::should_log(self.level, &self.namespaces, namespace, level)
    }

    fn formatter(&self) -> LineFormatter {
        LineFormatter::new(self.level == LogLevel::Debug)
    }

    fn apply_debug(&mut self, source: &str) -> Result<(), FilterError> {
        if self.namespaces.source() == Some(source) {
            return Ok(());
        }
        if let Some(filter) = NamespaceFilter::parse(source)? {
            self.level = LogLevel::Debug;
            self.namespaces = filter;
        }
        Ok(())
    }

    /// Apply the logging environment. A debug string wins over a level.
    fn apply_env(&mut self) {
        if let Some(debug) = self.env.debug.clone() {
            if let Err(err) = self.apply_debug(&debug) {
                warn!("Logger: ignoring debug filter: {err}");
            }
        } else if let Some(level) = self.env.loglevel.as_deref().and_then(LogLevel::parse_opt) {
            self.level = level;
        }
    }
}

pub(crate) struct Inner {
    state: Mutex<LoggerState>,
    remote: Mutex<Option<Arc<dyn RemoteSocket>>>,
}

/// Shared logger context.
///
/// Construct one per process and pass it (or [`Group`]s derived from it) to
/// the code that logs.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    /// Logger writing to the process stdout and stderr.
    pub fn new(config: LoggerConfig) -> Self {
        Self::with_sink(config, SinkWriter::stdio())
    }

    /// Logger configured from `PERCY_DEBUG` and `PERCY_LOGLEVEL`.
    pub fn from_env() -> Self {
        Self::new(LoggerConfig::from_env())
    }

    /// Logger writing to a caller supplied sink.
    pub fn with_sink(config: LoggerConfig, sink: SinkWriter) -> Self {
        let mut state = LoggerState {
            level: LogLevel::default(),
            namespaces: NamespaceFilter::default(),
            store: LogStore::new(),
            deprecations: HashSet::new(),
            last_log: None,
            sink,
            env: EnvSync {
                debug: config.debug().map(str::to_owned),
                loglevel: config.loglevel().map(|l| l.to_string()),
            },
        };
        state.apply_env();
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                remote: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Handle bound to `namespace`.
    pub fn group(&self, namespace: impl Into<String>) -> Group {
        Group::new(self.clone(), namespace.into())
    }

    pub fn loglevel(&self) -> LogLevel {
        self.inner.state.lock().level
    }

    pub fn set_loglevel(&self, level: LogLevel) {
        self.inner.state.lock().level = level;
    }

    /// Replace the namespace filter with one compiled from `namespaces`.
    ///
    /// A non-empty filter also lowers the level to `debug`. Passing the
    /// current source string again, or a blank string, changes nothing. On
    /// error the previous filter and level remain.
    pub fn set_debug(&self, namespaces: &str) -> Result<(), FilterError> {
        self.inner.state.lock().apply_debug(namespaces)
    }

    /// The debug string of the active namespace filter, if any.
    pub fn debug_source(&self) -> Option<String> {
        self.inner.state.lock().namespaces.source().map(str::to_owned)
    }

    /// Logging environment, including values merged from a remote peer.
    pub fn env(&self) -> EnvSync {
        self.inner.state.lock().env.clone()
    }

    /// Merge `update` into the logging environment and reapply it.
    pub(crate) fn sync_env(&self, update: EnvSync) {
        let mut state = self.inner.state.lock();
        state.env.merge(update);
        state.apply_env();
    }

    /// Stored records matching `predicate`, oldest first.
    pub fn query(&self, predicate: impl Fn(&LogRecord) -> bool) -> Vec<Arc<LogRecord>> {
        self.inner.state.lock().store.query(predicate)
    }

    pub fn format(&self, line: &LogLine<'_>) -> String {
        self.inner.state.lock().formatter().format(line)
    }

    /// Return `true` if a call at `level` in `namespace` would be written.
    /// Unknown levels return `false`.
    pub fn should_log(&self, namespace: &str, level: &str) -> bool {
        self.inner.state.lock().should_log(namespace, level)
    }

    /// Show, replace or (with `None`) clear the progress line.
    pub fn progress(&self, namespace: &str, message: Option<&str>, persist: bool) {
        let mut state = self.inner.state.lock();
        if !state.should_log(namespace, LogLevel::Info.as_str()) {
            return;
        }
        let formatted = message
            .filter(|m| !m.is_empty())
            .map(|m| state.formatter().format(&LogLine::namespaced(namespace, m)));
        state.sink.show_progress(formatted, persist);
    }

    /// Warn about `message` the first time it is seen.
    pub fn deprecated(&self, namespace: &str, message: &str, meta: Meta) {
        let fresh = self.inner.state.lock().deprecations.insert(message.to_owned());
        if fresh {
            self.log(namespace, LogLevel::Warn, format!("Warning: {message}"), meta);
        }
    }

    pub fn log(&self, namespace: &str, level: LogLevel, message: impl Into<Message>, meta: Meta) {
        self.log_entry(namespace, level.as_str(), message.into(), meta);
    }

    /// Shared by local callers and peers, whose level strings may be unknown.
    pub(crate) fn log_entry(&self, namespace: &str, level: &str, message: Message, meta: Meta) {
        if let Some(socket) = self.remote_socket() {
            self.forward(&socket, namespace, level, message, meta);
            return;
        }

        let is_error = message.as_error().is_some() && matches!(level, "error" | "debug");
        let text = match &message {
            Message::Text(text) => text.clone(),
            Message::Error(err) if is_error => err.stack.clone().unwrap_or_else(|| err.message.clone()),
            Message::Error(err) => err.message.clone(),
        };

        let record = Arc::new(LogRecord::new(namespace, level, text, meta));
        let timestamp = record.timestamp;
        let mut state = self.inner.state.lock();
        state.store.record(Arc::clone(&record));

        if !state.should_log(namespace, level) {
            return;
        }
        let Some(parsed) = LogLevel::parse_opt(level) else {
            return;
        };
        let elapsed = timestamp - state.last_log.unwrap_or(timestamp);
        let shown = match &message {
            Message::Error(err) if is_error && state.level != LogLevel::Debug => err.summary(),
            _ => record.message.clone(),
        };
        let display_level = if is_error { "error" } else { level };
        let line = state
            .formatter()
            .format(&LogLine::full(namespace, display_level, &shown, Some(elapsed)));
        state.sink.emit(parsed, &line);
        state.last_log = Some(timestamp);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Logger")
            .field("level", &state.level)
            .field("debug", &state.namespaces.source())
            .field("records", &state.store.len())
            .finish()
    }
}
