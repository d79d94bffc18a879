use crate::{
    formatter::LogLine,
    level::LogLevel,
    log_record::{Message, Meta},
};

use super::Logger;

/// Logging functions bound to one namespace.
///
/// Groups are cheap to clone and share the state of the [`Logger`] they were
/// created from.
#[derive(Clone, Debug)]
pub struct Group {
    logger: Logger,
    namespace: String,
}

impl Group {
    pub(super) fn new(logger: Logger, namespace: String) -> Self {
        Self { logger, namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn log(&self, level: LogLevel, message: impl Into<Message>, meta: Meta) {
        self.logger.log(&self.namespace, level, message, meta);
    }

    pub fn debug(&self, message: impl Into<Message>) {
        self.debug_with(message, Meta::new());
    }

    pub fn debug_with(&self, message: impl Into<Message>, meta: Meta) {
        self.log(LogLevel::Debug, message, meta);
    }

    pub fn info(&self, message: impl Into<Message>) {
        self.info_with(message, Meta::new());
    }

    pub fn info_with(&self, message: impl Into<Message>, meta: Meta) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn warn(&self, message: impl Into<Message>) {
        self.warn_with(message, Meta::new());
    }

    pub fn warn_with(&self, message: impl Into<Message>, meta: Meta) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn error(&self, message: impl Into<Message>) {
        self.error_with(message, Meta::new());
    }

    pub fn error_with(&self, message: impl Into<Message>, meta: Meta) {
        self.log(LogLevel::Error, message, meta);
    }

    /// Warn once per distinct `message` for the logger's lifetime.
    pub fn deprecated(&self, message: &str) {
        self.logger.deprecated(&self.namespace, message, Meta::new());
    }

    pub fn should_log(&self, level: &str) -> bool {
        self.logger.should_log(&self.namespace, level)
    }

    pub fn progress(&self, message: Option<&str>, persist: bool) {
        self.logger.progress(&self.namespace, message, persist);
    }

    /// Format `message` as this namespace would print it, without level
    /// colouring.
    pub fn format(&self, message: &str) -> String {
        self.logger.format(&LogLine::namespaced(&self.namespace, message))
    }

    /// Format with every field supplied.
    pub fn format_full(&self, level: LogLevel, message: &str, elapsed_ms: Option<i64>) -> String {
        self.logger.format(&LogLine::full(
            &self.namespace,
            level.as_str(),
            message,
            elapsed_ms,
        ))
    }

    pub fn loglevel(&self) -> LogLevel {
        self.logger.loglevel()
    }
}
