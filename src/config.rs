//! Logger configuration.
//!
//! [`LoggerConfig`] captures the two environment variables that shape a new
//! logger: `PERCY_DEBUG`, a namespace filter string which also enables debug
//! output, and `PERCY_LOGLEVEL`, the default threshold. When both are set the
//! debug string wins.

use log::warn;

use crate::level::LogLevel;

/// Environment variable holding the namespace filter string.
pub const DEBUG_VAR: &str = "PERCY_DEBUG";
/// Environment variable holding the default log level.
pub const LOGLEVEL_VAR: &str = "PERCY_LOGLEVEL";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    debug: Option<String>,
    loglevel: Option<LogLevel>,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// An unknown `PERCY_LOGLEVEL` value is ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup(DEBUG_VAR).filter(|s| !s.is_empty());
        let loglevel = lookup(LOGLEVEL_VAR)
            .filter(|s| !s.is_empty())
            .and_then(|raw| match raw.parse() {
                Ok(level) => Some(level),
                Err(err) => {
                    warn!("LoggerConfig: ignoring {LOGLEVEL_VAR}: {err}");
                    None
                }
            });
        Self { debug, loglevel }
    }

    pub fn with_debug(mut self, namespaces: impl Into<String>) -> Self {
        self.debug = Some(namespaces.into());
        self
    }

    pub fn with_loglevel(mut self, level: LogLevel) -> Self {
        self.loglevel = Some(level);
        self
    }

    pub fn debug(&self) -> Option<&str> {
        self.debug.as_deref()
    }

    pub fn loglevel(&self) -> Option<LogLevel> {
        self.loglevel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(LoggerConfig::from_lookup(lookup(&[])), LoggerConfig::default());
    }

    #[test]
    fn reads_both_variables() {
        let config = LoggerConfig::from_lookup(lookup(&[
            (DEBUG_VAR, "cli:*"),
            (LOGLEVEL_VAR, "warn"),
        ]));
        assert_eq!(config.debug(), Some("cli:*"));
        assert_eq!(config.loglevel(), Some(LogLevel::Warn));
    }

    #[test]
    fn ignores_blank_and_invalid_values() {
        let config = LoggerConfig::from_lookup(lookup(&[(DEBUG_VAR, ""), (LOGLEVEL_VAR, "loud")]));
        assert_eq!(config, LoggerConfig::default());
    }
}
