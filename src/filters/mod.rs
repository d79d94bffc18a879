//! Filtering components for log calls.
//!
//! Provides the [`NamespaceFilter`] compiled from a debug string and
//! [`should_log`], the combined level and namespace check used by the logger.

use thiserror::Error;

use crate::level::LogLevel;

pub mod namespace_filter;

pub use namespace_filter::NamespaceFilter;

/// Errors that may occur while compiling a debug string.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A token did not compile to a valid pattern.
    #[error("invalid namespace pattern `{token}`: {source}")]
    InvalidPattern {
        token: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Return `true` if a call at `level` in `namespace` passes `threshold` and
/// `namespaces`. Unknown levels never pass.
pub fn should_log(
    threshold: LogLevel,
    namespaces: &NamespaceFilter,
    namespace: &str,
    level: &str,
) -> bool {
    LogLevel::parse_opt(level).is_some_and(|lvl| lvl >= threshold) && namespaces.matches(namespace)
}
