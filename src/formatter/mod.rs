//! Line formatting for console output.
//!
//! [`LogLine`] replaces positional overloading with three explicit shapes: a
//! bare message, a namespaced message, or the full namespace, level, message
//! and elapsed time. [`LineFormatter`] renders a line into the
//! `[percy] message` form with ANSI colouring.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::colors::Color;

const LABEL: &str = "percy";

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhttps?://[^\s/$.?#].[^\s]*\b").expect("valid url regex")
});

/// The pieces of a line to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub namespace: Option<&'a str>,
    pub level: Option<&'a str>,
    pub message: &'a str,
    pub elapsed_ms: Option<i64>,
}

impl<'a> LogLine<'a> {
    /// A bare message with no namespace or level.
    pub fn message(message: &'a str) -> Self {
        Self {
            namespace: None,
            level: None,
            message,
            elapsed_ms: None,
        }
    }

    /// A message attributed to `namespace`, without level colouring.
    pub fn namespaced(namespace: &'a str, message: &'a str) -> Self {
        Self {
            namespace: Some(namespace),
            ..Self::message(message)
        }
    }

    /// Every field supplied.
    pub fn full(namespace: &'a str, level: &'a str, message: &'a str, elapsed_ms: Option<i64>) -> Self {
        Self {
            namespace: Some(namespace),
            level: Some(level),
            message,
            elapsed_ms,
        }
    }
}

/// Renders [`LogLine`] values.
///
/// In debug mode the label carries the namespace and an elapsed-time suffix is
/// appended when one is supplied.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFormatter {
    pub debug: bool,
}

impl LineFormatter {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn format(&self, line: &LogLine<'_>) -> String {
        let mut label = LABEL.to_owned();
        let mut suffix = String::new();

        if self.debug {
            if let Some(ns) = line.namespace.filter(|ns| !ns.is_empty()) {
                label.push(':');
                label.push_str(ns);
            }
            if let Some(elapsed) = line.elapsed_ms {
                suffix = format!(" {}", Color::Grey.paint(&format!("({elapsed}ms)")));
            }
        }

        let message = match line.level {
            Some("error") => Color::Red.paint(line.message),
            Some("warn") => Color::Yellow.paint(line.message),
            Some("info" | "debug") => URL
                .replace(line.message, |caps: &regex::Captures<'_>| {
                    Color::Blue.paint(&caps[0])
                })
                .into_owned(),
            _ => line.message.to_owned(),
        };

        format!("[{}] {message}{suffix}", Color::Magenta.paint(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> String {
        format!("[{}]", Color::Magenta.paint(text))
    }

    #[test]
    fn bare_message_has_plain_label() {
        let out = LineFormatter::new(true).format(&LogLine::message("hello"));
        assert_eq!(out, format!("{} hello", label("percy")));
    }

    #[test]
    fn namespace_only_shown_in_debug_mode() {
        let line = LogLine::namespaced("cli", "hello");
        assert_eq!(
            LineFormatter::new(false).format(&line),
            format!("{} hello", label("percy"))
        );
        assert_eq!(
            LineFormatter::new(true).format(&line),
            format!("{} hello", label("percy:cli"))
        );
    }

    #[test]
    fn errors_are_red_and_warnings_yellow() {
        let fmt = LineFormatter::default();
        assert_eq!(
            fmt.format(&LogLine::full("ns", "error", "bad", None)),
            format!("{} {}", label("percy"), Color::Red.paint("bad"))
        );
        assert_eq!(
            fmt.format(&LogLine::full("ns", "warn", "careful", None)),
            format!("{} {}", label("percy"), Color::Yellow.paint("careful"))
        );
    }

    #[test]
    fn only_first_url_is_blue() {
        let fmt = LineFormatter::default();
        let out = fmt.format(&LogLine::full(
            "ns",
            "info",
            "see https://percy.io/a and http://b.example",
            None,
        ));
        assert_eq!(
            out,
            format!(
                "{} see {} and http://b.example",
                label("percy"),
                Color::Blue.paint("https://percy.io/a")
            )
        );
    }

    #[test]
    fn elapsed_suffix_in_debug_mode_only() {
        let line = LogLine::full("ns", "debug", "tick", Some(12));
        assert_eq!(
            LineFormatter::new(true).format(&line),
            format!("{} tick {}", label("percy:ns"), Color::Grey.paint("(12ms)"))
        );
        assert_eq!(
            LineFormatter::new(false).format(&line),
            format!("{} tick", label("percy"))
        );
    }
}
