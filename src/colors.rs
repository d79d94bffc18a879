//! ANSI colour helpers.
//!
//! [`Color::paint`] wraps every line of a string in a foreground colour escape
//! and a reset. [`console_directives`] performs the inverse mapping for
//! consoles that take CSS-like style arguments instead of escapes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Named colours used by the formatter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Grey,
}

const RESET: &str = "\u{1b}[39m";

static LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^.*$").expect("valid line regex"));

// Matches CSI and OSC escape sequences.
static ANSI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[\x1b\x{9b}][\[\]()#;?]*",
        r"((?:(?:[a-zA-Z\d]*(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)",
        r"|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-ntqry=><~]))",
    ))
    .expect("valid ansi regex")
});

impl Color {
    pub const ALL: [Color; 6] = [
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Grey,
    ];

    /// SGR code (without the leading `ESC[`).
    pub fn code(self) -> &'static str {
        match self {
            Color::Red => "91m",
            Color::Green => "32m",
            Color::Yellow => "93m",
            Color::Blue => "34m",
            Color::Magenta => "95m",
            Color::Grey => "90m",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Grey => "grey",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Colour each line of `text`.
    pub fn paint(self, text: &str) -> String {
        LINE.replace_all(text, |caps: &regex::Captures<'_>| {
            format!("\u{1b}[{}{}{RESET}", self.code(), &caps[0])
        })
        .into_owned()
    }
}

/// Replace every escape sequence in `text` with `%c` and return the matching
/// `color:<name>` directives in order. Unknown sequences (including resets)
/// map to `color:inherit`.
pub fn console_directives(text: &str) -> (String, Vec<String>) {
    let mut styles = Vec::new();
    let stripped = ANSI.replace_all(text, |caps: &regex::Captures<'_>| {
        let name = Color::from_code(&caps[1]).map_or("inherit", Color::name);
        styles.push(format!("color:{name}"));
        "%c"
    });
    (stripped.into_owned(), styles)
}
