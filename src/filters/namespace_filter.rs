//! Namespace include/exclude patterns compiled from a debug string.

use once_cell::sync::Lazy;
use regex::Regex;

use super::FilterError;

static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").expect("valid split regex"));
static WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r":?\*").expect("valid wildcard regex"));

/// Compiled namespace patterns.
///
/// A namespace passes when it matches at least one include pattern and no
/// exclude pattern. Exclusion always wins regardless of how specific the
/// include is.
#[derive(Clone, Debug)]
pub struct NamespaceFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    source: Option<String>,
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self {
            include: vec![Regex::new("^.*?$").expect("valid catch-all regex")],
            exclude: Vec::new(),
            source: None,
        }
    }
}

impl NamespaceFilter {
    /// Compile a debug string such as `"cli:*,-cli:secret"`.
    ///
    /// Returns `Ok(None)` when the string holds no tokens.
    pub fn parse(source: &str) -> Result<Option<Self>, FilterError> {
        let mut filter = Self {
            include: Vec::new(),
            exclude: Vec::new(),
            source: Some(source.to_owned()),
        };
        for token in TOKEN_SPLIT.split(source).filter(|t| !t.is_empty()) {
            let (negated, body) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let pattern = compile(body).map_err(|err| FilterError::InvalidPattern {
                token: token.to_owned(),
                source: Box::new(err),
            })?;
            if negated {
                filter.exclude.push(pattern);
            } else {
                filter.include.push(pattern);
            }
        }
        if filter.include.is_empty() && filter.exclude.is_empty() {
            return Ok(None);
        }
        Ok(Some(filter))
    }

    /// The debug string this filter was compiled from, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn matches(&self, namespace: &str) -> bool {
        !self.exclude.iter().any(|re| re.is_match(namespace))
            && self.include.iter().any(|re| re.is_match(namespace))
    }
}

fn compile(token: &str) -> Result<Regex, regex::Error> {
    let expanded = WILDCARD.replace_all(token, |caps: &regex::Captures<'_>| {
        if caps[0].starts_with(':') {
            ":?.*?"
        } else {
            ".*?"
        }
    });
    Regex::new(&format!("^{expanded}$"))
}
