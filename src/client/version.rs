use std::fmt;

/// Version reported by the Percy CLI in the `x-percy-core-version` header.
///
/// Parts are separated by `.` or `-`. The first three are numeric and default
/// to zero; the fourth and fifth are kept verbatim as prerelease and build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
    source: String,
}

impl Default for CoreVersion {
    fn default() -> Self {
        Self::parse("")
    }
}

impl CoreVersion {
    /// Parse `source`; an empty string reads as `0.0.0`.
    pub fn parse(source: &str) -> Self {
        let source = if source.is_empty() { "0.0.0" } else { source };
        let parts: Vec<&str> = source.split(['.', '-']).collect();
        let number = |i: usize| {
            parts
                .get(i)
                .and_then(|p| p.parse::<u64>().ok())
                .unwrap_or(0)
        };
        let text = |i: usize| parts.get(i).map(|p| (*p).to_owned());
        Self {
            major: number(0),
            minor: number(1),
            patch: number(2),
            prerelease: text(3),
            build: text(4),
            source: source.to_owned(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for CoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
