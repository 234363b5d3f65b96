//! Dotted capability paths (`db.put`, `simulate.keyboardTap`).

use anyhow::{Result, bail};
use std::fmt;

/// Ordered segments below the entry point. The empty path is the root.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CapabilityPath(Vec<String>);

impl CapabilityPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted catalog path. Segments must be non-empty identifiers.
    pub fn parse(dotted: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in dotted.split('.') {
            if segment.is_empty() {
                bail!("capability path '{dotted}' contains an empty segment");
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
            {
                bail!("capability path segment '{segment}' in '{dotted}' is not an identifier");
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    /// Split on dots without validation, mirroring property access.
    pub fn from_dotted(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment: the name a call is mirrored under.
    pub fn terminal(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for CapabilityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_validates_segments() {
        let path = CapabilityPath::parse("simulate.keyboardTap").unwrap();
        assert_eq!(path.segments(), ["simulate", "keyboardTap"]);
        assert_eq!(path.terminal(), Some("keyboardTap"));
        assert_eq!(path.to_string(), "simulate.keyboardTap");

        assert!(CapabilityPath::parse("db..put").is_err());
        assert!(CapabilityPath::parse("").is_err());
        assert!(CapabilityPath::parse("db.put()").is_err());
    }

    #[test]
    fn property_access_paths_accept_anything() {
        let path = CapabilityPath::from_dotted("a.b c.").child("then");
        assert_eq!(path.segments(), ["a", "b c", "", "then"]);
        assert!(CapabilityPath::from_dotted("").is_root());
        assert_eq!(CapabilityPath::root().terminal(), None);
    }
}
