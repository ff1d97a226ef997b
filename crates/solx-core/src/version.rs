//! Version parsing and comparison.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The oldest solc version solx will install.
pub const MINIMUM_SOLC_VERSION: Version = Version {
    major: 0,
    minor: 4,
    patch: 11,
    pre: None,
};

/// A semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre: Option<String>,
}

impl Version {
    /// Create a new version.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Render the canonical release tag form, e.g. "v0.8.1".
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    /// Check whether this version meets the supported floor.
    pub fn is_supported(&self) -> bool {
        *self >= MINIMUM_SOLC_VERSION
    }

    /// Extract a version from `solc --version` output.
    ///
    /// The output contains a line like `Version: 0.8.1+commit.abc123`;
    /// everything from the `+` build metadata marker onward is dropped.
    pub fn from_solc_output(output: &str) -> Option<Self> {
        let pattern = regex_lite::Regex::new(r"Version: (\d+)\.(\d+)\.(\d+)").ok()?;
        let captures = pattern.captures(output)?;

        let major: u32 = captures.get(1)?.as_str().parse().ok()?;
        let minor: u32 = captures.get(2)?.as_str().parse().ok()?;
        let patch: u32 = captures.get(3)?.as_str().parse().ok()?;
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Release tags carry a leading marker ("v0.8.1").
        let s = s.trim().trim_start_matches('v');

        let (version_part, pre) = if let Some(idx) = s.find('-') {
            (&s[..idx], Some(s[idx + 1..].to_string()))
        } else {
            (s, None)
        };

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<u32>()
                .map_err(|_| VersionParseError::InvalidNumber(p.to_string()))
        };

        Ok(Version {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
            pre,
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.patch.cmp(&other.patch) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Pre-release versions are less than release versions
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

/// Error parsing a version string.
#[derive(Debug, thiserror::Error)]
pub enum VersionParseError {
    #[error("invalid version format: {0}")]
    InvalidFormat(String),
    #[error("invalid version number: {0}")]
    InvalidNumber(String),
}
