//! Version extraction and comparison.
//!
//! Tools print their version in many shapes (`v18.17.1`, `npm 9.6.7`,
//! `Python 3.11.4`). The first dotted number in the text is taken as the
//! version; missing components and a trailing `.*` count as zero.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

const VERSION_PATTERN: &str = r"\d+(?:\.\d+)*(?:\.\*)?";

/// A numeric `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the first version found in `text`.
    ///
    /// Returns `None` when the text holds no digits or a component does
    /// not fit in a `u64`.
    pub fn extract(text: &str) -> Option<Self> {
        let re = Regex::new(VERSION_PATTERN).ok()?;
        let found = re.find(text)?.as_str();

        let mut parts = [0u64; 3];
        for (slot, component) in parts
            .iter_mut()
            .zip(found.split('.').take_while(|c| *c != "*"))
        {
            *slot = component.parse().ok()?;
        }

        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whether the version found in `detected` is at least the one in `required`.
///
/// Never panics. Text with no extractable version on either side yields
/// `false`.
pub fn check_version(detected: &str, required: &str) -> bool {
    match (Version::extract(detected), Version::extract(required)) {
        (Some(found), Some(minimum)) => found >= minimum,
        _ => false,
    }
}
