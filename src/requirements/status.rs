//! Requirement status types.
//!
//! Each requirement check produces a `RequirementStatus` describing whether
//! the tool or variable is usable as-is.

use std::fmt;

/// The result of checking a single requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementStatus {
    /// Present and new enough.
    Satisfied,

    /// Present, but older than the minimum.
    Outdated {
        /// Version text the tool reported.
        found: String,
        required: String,
    },

    /// Not found on the (augmented) PATH, or the version query failed.
    Missing,

    /// Environment variable unset, or it lacks the expected substring.
    Unset {
        variable: String,
        expected: Option<String>,
    },
}

impl RequirementStatus {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, RequirementStatus::Satisfied)
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementStatus::Satisfied => write!(f, "satisfied"),
            RequirementStatus::Outdated { found, required } => {
                write!(f, "found {}, need {} or newer", found, required)
            }
            RequirementStatus::Missing => write!(f, "not found"),
            RequirementStatus::Unset {
                variable,
                expected: Some(expected),
            } => write!(f, "${} does not contain '{}'", variable, expected),
            RequirementStatus::Unset {
                variable,
                expected: None,
            } => write!(f, "${} is not set", variable),
        }
    }
}

/// An unmet requirement.
#[derive(Debug, Clone)]
pub struct GapResult {
    pub requirement: String,
    pub status: RequirementStatus,
}
