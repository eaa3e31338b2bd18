//! Tagged stage results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Topic research.
    Research,
    /// Platform-specific drafting.
    Content,
    /// Image prompt and generation.
    Image,
}

impl StageName {
    /// Returns the stage name as used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Content => "content",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage agent produced.
///
/// A fallback is a normal result, not an error: the value is usable and
/// flows to the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// The primary path succeeded.
    Success(T),
    /// The primary path failed and a substitute value was produced.
    Fallback {
        /// The substitute value.
        value: T,
        /// Why the primary path failed.
        reason: String,
    },
}

impl<T> StageOutcome<T> {
    /// Creates a fallback outcome.
    #[must_use]
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback {
            value,
            reason: reason.into(),
        }
    }

    /// Returns true if the primary path succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the fallback reason, if any.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    /// Borrows the carried value.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Success(value) | Self::Fallback { value, .. } => value,
        }
    }

    /// Returns the carried value.
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Success(value) | Self::Fallback { value, .. } => value,
        }
    }
}
