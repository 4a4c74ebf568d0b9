//! Autoplay policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decides whether a `play()` request may start playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoplayPolicy {
    /// Any playback may start.
    Allowed,
    /// Only muted playback may start without a user gesture.
    #[default]
    MutedOnly,
    /// No playback may start without a user gesture.
    Blocked,
}

impl AutoplayPolicy {
    /// Whether playback with the given muted state is permitted.
    pub fn permits(&self, muted: bool) -> bool {
        match self {
            AutoplayPolicy::Allowed => true,
            AutoplayPolicy::MutedOnly => muted,
            AutoplayPolicy::Blocked => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AutoplayPolicy::Allowed => "allowed",
            AutoplayPolicy::MutedOnly => "muted-only",
            AutoplayPolicy::Blocked => "blocked",
        }
    }
}

impl FromStr for AutoplayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowed" => Ok(AutoplayPolicy::Allowed),
            "muted-only" => Ok(AutoplayPolicy::MutedOnly),
            "blocked" => Ok(AutoplayPolicy::Blocked),
            other => Err(format!("unknown autoplay policy: {other}")),
        }
    }
}
