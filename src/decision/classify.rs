//! Fixed-boundary classification of a combined score.

use serde::{Deserialize, Serialize};

/// Upper bound of the `log` band; anything above raises an alert.
pub const ALERT_ABOVE: u8 = 70;
/// Lower bound of the `log` band; anything below is ignored.
pub const LOG_FROM: u8 = 30;

/// What downstream responders should do with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Alert,
    Log,
    Ignore,
}

impl Action {
    pub const ALL: [Action; 3] = [Self::Alert, Self::Log, Self::Ignore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Log => "log",
            Self::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `> 70` alert, `30..=70` log, `< 30` ignore. Both boundaries belong to `log`.
pub fn classify(combined_score: u8) -> Action {
    if combined_score > ALERT_ABOVE {
        Action::Alert
    } else if combined_score >= LOG_FROM {
        Action::Log
    } else {
        Action::Ignore
    }
}
