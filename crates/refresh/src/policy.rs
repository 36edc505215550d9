use std::time::Duration;

use crate::error::RefreshError;

/// How often the current source is re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    #[default]
    Disabled,
    Periodic(Duration),
}

impl RefreshPolicy {
    /// `0` disables refreshing; negative values are invalid input.
    pub fn from_seconds(seconds: i64) -> Result<Self, RefreshError> {
        match seconds {
            s if s < 0 => Err(RefreshError::NegativeInterval(s)),
            0 => Ok(RefreshPolicy::Disabled),
            s => Ok(RefreshPolicy::Periodic(Duration::from_secs(s.unsigned_abs()))),
        }
    }

    /// Parses the operator's interval text (whole seconds).
    pub fn parse(raw: &str) -> Result<Self, RefreshError> {
        let seconds = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| RefreshError::NonIntegerInterval(raw.to_string()))?;
        Self::from_seconds(seconds)
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            RefreshPolicy::Disabled => None,
            RefreshPolicy::Periodic(interval) => Some(*interval),
        }
    }
}

impl std::fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshPolicy::Disabled => write!(f, "disabled"),
            RefreshPolicy::Periodic(interval) => write!(f, "every {}s", interval.as_secs()),
        }
    }
}
