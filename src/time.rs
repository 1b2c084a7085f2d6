//! Time units for cache expiration.
//!
//! Like [`std::time::Duration`] constructors, but as a value that can sit in
//! configuration: it includes [`TimeUnit::Weeks`] and an explicit
//! [`TimeUnit::Unset`] marker for "inherit the configured default".

use serde::{Deserialize, Serialize};

use crate::{MimirError, Result};

const DAYS_IN_WEEK: i64 = 7;
const SECONDS_IN_DAY: i64 = 24 * 60 * 60;

/// Unit for an expiration amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// No unit chosen; must be resolved before conversion.
    #[default]
    Unset,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// Convert `amount` of this unit into whole seconds.
    ///
    /// Sub-second units truncate toward zero, so a positive amount can
    /// convert to `0` (10 milliseconds => 0 seconds). Rounding such values
    /// up is the caller's job. Oversized amounts saturate.
    ///
    /// # Errors
    ///
    /// Returns [`MimirError::InvalidConfiguration`] for [`TimeUnit::Unset`].
    pub fn to_seconds(self, amount: i64) -> Result<i64> {
        let seconds = match self {
            TimeUnit::Nanoseconds => amount / 1_000_000_000,
            TimeUnit::Microseconds => amount / 1_000_000,
            TimeUnit::Milliseconds => amount / 1_000,
            TimeUnit::Seconds => amount,
            TimeUnit::Minutes => amount.saturating_mul(60),
            TimeUnit::Hours => amount.saturating_mul(60 * 60),
            TimeUnit::Days => amount.saturating_mul(SECONDS_IN_DAY),
            TimeUnit::Weeks => amount.saturating_mul(DAYS_IN_WEEK * SECONDS_IN_DAY),
            TimeUnit::Unset => {
                return Err(MimirError::InvalidConfiguration(
                    "time unit is unset, unable to convert to seconds".to_string(),
                ));
            }
        };
        Ok(seconds)
    }

    /// Whether a concrete unit has been chosen.
    pub fn is_set(self) -> bool {
        self != TimeUnit::Unset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_every_unit_to_seconds() {
        assert_eq!(TimeUnit::Nanoseconds.to_seconds(1_000_000_000).unwrap(), 1);
        assert_eq!(TimeUnit::Microseconds.to_seconds(1_000_000).unwrap(), 1);
        assert_eq!(TimeUnit::Milliseconds.to_seconds(1_000).unwrap(), 1);
        assert_eq!(TimeUnit::Seconds.to_seconds(1).unwrap(), 1);
        assert_eq!(TimeUnit::Minutes.to_seconds(1).unwrap(), 60);
        assert_eq!(TimeUnit::Hours.to_seconds(1).unwrap(), 60 * 60);
        assert_eq!(TimeUnit::Days.to_seconds(1).unwrap(), 60 * 60 * 24);
        assert_eq!(TimeUnit::Weeks.to_seconds(1).unwrap(), 60 * 60 * 24 * 7);
    }

    #[test]
    fn sub_second_amounts_truncate_to_zero() {
        assert_eq!(TimeUnit::Milliseconds.to_seconds(10).unwrap(), 0);
        assert_eq!(TimeUnit::Milliseconds.to_seconds(1_999).unwrap(), 1);
    }

    #[test]
    fn unset_unit_fails() {
        let err = TimeUnit::Unset.to_seconds(0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn large_amounts_saturate() {
        assert_eq!(TimeUnit::Weeks.to_seconds(i64::MAX).unwrap(), i64::MAX);
    }

    #[test]
    fn deserializes_lowercase_names() {
        let unit: TimeUnit = serde_json::from_str("\"weeks\"").unwrap();
        assert_eq!(unit, TimeUnit::Weeks);
        assert_eq!(TimeUnit::default(), TimeUnit::Unset);
    }
}
