use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use chrono::Utc;

use super::errors::JwtError;

/// Token validity window parsed from configuration.
///
/// Accepts bare seconds (`"3600"`) or a number with a unit suffix:
/// `s`, `m`, `h`, `d`, `w` (`"15m"`, `"12h"`, `"7d"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLifetime {
    raw: String,
    duration: Duration,
}

impl TokenLifetime {
    /// Validity window as a duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The configured value, as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for TokenLifetime {
    type Err = JwtError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || JwtError::InvalidLifetime(value.to_string());

        let split_at = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (amount, unit) = trimmed.split_at(split_at);

        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        if amount <= 0 {
            return Err(invalid());
        }

        let duration = match unit.trim() {
            "" | "s" => Duration::try_seconds(amount),
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            "w" => Duration::try_weeks(amount),
            _ => return Err(invalid()),
        }
        .ok_or_else(invalid)?;

        // Every token issued from now on must have a representable expiry.
        if Utc::now().checked_add_signed(duration).is_none() {
            return Err(invalid());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            duration,
        })
    }
}

impl fmt::Display for TokenLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}
