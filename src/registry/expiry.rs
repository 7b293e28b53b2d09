//! Expiry policies for new links.
//!
//! Parsing is strict: an input that is not one of the recognised forms is an
//! error, never a silent "no expiry".

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

use super::error::{RegistryError, RegistryResult};

/// Links expiring within this window are flagged as "expiring soon".
pub const EXPIRING_SOON_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Never,
    /// Relative to the moment the link is created
    In(TimeDelta),
    At(DateTime<Utc>),
}

impl ExpiryPolicy {
    /// Turn the policy into an absolute expiry timestamp as of `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> RegistryResult<Option<DateTime<Utc>>> {
        match self {
            ExpiryPolicy::Never => Ok(None),
            ExpiryPolicy::In(delta) => now
                .checked_add_signed(*delta)
                .map(Some)
                .ok_or_else(|| RegistryError::InvalidExpiry("expiry is out of range".into())),
            ExpiryPolicy::At(at) => {
                if *at <= now {
                    return Err(RegistryError::InvalidExpiry(
                        "expiry must be in the future".into(),
                    ));
                }
                Ok(Some(*at))
            }
        }
    }
}

impl FromStr for ExpiryPolicy {
    type Err = RegistryError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RegistryError::InvalidExpiry("empty expiry".into()));
        }
        if input.eq_ignore_ascii_case("never") {
            return Ok(ExpiryPolicy::Never);
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            return Ok(ExpiryPolicy::At(at.with_timezone(&Utc)));
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            // A bare date keeps the link alive through the whole day
            let end_of_day = date
                .and_hms_opt(23, 59, 59)
                .ok_or_else(|| RegistryError::InvalidExpiry(input.to_string()))?;
            return Ok(ExpiryPolicy::At(end_of_day.and_utc()));
        }
        parse_relative(input).map(ExpiryPolicy::In)
    }
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryPolicy::Never => write!(f, "never"),
            ExpiryPolicy::In(delta) => write!(f, "{}s", delta.num_seconds()),
            ExpiryPolicy::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// Parse `1day`, `7days`, `1hour` or compact forms like `1d12h`.
fn parse_relative(input: &str) -> RegistryResult<TimeDelta> {
    let invalid = || RegistryError::InvalidExpiry(format!("unrecognised expiry '{input}'"));
    let lowered = input.to_ascii_lowercase();
    let mut remaining = lowered.as_str();
    let mut total = TimeDelta::zero();

    while !remaining.is_empty() {
        let digits_end = remaining
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(remaining.len());
        if digits_end == 0 {
            return Err(invalid());
        }
        let amount: i64 = remaining[..digits_end].parse().map_err(|_| invalid())?;
        remaining = &remaining[digits_end..];

        let unit_end = remaining
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(remaining.len());
        if unit_end == 0 {
            return Err(invalid());
        }
        let unit = &remaining[..unit_end];
        remaining = &remaining[unit_end..];

        let delta = match unit {
            "s" | "sec" | "second" | "seconds" => TimeDelta::try_seconds(amount),
            "m" | "min" | "minute" | "minutes" => TimeDelta::try_minutes(amount),
            "h" | "hour" | "hours" => TimeDelta::try_hours(amount),
            "d" | "day" | "days" => TimeDelta::try_days(amount),
            "w" | "week" | "weeks" => TimeDelta::try_weeks(amount),
            _ => return Err(invalid()),
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&delta).ok_or_else(invalid)?;
    }

    if total.is_zero() {
        return Err(RegistryError::InvalidExpiry("expiry duration cannot be zero".into()));
    }
    Ok(total)
}
