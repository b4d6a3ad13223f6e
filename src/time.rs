//! Timestamp parsing and delay arithmetic.
//!
//! NS sends timestamps as `2024-05-10T14:35:00+0200`; other feeds use RFC 3339
//! (`...Z` or `...+02:00`). Everything is normalized to UTC internally and only
//! converted to the display zone when formatting.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::BoardError;

pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";

/// Result of normalizing one scheduled timestamp plus its delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTime {
    /// Scheduled time in the display zone, `HH:MM`
    pub local_time: String,
    pub delay_minutes: u32,
    /// Scheduled instant plus delay
    pub actual_instant: DateTime<Utc>,
    /// Calendar date of the scheduled instant in the display zone
    pub service_date: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    tz: Tz,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Europe::Amsterdam,
        }
    }
}

impl TimeNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a normalizer from an IANA zone name such as `Europe/Amsterdam`.
    pub fn from_name(name: &str) -> Result<Self, BoardError> {
        let tz: Tz = name
            .parse()
            .map_err(|e| BoardError::Config(format!("unknown time zone {name:?}: {e}")))?;
        Ok(Self::new(tz))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn normalize(
        &self,
        raw_timestamp: &str,
        delay_seconds: i64,
    ) -> Result<NormalizedTime, BoardError> {
        let scheduled = parse_timestamp(raw_timestamp)?;
        let delay_seconds = delay_seconds.max(0);
        let local = scheduled.with_timezone(&self.tz);
        let actual_instant = Duration::try_seconds(delay_seconds)
            .and_then(|delay| scheduled.checked_add_signed(delay))
            .ok_or_else(|| BoardError::Timestamp(raw_timestamp.to_string()))?;

        Ok(NormalizedTime {
            local_time: local.format("%H:%M").to_string(),
            delay_minutes: u32::try_from(delay_seconds / 60).unwrap_or(u32::MAX),
            actual_instant,
            service_date: local.date_naive(),
        })
    }

    /// Hour of `now` on the display zone's wall clock.
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.tz).hour()
    }
}

/// Parse an API timestamp into UTC.
///
/// Accepts RFC 3339 (`Z` or `+02:00`) and the compact `+0200` offset form.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BoardError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BoardError::Timestamp(raw.to_string()))
}
