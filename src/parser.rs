//! Turns raw API records into board rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::api::RawDeparture;
use crate::departure::{Departure, REPLACEMENT_BUS, UNKNOWN_TIME};
use crate::error::BoardError;
use crate::rolling_stock::RollingStockResolver;
use crate::time::{NormalizedTime, TimeNormalizer, parse_timestamp};

/// Service prefix when a record has neither line number nor category.
pub const UNKNOWN_SERVICE: &str = "UNK";

/// Why a well-formed record was left off the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The train has already left
    Departed,
    /// Destination is on the station's exclusion list
    FilteredDestination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Keep(Departure),
    Skip(SkipReason),
}

/// Parses records for one station.
pub struct DepartureParser<'a> {
    pub station_code: &'a str,
    /// Lowercase destination names to leave out
    pub destination_filter: &'a HashSet<String>,
    pub normalizer: &'a TimeNormalizer,
    pub rolling_stock: Option<&'a RollingStockResolver>,
}

impl DepartureParser<'_> {
    /// Decode a generic JSON record and parse it.
    ///
    /// Records whose fields have the wrong shape fail with [`BoardError::Json`].
    pub fn parse_value(
        &self,
        record: &Value,
        now: DateTime<Utc>,
    ) -> Result<ParseOutcome, BoardError> {
        let raw = decode_record(record)?;
        Ok(self.parse(&raw, now))
    }

    pub fn parse(&self, raw: &RawDeparture, now: DateTime<Utc>) -> ParseOutcome {
        // Time and delay; a missing or odd timestamp still gets a row
        let time = match raw.planned_date_time.as_deref() {
            Some(planned) => match self.normalizer.normalize(planned, delay_seconds(raw)) {
                Ok(t) => Some(t),
                Err(e) => {
                    debug!(station = self.station_code, "Unusable departure time: {}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(t) = &time {
            if t.actual_instant <= now {
                return ParseOutcome::Skip(SkipReason::Departed);
            }
        }

        let planned_track = raw.planned_track.as_deref().unwrap_or("-");
        let platform = raw.actual_track.as_deref().unwrap_or(REPLACEMENT_BUS);
        let platform_changed = platform != planned_track;

        let destination = raw
            .direction
            .as_deref()
            .or(raw.planned_direction.as_deref())
            .unwrap_or_default();
        if self.destination_filter.contains(&destination.to_lowercase()) {
            return ParseOutcome::Skip(SkipReason::FilteredDestination);
        }

        let destination_changed = matches!(
            (raw.planned_direction.as_deref(), raw.direction.as_deref()),
            (Some(planned), Some(actual)) if planned != actual
        );

        let rolling_stock = self.rolling_stock_for(raw, time.as_ref());

        ParseOutcome::Keep(Departure {
            scheduled_time: time
                .as_ref()
                .map(|t| t.local_time.clone())
                .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            delay_minutes: time.as_ref().map_or(0, |t| t.delay_minutes),
            actual_departure: time.as_ref().map(|t| t.actual_instant),
            platform: platform.to_string(),
            platform_changed,
            service_label: format!("{} {}", service_prefix(raw), destination)
                .trim_end()
                .to_string(),
            destination_changed,
            rolling_stock,
            status: status_text(raw.departure_status.as_deref()),
            cancelled: raw.cancelled.unwrap_or(false),
        })
    }

    fn rolling_stock_for(&self, raw: &RawDeparture, time: Option<&NormalizedTime>) -> String {
        let Some(resolver) = self.rolling_stock else {
            return String::new();
        };
        let Some(number) = raw.product.as_ref().and_then(|p| p.number.as_deref()) else {
            return String::new();
        };
        let date = raw
            .service_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .or(time.map(|t| t.service_date));

        match date {
            Some(date) => resolver.resolve(number, date, self.station_code),
            None => String::new(),
        }
    }
}

pub fn decode_record(record: &Value) -> Result<RawDeparture, BoardError> {
    RawDeparture::deserialize(record).map_err(|e| BoardError::json(e, None))
}

/// Delay in seconds: the explicit field, else actual minus planned time.
fn delay_seconds(raw: &RawDeparture) -> i64 {
    if let Some(delay) = raw.delay {
        return delay;
    }
    match (raw.planned_date_time.as_deref(), raw.actual_date_time.as_deref()) {
        (Some(planned), Some(actual)) => {
            match (parse_timestamp(planned), parse_timestamp(actual)) {
                (Ok(planned), Ok(actual)) => (actual - planned).num_seconds(),
                _ => 0,
            }
        }
        _ => 0,
    }
}

/// Line number, else category code, else "UNK".
fn service_prefix(raw: &RawDeparture) -> &str {
    let product = raw.product.as_ref();
    product
        .and_then(|p| p.line_number.as_deref())
        .or(raw.train_category.as_deref())
        .or(product.and_then(|p| p.category_code.as_deref()))
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or(UNKNOWN_SERVICE)
}

// "ON_STATION" -> "On station"
fn status_text(status: Option<&str>) -> String {
    let Some(status) = status.filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };
    let lower = status.to_lowercase().replace('_', " ");
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
