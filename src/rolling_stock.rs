//! Rolling-stock summaries ("VIRM-6", "ICM-4") from composition data.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{CompositionSource, MaterialUnit};

/// Unit type abbreviations we know how to summarize.
const RECOGNIZED_TYPES: &[&str] = &[
    "VIRM", "ICM", "ICNG", "DDZ", "SLT", "SGM", "FLIRT", "SNG", "LINT", "GTW",
];

/// ICE BER9 sets report a unit count that doesn't match their length.
const BER9_MARKER: &str = "BER9";
const BER9_LENGTH: u32 = 9;

/// Looks up a service's composition and reduces it to a single summary.
#[derive(Clone)]
pub struct RollingStockResolver {
    source: Arc<dyn CompositionSource>,
}

impl RollingStockResolver {
    pub fn new(source: Arc<dyn CompositionSource>) -> Self {
        Self { source }
    }

    /// Summary for the train departing `station_code`, or an empty string
    /// when it can't be determined.
    pub fn resolve(
        &self,
        service_number: &str,
        service_date: NaiveDate,
        station_code: &str,
    ) -> String {
        let composition = match self.source.composition(service_number, service_date) {
            Ok(c) => c,
            Err(e) => {
                warn!(service_number, %service_date, "Rolling stock lookup failed: {}", e);
                return String::new();
            }
        };

        let Some(stop) = composition
            .stops
            .iter()
            .find(|stop| stop.station.eq_ignore_ascii_case(station_code))
        else {
            debug!(service_number, station_code, "Station not on composition route");
            return String::new();
        };

        summarize(&stop.material_units)
    }
}

/// Collapse the units leaving a stop into "TYPE-LENGTH".
///
/// Length adds up over every recognized unit while the type is the last one
/// seen, so a mixed ICM+VIRM formation reports as VIRM with the combined length.
pub fn summarize(units: &[MaterialUnit]) -> String {
    let mut stock_type: Option<&str> = None;
    let mut length = 0u32;

    for unit in units.iter().filter(|u| !u.remains_behind) {
        let Some((unit_type, unit_length)) = classify(&unit.unit_type) else {
            continue;
        };
        stock_type = Some(unit_type);
        length += unit_length;
    }

    match stock_type {
        Some(stock_type) if length > 0 => format!("{stock_type}-{length}"),
        _ => String::new(),
    }
}

/// Map a unit identifier to its type and length.
///
/// Locomotives and unknown material yield `None`.
pub fn classify(identifier: &str) -> Option<(&'static str, u32)> {
    let upper = identifier.to_uppercase();
    if upper.contains("LOC") {
        return None;
    }
    if upper.contains(BER9_MARKER) {
        return Some(("BER", BER9_LENGTH));
    }

    let stock_type = RECOGNIZED_TYPES.iter().find(|t| upper.contains(*t))?;
    let length = upper
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0);
    Some((*stock_type, length))
}
