//! Per-station polling and the live departure list.
//!
//! Each feed owns its rows behind a lock. The poll thread builds a complete new
//! list before taking the write lock, so readers only ever see a whole list.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::api::DepartureSource;
use crate::departure::Departure;
use crate::parser::{DepartureParser, ParseOutcome};
use crate::rolling_stock::RollingStockResolver;
use crate::stations;
use crate::time::TimeNormalizer;

// How often a sleeping poll thread checks for shutdown
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Local-time window in which the API is not queried, `start <= hour < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 5,
        }
    }
}

impl QuietHours {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            // Window wraps past midnight, e.g. 23..5
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Static settings for one station's feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub station_code: String,
    /// Number of rows on the board
    pub limit: usize,
    /// Lowercase destination names to leave out
    pub destination_filter: HashSet<String>,
    pub poll_interval: Duration,
    pub quiet_hours: QuietHours,
}

impl FeedConfig {
    pub fn new(station_code: impl Into<String>, limit: usize) -> Self {
        Self {
            station_code: station_code.into(),
            limit,
            destination_filter: HashSet::new(),
            poll_interval: Duration::from_secs(15),
            quiet_hours: QuietHours::default(),
        }
    }

    /// Exclude destinations, given as station codes or names.
    pub fn with_excluded_destinations<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.destination_filter = stations::resolve_filter(entries);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.quiet_hours = quiet_hours;
        self
    }
}

/// What a single poll did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New rows were published
    Updated,
    /// Fetched rows equal the current ones
    Unchanged,
    /// Fetch failed; the previous rows stay up
    Failed,
}

#[derive(Debug)]
struct FeedState {
    departures: Vec<Departure>,
    last_fetch: Option<DateTime<Utc>>,
}

pub struct DepartureFeed {
    config: FeedConfig,
    station_label: String,
    source: Arc<dyn DepartureSource>,
    rolling_stock: Option<RollingStockResolver>,
    normalizer: TimeNormalizer,
    state: RwLock<FeedState>,
}

impl DepartureFeed {
    pub fn new(
        config: FeedConfig,
        source: Arc<dyn DepartureSource>,
        normalizer: TimeNormalizer,
    ) -> Self {
        let station_label = stations::full_station_name(&config.station_code);
        let departures = padded(Vec::new(), config.limit);
        Self {
            config,
            station_label,
            source,
            rolling_stock: None,
            normalizer,
            state: RwLock::new(FeedState {
                departures,
                last_fetch: None,
            }),
        }
    }

    /// Look up rolling stock for every departure shown.
    pub fn with_rolling_stock(mut self, resolver: RollingStockResolver) -> Self {
        self.rolling_stock = Some(resolver);
        self
    }

    pub fn station_code(&self) -> &str {
        &self.config.station_code
    }

    /// Display name for the board header.
    pub fn station_label(&self) -> &str {
        &self.station_label
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Copy of the current rows; always exactly `limit` long.
    pub fn snapshot(&self) -> Vec<Departure> {
        match self.state.read() {
            Ok(state) => state.departures.clone(),
            Err(poisoned) => poisoned.into_inner().departures.clone(),
        }
    }

    /// When the rows were last rebuilt (a successful fetch or a quiet-hours tick).
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        match self.state.read() {
            Ok(state) => state.last_fetch,
            Err(poisoned) => poisoned.into_inner().last_fetch,
        }
    }

    pub fn poll(&self) -> PollOutcome {
        self.poll_at(Utc::now())
    }

    /// Run one poll cycle as if the current time were `now`.
    #[instrument(skip(self), fields(station = %self.config.station_code))]
    pub fn poll_at(&self, now: DateTime<Utc>) -> PollOutcome {
        match self.fetch_rows(now) {
            Some(rows) => self.publish(rows, now),
            None => PollOutcome::Failed,
        }
    }

    /// Build the next list of rows, or `None` if the API couldn't be read.
    fn fetch_rows(&self, now: DateTime<Utc>) -> Option<Vec<Departure>> {
        let hour = self.normalizer.local_hour(now);
        let quiet = self.config.quiet_hours;
        if quiet.contains(hour) {
            debug!(hour, "Quiet hours, not calling the API");
            let rows = vec![Departure::suspended(quiet.end_hour)];
            return Some(padded(rows, self.config.limit));
        }

        let records = match self.source.departures(&self.config.station_code) {
            Ok(records) => records,
            Err(e) => {
                warn!("API Error: {} (using cached data)", e);
                return None;
            }
        };

        let parser = DepartureParser {
            station_code: &self.config.station_code,
            destination_filter: &self.config.destination_filter,
            normalizer: &self.normalizer,
            rolling_stock: self.rolling_stock.as_ref(),
        };

        let mut rows = Vec::with_capacity(self.config.limit);
        for record in &records {
            if rows.len() >= self.config.limit {
                break;
            }
            match parser.parse_value(record, now) {
                Ok(ParseOutcome::Keep(departure)) => rows.push(departure),
                Ok(ParseOutcome::Skip(reason)) => debug!(?reason, "Skipping departure"),
                Err(e) => warn!(%record, "Dropping malformed departure: {}", e),
            }
        }

        Some(padded(rows, self.config.limit))
    }

    fn publish(&self, rows: Vec<Departure>, now: DateTime<Utc>) -> PollOutcome {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.last_fetch = Some(now);
        if state.departures == rows {
            return PollOutcome::Unchanged;
        }

        let shown = rows.iter().filter(|d| !d.is_empty_slot()).count();
        state.departures = rows;
        info!(count = shown, "Board updated with {} departures", shown);
        PollOutcome::Updated
    }
}

/// Pad with empty slots up to the board height.
fn padded(mut rows: Vec<Departure>, limit: usize) -> Vec<Departure> {
    rows.truncate(limit);
    rows.resize_with(limit, Departure::empty_slot);
    rows
}

/// Start the background poll loop for a feed.
///
/// Polls immediately, then once per `poll_interval`, until `stop` is set.
/// A list parsed after the stop request is thrown away.
pub fn spawn_polling(
    feed: Arc<DepartureFeed>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    let name = format!("poll-{}", feed.station_code().to_lowercase());
    thread::Builder::new().name(name).spawn(move || {
        info!(station = feed.station_code(), "Poll loop started");
        while !stop.load(Ordering::Relaxed) {
            let now = Utc::now();
            if let Some(rows) = feed.fetch_rows(now) {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                feed.publish(rows, now);
            }

            let next_poll = Instant::now() + feed.config.poll_interval;
            while !stop.load(Ordering::Relaxed) && Instant::now() < next_poll {
                thread::sleep(STOP_CHECK_INTERVAL.min(next_poll.saturating_duration_since(Instant::now())));
            }
        }
        info!(station = feed.station_code(), "Poll loop stopped");
    })
}
