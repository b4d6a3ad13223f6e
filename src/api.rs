use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use crate::error::BoardError;

pub const DEFAULT_BASE_URL: &str = "https://gateway.apiportal.ns.nl";
const DEPARTURES_PATH: &str = "/reisinformatie-api/api/v2/departures";
const COMPOSITION_PATH: &str = "/virtual-train-api/api/v1/trein";

// API response structures for the NS departures API
#[derive(Debug, Deserialize)]
struct DeparturesResponse {
    payload: DeparturesPayload,
}

#[derive(Debug, Deserialize)]
struct DeparturesPayload {
    // Kept generic so one malformed record doesn't sink the whole board
    #[serde(default)]
    departures: Vec<Value>,
}

/// One departure record as sent by the API. Every field is optional upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeparture {
    pub direction: Option<String>,
    pub planned_direction: Option<String>,
    pub name: Option<String>,
    pub planned_date_time: Option<String>,
    pub actual_date_time: Option<String>,
    /// Delay in seconds, when the feed reports it directly
    pub delay: Option<i64>,
    pub planned_track: Option<String>,
    pub actual_track: Option<String>,
    pub train_category: Option<String>,
    pub product: Option<RawProduct>,
    pub cancelled: Option<bool>,
    pub departure_status: Option<String>,
    /// Operating day (`YYYY-MM-DD`) for the composition lookup
    pub service_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    /// Train (service) number, e.g. "7935"
    pub number: Option<String>,
    pub line_number: Option<String>,
    pub category_code: Option<String>,
}

/// Composition of one service along its route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default)]
    pub stops: Vec<CompositionStop>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionStop {
    pub station: String,
    #[serde(default)]
    pub material_units: Vec<MaterialUnit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUnit {
    /// Type identifier, e.g. "VIRM6" or "E-LOC1700"
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Unit is uncoupled at this stop and stays behind
    #[serde(default)]
    pub remains_behind: bool,
}

/// Where a feed gets its raw departure records from.
pub trait DepartureSource: Send + Sync {
    fn departures(&self, station_code: &str) -> Result<Vec<Value>, BoardError>;
}

/// Where rolling-stock lookups get composition data from.
pub trait CompositionSource: Send + Sync {
    fn composition(&self, service_number: &str, date: NaiveDate)
        -> Result<Composition, BoardError>;
}

/// Connection settings for [`NsClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocking client for the NS departures and composition endpoints.
///
/// The underlying agent is shared across threads, so one client serves every feed.
#[derive(Clone)]
pub struct NsClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl NsClient {
    pub fn new(config: ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, BoardError> {
        let start_time = Instant::now();

        let mut request = self
            .agent
            .get(url)
            .set("Cache-Control", "no-cache")
            .set("Ocp-Apim-Subscription-Key", &self.api_key);
        for (key, value) in query {
            request = request.query(key, value);
        }

        let response = match request.call() {
            Ok(r) => r,
            Err(e) => {
                let elapsed = start_time.elapsed();
                error!(elapsed_ms = elapsed.as_millis(), "HTTP error: {}", e);
                return Err(BoardError::from_ureq(url, e));
            }
        };

        match response.into_string() {
            Ok(body) => Ok(body),
            Err(e) => {
                let elapsed = start_time.elapsed();
                error!(elapsed_ms = elapsed.as_millis(), "HTTP read error: {}", e);
                Err(e.into())
            }
        }
    }

    /// Fetch the raw departure records for a station, in API order.
    #[instrument(skip(self))]
    pub fn fetch_departures(&self, station_code: &str) -> Result<Vec<Value>, BoardError> {
        let url = format!("{}{}", self.base_url, DEPARTURES_PATH);
        info!("Fetching departures from API: {}", url);
        let start_time = Instant::now();

        let body = self.get(&url, &[("station", station_code)])?;

        let response: DeparturesResponse = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                let elapsed = start_time.elapsed();
                error!(elapsed_ms = elapsed.as_millis(), "JSON parse error: {}", e);
                return Err(BoardError::json(e, Some(&body)));
            }
        };

        let departures = response.payload.departures;
        let elapsed = start_time.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis(),
            count = departures.len(),
            "API request successful, received {} departures",
            departures.len()
        );

        Ok(departures)
    }

    /// Fetch the composition of a service on a given operating day.
    #[instrument(skip(self))]
    pub fn fetch_composition(
        &self,
        service_number: &str,
        date: NaiveDate,
    ) -> Result<Composition, BoardError> {
        let url = format!("{}{}/{}", self.base_url, COMPOSITION_PATH, service_number);
        let date = date.format("%Y-%m-%d").to_string();

        let body = self.get(&url, &[("date", date.as_str())])?;
        serde_json::from_str(&body).map_err(|e| BoardError::json(e, Some(&body)))
    }
}

impl DepartureSource for NsClient {
    fn departures(&self, station_code: &str) -> Result<Vec<Value>, BoardError> {
        self.fetch_departures(station_code)
    }
}

impl CompositionSource for NsClient {
    fn composition(
        &self,
        service_number: &str,
        date: NaiveDate,
    ) -> Result<Composition, BoardError> {
        self.fetch_composition(service_number, date)
    }
}
