//! # Configuration
//!
//! Loads the board settings from `rusty-ns.toml`: API access, poll and render
//! cadence, display time zone, quiet hours, and the stations to show.
//! The API key may also come from the `NS_API_KEY` environment variable so it
//! doesn't have to live in the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiConfig, DEFAULT_BASE_URL};
use crate::error::BoardError;
use crate::feed::{FeedConfig, QuietHours};
use crate::time::{DEFAULT_TIMEZONE, TimeNormalizer};

pub const DEFAULT_CONFIG_PATH: &str = "rusty-ns.toml";
pub const API_KEY_ENV: &str = "NS_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub board: BoardSettings,
    #[serde(default = "default_stations")]
    pub stations: Vec<StationSettings>,
}

/// NS API access
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Subscription key; `NS_API_KEY` takes precedence
    pub key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardSettings {
    pub poll_interval_secs: u64,
    /// How long each station stays on screen
    pub render_interval_secs: u64,
    /// IANA zone used for displayed times and quiet hours
    pub timezone: String,
    pub quiet_start_hour: u32,
    pub quiet_end_hour: u32,
    /// Characters per row for the console renderer
    pub width: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationSettings {
    pub code: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Destinations to leave off this board, as station codes or names
    #[serde(default)]
    pub exclude_destinations: Vec<String>,
}

fn default_limit() -> usize {
    7
}

fn default_stations() -> Vec<StationSettings> {
    vec![StationSettings {
        code: "ESK".to_string(),
        limit: default_limit(),
        exclude_destinations: vec!["ES".to_string()],
    }]
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            render_interval_secs: 15,
            timezone: DEFAULT_TIMEZONE.to_string(),
            quiet_start_hour: 0,
            quiet_end_hour: 5,
            width: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            board: BoardSettings::default(),
            stations: default_stations(),
        }
    }
}

impl Config {
    /// Load configuration from rusty-ns.toml in the working directory.
    pub fn load() -> Result<Self, BoardError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load and validate configuration from `path`.
    ///
    /// A missing file gives the defaults; an unreadable or invalid one is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Config>(&contents).map_err(|e| {
                BoardError::Config(format!("invalid config file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(BoardError::Config(format!(
                    "can't read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config = config.with_api_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override the file's API key with one from the environment, if set.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.key = key;
        }
        self
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.stations.is_empty() {
            return Err(BoardError::Config("no stations configured".to_string()));
        }
        for station in &self.stations {
            if station.code.trim().is_empty() {
                return Err(BoardError::Config("station code is empty".to_string()));
            }
            if station.limit == 0 {
                return Err(BoardError::Config(format!(
                    "station {}: limit must be at least 1",
                    station.code
                )));
            }
        }

        let board = &self.board;
        if board.quiet_start_hour > 24 || board.quiet_end_hour > 24 {
            return Err(BoardError::Config(
                "quiet hours must be between 0 and 24".to_string(),
            ));
        }
        if board.poll_interval_secs == 0 || board.render_interval_secs == 0 {
            return Err(BoardError::Config(
                "poll and render intervals must be positive".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(BoardError::Config("API timeout must be positive".to_string()));
        }
        TimeNormalizer::from_name(&board.timezone)?;
        Ok(())
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api.key.clone())
            .with_base_url(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
    }

    pub fn normalizer(&self) -> Result<TimeNormalizer, BoardError> {
        TimeNormalizer::from_name(&self.board.timezone)
    }

    pub fn quiet_hours(&self) -> QuietHours {
        QuietHours {
            start_hour: self.board.quiet_start_hour,
            end_hour: self.board.quiet_end_hour,
        }
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs(self.board.render_interval_secs)
    }

    /// One feed configuration per station, in display order.
    pub fn feed_configs(&self) -> Vec<FeedConfig> {
        self.stations
            .iter()
            .map(|station| {
                FeedConfig::new(station.code.to_uppercase(), station.limit)
                    .with_excluded_destinations(&station.exclude_destinations)
                    .with_poll_interval(Duration::from_secs(self.board.poll_interval_secs))
                    .with_quiet_hours(self.quiet_hours())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.board.poll_interval_secs, 15);
        assert_eq!(config.board.timezone, "Europe/Amsterdam");
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.stations[0].code, "ESK");
        assert_eq!(config.stations[0].limit, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/rusty-ns.toml").unwrap();
        assert_eq!(config.stations[0].code, "ESK");
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
            [api]
            base_url = "http://localhost:9999"
            key = "abc"
            timeout_secs = 5

            [board]
            poll_interval_secs = 30
            render_interval_secs = 10
            timezone = "Europe/Amsterdam"
            quiet_start_hour = 1
            quiet_end_hour = 6
            width = 48

            [[stations]]
            code = "hgl"
            limit = 5
            exclude_destinations = ["ES", "Oldenzaal"]

            [[stations]]
            code = "ESK"
            "#,
        );
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.stations[1].limit, 7);

        let feeds = config.feed_configs();
        assert_eq!(feeds[0].station_code, "HGL");
        assert_eq!(feeds[0].limit, 5);
        assert_eq!(feeds[0].poll_interval, Duration::from_secs(30));
        assert!(feeds[0].destination_filter.contains("enschede"));
        assert!(feeds[0].destination_filter.contains("oldenzaal"));
        assert_eq!(
            feeds[0].quiet_hours,
            QuietHours {
                start_hour: 1,
                end_hour: 6
            }
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_config("[[stations]]\ncode = \"ZL\"\n");
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.board.render_interval_secs, 15);
        assert_eq!(config.stations[0].code, "ZL");
    }

    #[test]
    fn test_partial_table_uses_field_defaults() {
        let file = write_config("[board]\npoll_interval_secs = 60\n");
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.board.poll_interval_secs, 60);
        assert_eq!(config.board.quiet_end_hour, 5);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let file = write_config("stations = 3");
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(BoardError::Config(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.stations[0].limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stations.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.board.timezone = "Nowhere/Special".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.board.quiet_end_hour = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_key_overrides_file() {
        let config = Config::default().with_api_key(Some("from-env".into()));
        assert_eq!(config.api.key, "from-env");

        let config = Config::default().with_api_key(Some("  ".into()));
        assert_eq!(config.api.key, "");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.stations[0].code, parsed.stations[0].code);
        assert_eq!(config.board.width, parsed.board.width);
    }
}
