pub mod api;
pub mod config;
pub mod departure;
pub mod error;
pub mod feed;
pub mod parser;
pub mod render;
pub mod rolling_stock;
pub mod rotator;
pub mod stations;
pub mod time;

#[cfg(feature = "display")]
pub mod display;

pub use api::{ApiConfig, CompositionSource, DepartureSource, NsClient};
pub use config::Config;
pub use departure::Departure;
pub use error::BoardError;
pub use feed::{DepartureFeed, FeedConfig, PollOutcome, QuietHours, spawn_polling};
pub use parser::{DepartureParser, ParseOutcome, SkipReason};
pub use render::{ConsoleRenderer, Renderer};
pub use rolling_stock::RollingStockResolver;
pub use rotator::BoardRotator;
pub use time::TimeNormalizer;

#[cfg(feature = "display")]
pub use display::{DisplayConfig, LedBoard};
