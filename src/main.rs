use rusty_ns::config::DEFAULT_CONFIG_PATH;
use rusty_ns::{
    BoardRotator, Config, DepartureFeed, NsClient, Renderer, RollingStockResolver, spawn_polling,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rusty_ns=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .init();
}

#[cfg(not(feature = "display"))]
fn make_renderer(config: &Config) -> Result<Box<dyn Renderer>, String> {
    Ok(Box::new(rusty_ns::ConsoleRenderer::stdout(config.board.width)))
}

#[cfg(feature = "display")]
fn make_renderer(_config: &Config) -> Result<Box<dyn Renderer>, String> {
    let board = rusty_ns::LedBoard::new()?;
    let (width, height) = board.dimensions();
    info!("Display initialized: {}x{}", width, height);
    Ok(Box::new(board))
}

fn main() {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match Config::load_from_path(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let normalizer = match config.normalizer() {
        Ok(n) => n,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if config.api.key.is_empty() {
        error!("No API key set (use [api] key or NS_API_KEY). API calls will fail.");
    }

    let client = Arc::new(NsClient::new(config.api_config()));
    let resolver = RollingStockResolver::new(client.clone());

    let feeds: Vec<Arc<DepartureFeed>> = config
        .feed_configs()
        .into_iter()
        .map(|feed_config| {
            Arc::new(
                DepartureFeed::new(feed_config, client.clone(), normalizer)
                    .with_rolling_stock(resolver.clone()),
            )
        })
        .collect();

    let stop = Arc::new(AtomicBool::new(false));
    for feed in &feeds {
        if let Err(e) = spawn_polling(feed.clone(), stop.clone()) {
            error!(station = feed.station_code(), "Failed to start poll thread: {}", e);
            std::process::exit(1);
        }
    }

    let mut rotator = match BoardRotator::new(feeds) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut renderer = match make_renderer(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to initialize display: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        stations = rotator.len(),
        "Board running, polling every {}s, switching station every {}s",
        config.board.poll_interval_secs,
        config.board.render_interval_secs
    );

    let render_interval = config.render_interval();
    loop {
        let feed = rotator.advance();
        renderer.render(feed.station_label(), &feed.snapshot());
        thread::sleep(render_interval);
    }
}
