//! Process-wide tracing setup for peersub binaries.
//!
//! `RUST_LOG` selects what is logged, `RUST_LOG_FORMAT=json` switches to
//! structured output.

use std::env::var;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at `info`, unless `RUST_LOG` says otherwise
pub fn init() {
    init_with_level(LevelFilter::INFO);
}

/// Initialize logging with `level` as the default directive.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match log_format().as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    let _ = tracing_subscriber::registry().with(log_layer).try_init();
}

/// Map a `-v` count onto a default level
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn log_format() -> String {
    var("RUST_LOG_FORMAT").unwrap_or_default().to_lowercase()
}
