//! Text Humanizer Service: binary entrypoint
//! Boots the Axum HTTP server over a configured `ConversionEngine`.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use text_humanizer::config::EngineConfig;
use text_humanizer::metrics::Metrics;
use text_humanizer::{router, ConversionEngine};

/// Compact logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("text_humanizer=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = EngineConfig::load()?;
    let engine = Arc::new(ConversionEngine::from_config(&cfg));

    let mut app = router(engine);
    match Metrics::init(cfg.cache.ttl_secs) {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics recorder not installed"),
    }

    Ok(app.into())
}
