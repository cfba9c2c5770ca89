//! Tracing subscriber setup.
//!
//! Log output goes to stdout through the `tracing_subscriber` fmt layer. Verbosity is taken
//! from `RUST_LOG` and defaults to `info`:
//!
//! ```bash
//! RUST_LOG="info,tisctl=debug,sqlx=warn" tisctl -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the `RUST_LOG` filter, falling back to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing with console output.
///
/// Fails if a global subscriber has already been installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
