use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sends diagnostics to stderr. `RUST_LOG` takes precedence over `level`.
pub fn setup_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .without_time()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to set tracing subscriber")?;

    tracing::debug!("Logging system initialized at level {}", level);

    Ok(())
}
