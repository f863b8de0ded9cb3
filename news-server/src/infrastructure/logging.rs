use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the process-wide subscriber. A non-empty `RUST_LOG` replaces the
/// configured level.
pub(crate) fn init_logging(level: &str) -> Result<()> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(from_env.as_deref(), level)?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn log_filter(from_env: Option<&str>, level: &str) -> Result<EnvFilter> {
    let directives = from_env
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or(level);

    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter '{directives}'"))
}
