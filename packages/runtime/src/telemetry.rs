use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info,opkit::operation=debug"`).
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
