use tracing_subscriber::EnvFilter;

/// Installs the process-wide structured logging subscriber. Every binary
/// calls this first thing in `main`, before parsing flags or touching the
/// filesystem, so that startup failures are still logged.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}
