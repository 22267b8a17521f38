use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted for the log filter.
pub const LOG_ENV: &str = "VKL_LOG";

/// Initialize structured logging with environment filter.
/// Set VKL_LOG=debug (or trace, info, warn, error) for verbosity control;
/// `default_filter` (the `loader.log_filter` config value) applies when it is
/// unset or unparsable.
pub fn init_logging_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}
