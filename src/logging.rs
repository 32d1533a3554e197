use tracing_subscriber::EnvFilter;

/// Env var holding the tracing filter directive (default `warn`)
pub const LOG_FILTER_ENV: &str = "HOOKS_LOG";

/// Set to `json` for structured log lines
pub const LOG_FORMAT_ENV: &str = "HOOKS_LOG_FORMAT";

/// Install the stderr subscriber for a hook binary.
///
/// Stdout is never written to, so logs and diagnostics share stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    };

    // A second init (tests, embedding) keeps the existing subscriber
    let _ = result;
}
