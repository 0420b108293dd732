//! Log initialisation for the debug CLI.
//!
//! Logs go to stderr so stdout stays reserved for JSON output. `RUST_LOG`
//! overrides the configured level when set.

use tracing_subscriber::EnvFilter;

/// Map a `LOG_LEVEL` name (`DEBUG`, `WARNING`, ...) to a filter directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        "OFF" => "off",
        _ => "info",
    }
}

/// Install the global subscriber. Repeated calls are ignored.
pub fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
