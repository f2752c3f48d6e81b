//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins over `level`; `json` switches to one JSON object per line.
pub fn init(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Effective level for the global `--verbose` / `--quiet` flags.
pub fn level_for(log_level: &str, verbose: bool, quiet: bool) -> &str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        log_level
    }
}
