use tracing_subscriber::EnvFilter;

/// Env var that overrides the log filter, e.g. `NEXTBLOCK_LOG=nextblock_core=debug`.
pub const LOG_ENV: &str = "NEXTBLOCK_LOG";

/// Install the stderr subscriber. `NEXTBLOCK_LOG` wins over `RUST_LOG`;
/// without either the level is `info`, or `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
