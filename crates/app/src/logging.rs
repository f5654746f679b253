use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Install the global subscriber.
///
/// Logs go to stderr so they do not interleave with the quiz on stdout.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
