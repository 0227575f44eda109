use tracing::level_filters::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Initializes logging to stderr.
///
/// `log_level` takes precedence over `RUST_LOG`, only warnings are logged when neither is set.
pub fn init_tracing_registry(log_level: Option<&str>) {
    let env_filter = match log_level {
        Some(log_level) => EnvFilter::builder().parse_lossy(log_level),
        None => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(env_filter)
        .init();
}
