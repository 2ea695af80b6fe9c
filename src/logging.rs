//! Logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise logging to stderr.
///
/// Applies a filter based on the `RUST_LOG` environment variable, falling back to info level
/// for this crate if not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snodas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
