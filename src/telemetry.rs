use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

use crate::config::Config;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured log filter. Fails if a global subscriber is
/// already set.
pub fn init_tracing(config: &Config) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
