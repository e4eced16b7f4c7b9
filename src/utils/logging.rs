//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` formatter driven by [`LoggingConfig`]. `RUST_LOG` takes
//! precedence over the configured level when it is set.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops, as is a call made after another
/// subscriber was installed elsewhere.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);

        let installed = if config.json_format {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        };

        if installed {
            info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
        }
    });
}
