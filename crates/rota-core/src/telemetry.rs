//! Tracing subscriber setup for processes hosting the rotator.

use tracing_subscriber::EnvFilter;

use crate::config::RotationSettings;

/// Returns the filter used when `RUST_LOG` is not set.
#[must_use]
pub const fn default_directive(settings: &RotationSettings) -> &'static str {
    if settings.debug { "debug" } else { "info" }
}

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins over the settings. Returns false if a global subscriber
/// was already installed, in which case nothing changes.
pub fn init_tracing(settings: &RotationSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(settings)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
