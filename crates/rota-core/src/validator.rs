//! Input validation for rotation events.
//!
//! Runs before every step so a stale or malformed trigger never touches the
//! staged state of a secret rotation has been disabled for.

use crate::error::{Error, Result};
use crate::stage::SecretDescription;
use crate::types::RotationEvent;

/// Checks an event against the store's description of its secret.
///
/// Succeeds only if rotation is enabled for the secret and the event's
/// version is known to the store with at least one rotation stage.
///
/// # Errors
///
/// Returns [`Error::RotationDisabled`] or [`Error::VersionNotStaged`].
pub fn validate_event(event: &RotationEvent, description: &SecretDescription) -> Result<()> {
    if !description.rotation_enabled {
        return Err(Error::RotationDisabled {
            step: event.step,
            secret_id: event.secret_id.clone(),
        });
    }

    if !description.is_staged(&event.version) {
        return Err(Error::VersionNotStaged {
            step: event.step,
            secret_id: event.secret_id.clone(),
            version: event.version.clone(),
        });
    }

    Ok(())
}
