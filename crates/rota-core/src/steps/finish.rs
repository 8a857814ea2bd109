//! `finishSecret`: promote `PENDING` to `CURRENT`.

use tracing::{debug, info, warn};

use crate::codec::SecretCodec;
use crate::config::RotationConfig;
use crate::error::{Error, Result};
use crate::service::ServiceClient;
use crate::stage::Stage;
use crate::store::SecretStore;
use crate::types::{RotationEvent, VersionId};

/// Moves `CURRENT` onto the event's version through the store's atomic
/// promotion, demoting whichever version held it.
///
/// If the event's version already carries `CURRENT` the step succeeds
/// without writing. The label is never removed and re-added in two calls:
/// a crash in between would leave the secret without a `CURRENT` version.
///
/// When more than one version carries `CURRENT` the lowest version token is
/// demoted to `PREVIOUS`, the store strips the label from the rest, and the
/// anomaly is logged; rotation is not blocked.
pub async fn finish_secret<St, Sc, C>(
    config: &RotationConfig<St, Sc, C>,
    event: &RotationEvent,
) -> Result<()>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    debug!("describing secret");
    let description = config
        .store
        .describe_secret(&event.secret_id)
        .await
        .map_err(|source| Error::StoreUnavailable {
            step: event.step,
            source,
        })?;

    let holders: Vec<&VersionId> = description.versions_with(Stage::Current).collect();
    if holders.contains(&&event.version) {
        debug!("version is already CURRENT");
        return Ok(());
    }

    if holders.len() > 1 {
        warn!(
            versions = ?holders.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            "multiple versions carry CURRENT, demoting the lowest token"
        );
    }
    let demoted = holders.first().copied();

    debug!(from = ?demoted.map(VersionId::as_str), "moving CURRENT");
    config
        .store
        .promote(&event.secret_id, &event.version, demoted)
        .await
        .map_err(|source| Error::StoreUnavailable {
            step: event.step,
            source,
        })?;

    info!(
        demoted = demoted.map_or("", VersionId::as_str),
        "promoted version to CURRENT"
    );
    Ok(())
}
