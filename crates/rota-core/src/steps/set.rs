//! `setSecret`: apply the pending credential downstream.

use tracing::debug;

use super::{decode, fetch_optional, fetch_required};
use crate::codec::SecretCodec;
use crate::config::RotationConfig;
use crate::error::{Error, Result};
use crate::service::ServiceClient;
use crate::stage::Stage;
use crate::store::SecretStore;
use crate::types::RotationEvent;

/// Hands the `CURRENT`, `PENDING` and (if any) `PREVIOUS` secrets to
/// [`ServiceClient::set`].
///
/// The step only reads from the store. A missing `PREVIOUS` value is passed
/// on as `None`; `CURRENT` and the `PENDING` value at the event's version
/// are required.
pub async fn set_secret<St, Sc, C>(
    config: &RotationConfig<St, Sc, C>,
    event: &RotationEvent,
) -> Result<()>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    debug!("fetching PREVIOUS value");
    let previous = fetch_optional(&config.store, event, Stage::Previous, None).await?;

    debug!("fetching CURRENT value");
    let current = fetch_required(&config.store, event, Stage::Current, None).await?;

    debug!("fetching PENDING value");
    let pending = fetch_required(&config.store, event, Stage::Pending, Some(&event.version)).await?;

    let current = decode(&config.codec, event, Stage::Current, &current)?;
    let pending = decode(&config.codec, event, Stage::Pending, &pending)?;
    let previous = previous
        .map(|value| decode(&config.codec, event, Stage::Previous, &value))
        .transpose()?;

    debug!(has_previous = previous.is_some(), "applying pending credential");
    config
        .service
        .set(&current, &pending, previous.as_ref())
        .await
        .map_err(|source| Error::Service {
            step: event.step,
            source,
        })
}
