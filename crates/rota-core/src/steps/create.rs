//! `createSecret`: stage a new credential as `PENDING`.

use tracing::{debug, info};

use super::{decode, fetch_optional, fetch_required};
use crate::codec::SecretCodec;
use crate::config::RotationConfig;
use crate::error::{Error, Result};
use crate::service::ServiceClient;
use crate::stage::Stage;
use crate::store::SecretStore;
use crate::types::RotationEvent;

/// Ensures a `PENDING` value exists at the event's version.
///
/// If one is already staged the step returns without calling the service
/// client, which is what makes re-delivery safe. Otherwise the `CURRENT`
/// secret is decoded, handed to [`ServiceClient::create`] to receive new
/// credential material, encoded and stored as `PENDING`.
///
/// # Errors
///
/// Fails with [`Error::StoreUnavailable`] if the secret has no `CURRENT`
/// value: rotation cannot begin before the secret has an active value.
pub async fn create_secret<St, Sc, C>(
    config: &RotationConfig<St, Sc, C>,
    event: &RotationEvent,
) -> Result<()>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    debug!("fetching CURRENT value");
    let current = fetch_required(&config.store, event, Stage::Current, None).await?;

    debug!("checking for an existing PENDING value");
    if fetch_optional(&config.store, event, Stage::Pending, Some(&event.version))
        .await?
        .is_some()
    {
        debug!("PENDING value already staged");
        return Ok(());
    }

    let mut secret = decode(&config.codec, event, Stage::Current, &current)?;

    debug!("generating new credential");
    config
        .service
        .create(&mut secret)
        .await
        .map_err(|source| Error::Service {
            step: event.step,
            source,
        })?;

    let pending = config.codec.encode(&secret).map_err(|source| Error::Codec {
        step: event.step,
        stage: Stage::Pending,
        source,
    })?;

    config
        .store
        .put_pending_value(&event.secret_id, &event.version, pending)
        .await
        .map_err(|source| Error::StoreUnavailable {
            step: event.step,
            source,
        })?;

    info!("staged new PENDING value");
    Ok(())
}
