//! The four rotation steps.
//!
//! Each step is independently invokable and safe to re-invoke with the same
//! event:
//!
//! - [`create_secret`] stages a freshly generated `PENDING` version, once
//! - [`set_secret`] applies the pending credential downstream; reads only
//! - [`test_secret`] verifies the pending credential; reads only
//! - [`finish_secret`] atomically promotes `PENDING` to `CURRENT`, once
//!
//! None of the steps compensates for a failure. Re-delivery of the trigger
//! is the recovery path.

mod create;
mod finish;
mod set;
mod verify;

pub use create::create_secret;
pub use finish::finish_secret;
pub use set::set_secret;
pub use verify::test_secret;

use crate::codec::SecretCodec;
use crate::error::{Error, Result};
use crate::stage::Stage;
use crate::store::SecretStore;
use crate::types::{RotationEvent, SecretValue, VersionId};

/// Reads a staged value that must exist.
async fn fetch_required<St: SecretStore>(
    store: &St,
    event: &RotationEvent,
    stage: Stage,
    version: Option<&VersionId>,
) -> Result<SecretValue> {
    store
        .get_secret_value(&event.secret_id, stage, version)
        .await
        .map_err(|source| Error::StoreUnavailable {
            step: event.step,
            source,
        })
}

/// Reads a staged value whose absence is not an error.
async fn fetch_optional<St: SecretStore>(
    store: &St,
    event: &RotationEvent,
    stage: Stage,
    version: Option<&VersionId>,
) -> Result<Option<SecretValue>> {
    match store.get_secret_value(&event.secret_id, stage, version).await {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(source) => Err(Error::StoreUnavailable {
            step: event.step,
            source,
        }),
    }
}

fn decode<C: SecretCodec>(
    codec: &C,
    event: &RotationEvent,
    stage: Stage,
    value: &SecretValue,
) -> Result<C::Secret> {
    codec.decode(value).map_err(|source| Error::Codec {
        step: event.step,
        stage,
        source,
    })
}
