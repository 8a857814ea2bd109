//! `testSecret`: verify the pending credential before promotion.

use tracing::debug;

use super::{decode, fetch_required};
use crate::codec::SecretCodec;
use crate::config::RotationConfig;
use crate::error::{Error, Result};
use crate::service::ServiceClient;
use crate::stage::Stage;
use crate::store::SecretStore;
use crate::types::RotationEvent;

/// Decodes the `PENDING` value at the event's version and passes it to
/// [`ServiceClient::test`]. A failing test is returned as is and blocks
/// promotion until the scheduler retries.
pub async fn test_secret<St, Sc, C>(
    config: &RotationConfig<St, Sc, C>,
    event: &RotationEvent,
) -> Result<()>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    debug!("fetching PENDING value");
    let pending = fetch_required(&config.store, event, Stage::Pending, Some(&event.version)).await?;
    let pending = decode(&config.codec, event, Stage::Pending, &pending)?;

    debug!("testing pending credential");
    config
        .service
        .test(&pending)
        .await
        .map_err(|source| Error::Service {
            step: event.step,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{Call, Credential, Fixture};
    use crate::types::{RotationStep, SecretValue};

    #[tokio::test]
    async fn tests_pending_credential() {
        let fixture = Fixture::new();
        fixture.seed("v1", &Credential::new("app", "pw-1"), [Stage::Pending]);
        let event = fixture.event("v1", RotationStep::Test);

        test_secret(&fixture.config, &event).await.expect("test succeeds");

        assert_eq!(
            fixture.service.calls(),
            vec![Call::Test(Credential::new("app", "pw-1"))]
        );
    }

    #[tokio::test]
    async fn failure_leaves_stage_map_unchanged() {
        let fixture = Fixture::new();
        fixture.seed("v1", &Credential::new("app", "pw-1"), [Stage::Pending]);
        fixture.service.fail_test(ServiceError::Rejected {
            reason: "authentication failed".to_string(),
        });
        let before = fixture.store.snapshot(&fixture.secret_id);
        let event = fixture.event("v1", RotationStep::Test);

        let err = test_secret(&fixture.config, &event).await.expect_err("test fails");

        assert!(matches!(
            err,
            Error::Service {
                step: RotationStep::Test,
                ..
            }
        ));
        assert_eq!(fixture.store.snapshot(&fixture.secret_id), before);
        assert_eq!(fixture.store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_pending_is_a_store_error() {
        let fixture = Fixture::new();
        let event = fixture.event("v1", RotationStep::Test);

        let err = test_secret(&fixture.config, &event).await.expect_err("no pending");
        assert!(matches!(err, Error::StoreUnavailable { .. }));
        assert!(fixture.service.calls().is_empty());
    }

    #[tokio::test]
    async fn faulty_pending_value_is_a_codec_error() {
        let fixture = Fixture::new();
        fixture.store.insert_version(
            &fixture.secret_id,
            &fixture.version("v1"),
            Some(SecretValue::from(r#"{"user":42}"#)),
            [Stage::Pending],
        );
        let event = fixture.event("v1", RotationStep::Test);

        let err = test_secret(&fixture.config, &event).await.expect_err("bad payload");
        assert!(matches!(
            err,
            Error::Codec {
                stage: Stage::Pending,
                ..
            }
        ));
    }
}
