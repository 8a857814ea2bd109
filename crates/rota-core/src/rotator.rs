//! Event routing.
//!
//! [`Rotator`] validates each rotation event against the store and then runs
//! exactly one step handler.
//!
//! ```text
//! trigger ──► parse step ──► describe secret ──► validate ──► step handler
//!               │                                   │
//!               └── UnknownStep                     └── RotationDisabled / VersionNotStaged
//! ```

use tracing::{Instrument, debug, error, info_span};

use crate::codec::SecretCodec;
use crate::config::RotationConfig;
use crate::error::{Error, Result};
use crate::service::ServiceClient;
use crate::steps::{create_secret, finish_secret, set_secret, test_secret};
use crate::store::SecretStore;
use crate::types::{RotationEvent, RotationStep, TriggerPayload};
use crate::validator::validate_event;

/// Handles rotation events with a fixed configuration.
///
/// Holds no mutable state; one `Rotator` can serve any number of
/// concurrent invocations.
#[derive(Debug, Clone)]
pub struct Rotator<St, Sc, C> {
    config: RotationConfig<St, Sc, C>,
}

impl<St, Sc, C> Rotator<St, Sc, C>
where
    St: SecretStore,
    Sc: ServiceClient,
    C: SecretCodec<Secret = Sc::Secret>,
{
    /// Creates a rotator.
    #[must_use]
    pub const fn new(config: RotationConfig<St, Sc, C>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RotationConfig<St, Sc, C> {
        &self.config
    }

    /// Handles a JSON-encoded trigger payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEvent`] if the bytes are not a trigger payload,
    /// otherwise whatever [`Rotator::handle`] returns.
    pub async fn handle_json(&self, raw: &[u8]) -> Result<()> {
        let payload: TriggerPayload =
            serde_json::from_slice(raw).map_err(|e| Error::InvalidEvent {
                reason: format!("malformed trigger payload: {e}"),
            })?;
        self.handle(payload).await
    }

    /// Handles a raw trigger payload.
    ///
    /// The step name is checked before any store call, so an unknown step
    /// fails closed with [`Error::UnknownStep`].
    pub async fn handle(&self, payload: TriggerPayload) -> Result<()> {
        let event = RotationEvent::try_from(payload).inspect_err(|err| {
            error!(error = %err, category = %err.category(), "rejected rotation trigger");
        })?;
        self.handle_event(&event).await
    }

    /// Validates `event` and runs its step.
    pub async fn handle_event(&self, event: &RotationEvent) -> Result<()> {
        let span = info_span!(
            "rotation",
            secret_id = %event.secret_id,
            version = %event.version,
            step = %event.step,
        );

        async {
            debug!("handling rotation event");
            let result = self.validate_and_run(event).await;
            match &result {
                Ok(()) => debug!("rotation step completed"),
                Err(err) => error!(
                    error = %err,
                    category = %err.category(),
                    retryable = err.is_retryable(),
                    "rotation step failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn validate_and_run(&self, event: &RotationEvent) -> Result<()> {
        let description = self
            .config
            .store
            .describe_secret(&event.secret_id)
            .await
            .map_err(|source| Error::StoreUnavailable {
                step: event.step,
                source,
            })?;
        validate_event(event, &description)?;

        match event.step {
            RotationStep::Create => create_secret(&self.config, event).await,
            RotationStep::Set => set_secret(&self.config, event).await,
            RotationStep::Test => test_secret(&self.config, event).await,
            RotationStep::Finish => finish_secret(&self.config, event).await,
        }
    }
}
