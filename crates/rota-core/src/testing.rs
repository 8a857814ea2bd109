//! Shared fixtures for the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::codec::{JsonCodec, SecretCodec};
use crate::config::RotationConfig;
use crate::error::ServiceError;
use crate::memory::InMemorySecretStore;
use crate::rotator::Rotator;
use crate::service::ServiceClient;
use crate::stage::StageLabel;
use crate::types::{RotationEvent, RotationStep, SecretId, VersionId};

/// Minimal credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user: String,
    pub password: String,
}

impl Credential {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

/// A call received by [`FakeServiceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    Set {
        current: Credential,
        pending: Credential,
        previous: Option<Credential>,
    },
    Test(Credential),
}

/// Service client that records calls and fails on demand.
#[derive(Debug, Default)]
pub struct FakeServiceClient {
    calls: Mutex<Vec<Call>>,
    create_error: Mutex<Option<ServiceError>>,
    set_error: Mutex<Option<ServiceError>>,
    test_error: Mutex<Option<ServiceError>>,
}

impl FakeServiceClient {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn fail_create(&self, err: ServiceError) {
        *self.create_error.lock() = Some(err);
    }

    pub fn fail_set(&self, err: ServiceError) {
        *self.set_error.lock() = Some(err);
    }

    pub fn fail_test(&self, err: ServiceError) {
        *self.test_error.lock() = Some(err);
    }

    fn creates(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Create))
            .count()
    }
}

impl ServiceClient for FakeServiceClient {
    type Secret = Credential;

    async fn create(&self, secret: &mut Credential) -> Result<(), ServiceError> {
        if let Some(err) = self.create_error.lock().clone() {
            return Err(err);
        }
        let generation = self.creates() + 1;
        self.calls.lock().push(Call::Create);
        secret.password = format!("pw-{generation}");
        Ok(())
    }

    async fn set(
        &self,
        current: &Credential,
        pending: &Credential,
        previous: Option<&Credential>,
    ) -> Result<(), ServiceError> {
        self.calls.lock().push(Call::Set {
            current: current.clone(),
            pending: pending.clone(),
            previous: previous.cloned(),
        });
        self.set_error.lock().clone().map_or(Ok(()), Err)
    }

    async fn test(&self, secret: &Credential) -> Result<(), ServiceError> {
        self.calls.lock().push(Call::Test(secret.clone()));
        self.test_error.lock().clone().map_or(Ok(()), Err)
    }
}

pub type FixtureConfig =
    RotationConfig<Arc<InMemorySecretStore>, Arc<FakeServiceClient>, JsonCodec<Credential>>;

/// A secret `db-user` in an in-memory store, wired to a fake service client.
pub struct Fixture {
    pub secret_id: SecretId,
    pub store: Arc<InMemorySecretStore>,
    pub service: Arc<FakeServiceClient>,
    pub config: FixtureConfig,
}

impl Fixture {
    /// Store without the secret.
    pub fn empty() -> Self {
        let store = Arc::new(InMemorySecretStore::new());
        let service = Arc::new(FakeServiceClient::default());
        let config = RotationConfig::new(Arc::clone(&store), Arc::clone(&service), JsonCodec::new());
        Self {
            secret_id: SecretId::new("db-user").expect("valid id"),
            store,
            service,
            config,
        }
    }

    /// Secret with `v0` as `CURRENT` holding `app` / `pw-0`.
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.seed(
            "v0",
            &Credential::new("app", "pw-0"),
            [crate::stage::Stage::Current],
        );
        fixture
    }

    pub fn version(&self, token: &str) -> VersionId {
        VersionId::new(token).expect("valid version")
    }

    pub fn event(&self, token: &str, step: RotationStep) -> RotationEvent {
        RotationEvent::new(self.secret_id.clone(), self.version(token), step)
    }

    pub fn seed<L: Into<StageLabel>>(
        &self,
        token: &str,
        credential: &Credential,
        labels: impl IntoIterator<Item = L>,
    ) {
        let value = self.config.codec.encode(credential).expect("encodes");
        self.store
            .insert_version(&self.secret_id, &self.version(token), Some(value), labels);
    }

    pub fn pending_credential(&self, token: &str) -> Credential {
        let value = self
            .store
            .value(&self.secret_id, &self.version(token))
            .expect("version has a value");
        self.config.codec.decode(&value).expect("decodes")
    }

    pub fn rotator(&self) -> Rotator<Arc<InMemorySecretStore>, Arc<FakeServiceClient>, JsonCodec<Credential>> {
        Rotator::new(self.config.clone())
    }
}
