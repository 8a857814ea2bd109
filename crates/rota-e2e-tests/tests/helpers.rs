//! Test helpers for E2E tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;

use parking_lot::Mutex;
use rota_core::{
    InMemorySecretStore, JsonCodec, RotationConfig, RotationStep, Rotator, SecretCodec, SecretId,
    ServiceClient, ServiceError, Stage, TriggerPayload, VersionId,
};
use serde::{Deserialize, Serialize};

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("rota_core=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Database login stored as the secret payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub user: String,
    pub password: String,
}

impl Login {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

/// What the downstream system saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Created,
    Applied { current: Login, pending: Login },
    Tested(Login),
}

/// Downstream system that accepts only logins it issued or was seeded with.
#[derive(Debug, Default)]
pub struct Downstream {
    observed: Mutex<Vec<Observed>>,
    accepted: Mutex<Vec<Login>>,
    issued: Mutex<usize>,
    refuse_tests: Mutex<bool>,
}

impl Downstream {
    pub fn with_accepted(login: Login) -> Self {
        let downstream = Self::default();
        downstream.accepted.lock().push(login);
        downstream
    }

    pub fn observed(&self) -> Vec<Observed> {
        self.observed.lock().clone()
    }

    pub fn creates(&self) -> usize {
        self.observed()
            .iter()
            .filter(|o| matches!(o, Observed::Created))
            .count()
    }

    pub fn accepts(&self, login: &Login) -> bool {
        self.accepted.lock().contains(login)
    }

    pub fn refuse_tests(&self, refuse: bool) {
        *self.refuse_tests.lock() = refuse;
    }
}

impl ServiceClient for Downstream {
    type Secret = Login;

    async fn create(&self, secret: &mut Login) -> Result<(), ServiceError> {
        self.observed.lock().push(Observed::Created);
        let generation = {
            let mut issued = self.issued.lock();
            *issued += 1;
            *issued
        };
        secret.password = format!("generated-{generation}");
        Ok(())
    }

    async fn set(
        &self,
        current: &Login,
        pending: &Login,
        _previous: Option<&Login>,
    ) -> Result<(), ServiceError> {
        self.observed.lock().push(Observed::Applied {
            current: current.clone(),
            pending: pending.clone(),
        });
        if !self.accepts(current) {
            return Err(ServiceError::Rejected {
                reason: "current login is not valid".to_string(),
            });
        }
        let mut accepted = self.accepted.lock();
        if !accepted.contains(pending) {
            accepted.push(pending.clone());
        }
        Ok(())
    }

    async fn test(&self, secret: &Login) -> Result<(), ServiceError> {
        self.observed.lock().push(Observed::Tested(secret.clone()));
        if *self.refuse_tests.lock() || !self.accepts(secret) {
            return Err(ServiceError::Rejected {
                reason: "authentication failed".to_string(),
            });
        }
        Ok(())
    }
}

pub type LoginRotator = Rotator<Arc<InMemorySecretStore>, Arc<Downstream>, JsonCodec<Login>>;

/// A secret `app/db` with one `CURRENT` login, wired to a [`Downstream`].
pub struct Harness {
    pub secret_id: SecretId,
    pub initial: VersionId,
    pub store: Arc<InMemorySecretStore>,
    pub downstream: Arc<Downstream>,
    pub rotator: LoginRotator,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();

        let login = Login::new("app", "initial");
        let secret_id = SecretId::new("app/db").expect("valid id");
        let store = Arc::new(InMemorySecretStore::new());
        let downstream = Arc::new(Downstream::with_accepted(login.clone()));
        let codec = JsonCodec::<Login>::new();

        let initial = store.create_secret(&secret_id, codec.encode(&login).expect("encodes"));
        let rotator = Rotator::new(RotationConfig::new(
            Arc::clone(&store),
            Arc::clone(&downstream),
            codec,
        ));

        Self {
            secret_id,
            initial,
            store,
            downstream,
            rotator,
        }
    }

    /// Stages a new token as the scheduler would.
    pub fn start_rotation(&self) -> VersionId {
        self.store
            .start_rotation(&self.secret_id)
            .expect("secret exists")
    }

    pub fn payload(&self, token: &VersionId, step: RotationStep) -> TriggerPayload {
        TriggerPayload::new(self.secret_id.as_str(), token.as_str(), step.as_str())
    }

    pub async fn trigger(&self, token: &VersionId, step: RotationStep) -> rota_core::Result<()> {
        self.rotator.handle(self.payload(token, step)).await
    }

    /// Runs all four steps in order, failing on the first error.
    pub async fn rotate(&self, token: &VersionId) -> rota_core::Result<()> {
        for step in RotationStep::ALL {
            self.trigger(token, step).await?;
        }
        Ok(())
    }

    pub fn login_at(&self, version: &VersionId) -> Login {
        let value = self
            .store
            .value(&self.secret_id, version)
            .expect("version has a value");
        JsonCodec::<Login>::new().decode(&value).expect("decodes")
    }

    pub fn holders(&self, stage: Stage) -> Vec<VersionId> {
        self.store
            .snapshot(&self.secret_id)
            .expect("secret exists")
            .versions_with(stage)
            .cloned()
            .collect()
    }
}
