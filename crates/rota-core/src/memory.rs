//! In-memory secret store.
//!
//! [`InMemorySecretStore`] implements [`SecretStore`] over a lock-guarded map.
//! It follows the staging rules a managed secret store enforces and is used
//! to exercise the rotation protocol without a backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::stage::{SecretDescription, Stage, StageLabel};
use crate::store::SecretStore;
use crate::types::{SecretId, SecretValue, VersionId};

/// One version of a stored secret.
#[derive(Debug, Clone, Default)]
struct StoredVersion {
    /// The payload; `None` while the version is staged but not yet written.
    value: Option<SecretValue>,
    /// Labels attached to the version.
    labels: BTreeSet<StageLabel>,
}

impl StoredVersion {
    fn has(&self, stage: Stage) -> bool {
        self.labels.contains(&StageLabel::Staged(stage))
    }
}

/// A stored secret with all its versions.
#[derive(Debug, Default)]
struct StoredSecret {
    rotation_enabled: bool,
    versions: BTreeMap<VersionId, StoredVersion>,
}

impl StoredSecret {
    /// Removes `stage` from every version, then attaches it to `version`.
    fn move_label(&mut self, stage: Stage, version: &VersionId) {
        for stored in self.versions.values_mut() {
            stored.labels.remove(&StageLabel::Staged(stage));
        }
        self.versions
            .entry(version.clone())
            .or_default()
            .labels
            .insert(StageLabel::Staged(stage));
    }

    fn describe(&self) -> SecretDescription {
        SecretDescription {
            rotation_enabled: self.rotation_enabled,
            versions: self
                .versions
                .iter()
                .map(|(version, stored)| (version.clone(), stored.labels.clone()))
                .collect(),
        }
    }
}

/// A secret store held entirely in memory.
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<SecretId, StoredSecret>>,
    writes: AtomicUsize,
}

impl InMemorySecretStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rotation-enabled secret whose first version is `CURRENT`.
    ///
    /// Returns the generated version token.
    pub fn create_secret(&self, secret_id: &SecretId, value: impl Into<SecretValue>) -> VersionId {
        let version = VersionId::generate();
        self.insert_version(secret_id, &version, Some(value.into()), [Stage::Current]);
        self.secrets
            .write()
            .entry(secret_id.clone())
            .or_default()
            .rotation_enabled = true;
        version
    }

    /// Inserts or replaces a version with exactly the given labels.
    ///
    /// No staging rule is applied, so this can seed any state, including
    /// states a real store would never produce. The secret is created with
    /// rotation enabled if it does not exist yet.
    pub fn insert_version<L>(
        &self,
        secret_id: &SecretId,
        version: &VersionId,
        value: Option<SecretValue>,
        labels: impl IntoIterator<Item = L>,
    ) where
        L: Into<StageLabel>,
    {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .entry(secret_id.clone())
            .or_insert_with(|| StoredSecret {
                rotation_enabled: true,
                versions: BTreeMap::new(),
            });
        secret.versions.insert(
            version.clone(),
            StoredVersion {
                value,
                labels: labels.into_iter().map(Into::into).collect(),
            },
        );
    }

    /// Enables or disables rotation for a secret.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the secret does not exist.
    pub fn set_rotation_enabled(&self, secret_id: &SecretId, enabled: bool) -> Result<(), StoreError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))?;
        secret.rotation_enabled = enabled;
        Ok(())
    }

    /// Labels `version` as `PENDING` without a value, as a scheduler does
    /// before invoking the first rotation step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the secret does not exist.
    pub fn stage_pending(&self, secret_id: &SecretId, version: &VersionId) -> Result<(), StoreError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))?;
        secret.move_label(Stage::Pending, version);
        Ok(())
    }

    /// Starts a rotation: mints a token and stages it as `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the secret does not exist.
    pub fn start_rotation(&self, secret_id: &SecretId) -> Result<VersionId, StoreError> {
        let version = VersionId::generate();
        self.stage_pending(secret_id, &version)?;
        Ok(version)
    }

    /// Returns the payload of a version, if it has one.
    #[must_use]
    pub fn value(&self, secret_id: &SecretId, version: &VersionId) -> Option<SecretValue> {
        self.secrets
            .read()
            .get(secret_id)
            .and_then(|secret| secret.versions.get(version))
            .and_then(|stored| stored.value.clone())
    }

    /// Returns a snapshot of the secret's stage map.
    #[must_use]
    pub fn snapshot(&self, secret_id: &SecretId) -> Option<SecretDescription> {
        self.secrets.read().get(secret_id).map(StoredSecret::describe)
    }

    /// Number of write calls (`put_pending_value`, `promote`) received.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lookup(
        &self,
        secret_id: &SecretId,
        stage: Stage,
        version: Option<&VersionId>,
    ) -> Result<SecretValue, StoreError> {
        let secrets = self.secrets.read();
        let secret = secrets
            .get(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))?;

        let stored = match version {
            Some(version) => secret.versions.get(version).filter(|stored| stored.has(stage)),
            None => secret.versions.values().find(|stored| stored.has(stage)),
        };

        stored
            .and_then(|stored| stored.value.clone())
            .ok_or_else(|| StoreError::missing_value(secret_id, stage, version))
    }

    fn write_pending(
        &self,
        secret_id: &SecretId,
        version: &VersionId,
        value: SecretValue,
    ) -> Result<(), StoreError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))?;

        let stored = secret.versions.entry(version.clone()).or_default();
        match &stored.value {
            Some(existing) if *existing != value => {
                return Err(StoreError::Conflict {
                    reason: format!(
                        "version {version} of secret {secret_id} already holds a different value"
                    ),
                });
            }
            Some(_) => {}
            None => stored.value = Some(value),
        }

        secret.move_label(Stage::Pending, version);
        debug!(secret_id = %secret_id, version = %version, "stored pending value");
        Ok(())
    }

    fn swap_current(
        &self,
        secret_id: &SecretId,
        to: &VersionId,
        from: Option<&VersionId>,
    ) -> Result<(), StoreError> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))?;

        if !secret.versions.contains_key(to) {
            return Err(StoreError::NotFound {
                resource: format!("version {to} of secret {secret_id}"),
            });
        }

        let holds_current = match from {
            Some(from) => secret
                .versions
                .get(from)
                .is_some_and(|stored| stored.has(Stage::Current)),
            None => !secret.versions.values().any(|stored| stored.has(Stage::Current)),
        };
        if !holds_current {
            return Err(StoreError::Conflict {
                reason: format!(
                    "CURRENT of secret {secret_id} is not at {}",
                    from.map_or("no version", VersionId::as_str)
                ),
            });
        }

        if let Some(from) = from.filter(|from| *from != to) {
            if let Some(demoted) = secret.versions.get_mut(from) {
                demoted.labels.remove(&StageLabel::Staged(Stage::Current));
            }
            secret.move_label(Stage::Previous, from);
        }

        if let Some(promoted) = secret.versions.get_mut(to) {
            promoted.labels.remove(&StageLabel::Staged(Stage::Pending));
        }
        // Strips CURRENT from every other holder, including stray ones.
        secret.move_label(Stage::Current, to);

        debug!(secret_id = %secret_id, to = %to, from = ?from, "moved CURRENT");
        Ok(())
    }
}

impl std::fmt::Debug for InMemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySecretStore")
            .field("secrets_count", &self.secrets.read().len())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl SecretStore for InMemorySecretStore {
    async fn get_secret_value(
        &self,
        secret_id: &SecretId,
        stage: Stage,
        version: Option<&VersionId>,
    ) -> Result<SecretValue, StoreError> {
        self.lookup(secret_id, stage, version)
    }

    async fn put_pending_value(
        &self,
        secret_id: &SecretId,
        version: &VersionId,
        value: SecretValue,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.write_pending(secret_id, version, value)
    }

    async fn describe_secret(&self, secret_id: &SecretId) -> Result<SecretDescription, StoreError> {
        self.snapshot(secret_id)
            .ok_or_else(|| StoreError::missing_secret(secret_id))
    }

    async fn promote(
        &self,
        secret_id: &SecretId,
        to: &VersionId,
        from: Option<&VersionId>,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.swap_current(secret_id, to, from)
    }
}
