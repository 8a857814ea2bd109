//! The secret store port.
//!
//! The rotation core never talks to a secret backend directly. It reads and
//! writes staged values and moves stage labels through [`SecretStore`], which
//! owns retries, backoff, and the atomicity of promotion.

use std::future::Future;
use std::sync::Arc;

use crate::error::StoreError;
use crate::stage::{SecretDescription, Stage};
use crate::types::{SecretId, SecretValue, VersionId};

/// Capabilities the rotation core requires from a secret backend.
pub trait SecretStore: Send + Sync {
    /// Fetches the payload of the version carrying `stage`.
    ///
    /// With `version` set, the payload of that exact version is returned,
    /// and only if it carries `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such staged value exists.
    fn get_secret_value(
        &self,
        secret_id: &SecretId,
        stage: Stage,
        version: Option<&VersionId>,
    ) -> impl Future<Output = Result<SecretValue, StoreError>> + Send;

    /// Stores `value` as version `version` labeled `PENDING`.
    ///
    /// The `PENDING` label moves off any other version.
    fn put_pending_value(
        &self,
        secret_id: &SecretId,
        version: &VersionId,
        value: SecretValue,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Describes the secret: rotation flag and labels per version.
    fn describe_secret(
        &self,
        secret_id: &SecretId,
    ) -> impl Future<Output = Result<SecretDescription, StoreError>> + Send;

    /// Moves `CURRENT` onto `to` and off `from` in one atomic operation.
    ///
    /// `from` is the version the caller observed as `CURRENT` (`None` if it
    /// observed none). The store must refuse the move if that no longer holds,
    /// which makes it the arbiter of racing promotions.
    fn promote(
        &self,
        secret_id: &SecretId,
        to: &VersionId,
        from: Option<&VersionId>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: SecretStore> SecretStore for Arc<T> {
    fn get_secret_value(
        &self,
        secret_id: &SecretId,
        stage: Stage,
        version: Option<&VersionId>,
    ) -> impl Future<Output = Result<SecretValue, StoreError>> + Send {
        (**self).get_secret_value(secret_id, stage, version)
    }

    fn put_pending_value(
        &self,
        secret_id: &SecretId,
        version: &VersionId,
        value: SecretValue,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).put_pending_value(secret_id, version, value)
    }

    fn describe_secret(
        &self,
        secret_id: &SecretId,
    ) -> impl Future<Output = Result<SecretDescription, StoreError>> + Send {
        (**self).describe_secret(secret_id)
    }

    fn promote(
        &self,
        secret_id: &SecretId,
        to: &VersionId,
        from: Option<&VersionId>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).promote(secret_id, to, from)
    }
}
