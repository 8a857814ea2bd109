//! The service client port.
//!
//! A [`ServiceClient`] knows how to mint, apply and verify credentials in the
//! downstream system being rotated (a database role, an API key pair, a
//! broker user). The core only sequences the calls.

use std::future::Future;
use std::sync::Arc;

use crate::error::ServiceError;

/// Capabilities the rotation core requires from the credential system.
pub trait ServiceClient: Send + Sync {
    /// The typed secret this client understands.
    type Secret: Send + Sync;

    /// Generates new credential material, writing it into `secret`.
    ///
    /// `secret` arrives decoded from the `CURRENT` version; everything the
    /// client does not overwrite is carried into the pending version.
    fn create(
        &self,
        secret: &mut Self::Secret,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Applies the pending credential to the downstream system.
    ///
    /// `previous` is `None` when the secret has never been rotated.
    /// Implementations may enforce their own consistency checks between
    /// `current` and `pending`.
    fn set(
        &self,
        current: &Self::Secret,
        pending: &Self::Secret,
        previous: Option<&Self::Secret>,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Verifies the credential in `secret` is usable.
    fn test(&self, secret: &Self::Secret) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

impl<T: ServiceClient> ServiceClient for Arc<T> {
    type Secret = T::Secret;

    fn create(
        &self,
        secret: &mut Self::Secret,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).create(secret)
    }

    fn set(
        &self,
        current: &Self::Secret,
        pending: &Self::Secret,
        previous: Option<&Self::Secret>,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).set(current, pending, previous)
    }

    fn test(&self, secret: &Self::Secret) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).test(secret)
    }
}
