//! Conversion between staged payload bytes and the caller's secret type.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;
use crate::types::SecretValue;

/// Decodes staged payloads into a typed secret and encodes them back.
///
/// Every staged payload is decoded independently from its own store read,
/// so the `current`, `pending` and `previous` secrets handed to a service
/// client never alias each other.
pub trait SecretCodec: Send + Sync {
    /// The typed secret the service client works with.
    type Secret: Send + Sync;

    /// Decodes a staged payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the payload does not match the secret type.
    fn decode(&self, value: &SecretValue) -> Result<Self::Secret, CodecError>;

    /// Encodes a secret into a payload for staging.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the secret cannot be serialized.
    fn encode(&self, secret: &Self::Secret) -> Result<SecretValue, CodecError>;
}

/// JSON codec for any serde-compatible secret type.
pub struct JsonCodec<S> {
    _secret: PhantomData<fn() -> S>,
}

impl<S> JsonCodec<S> {
    /// Creates a JSON codec for `S`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _secret: PhantomData,
        }
    }
}

impl<S> Default for JsonCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for JsonCodec<S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for JsonCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("secret", &std::any::type_name::<S>())
            .finish()
    }
}

impl<S> SecretCodec for JsonCodec<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    type Secret = S;

    fn decode(&self, value: &SecretValue) -> Result<S, CodecError> {
        // Only the position is reported: serde_json messages can quote payload text.
        serde_json::from_slice(value.as_bytes()).map_err(|e| CodecError::Decode {
            reason: format!(
                "{:?} error at line {} column {}",
                e.classify(),
                e.line(),
                e.column()
            ),
        })
    }

    fn encode(&self, secret: &S) -> Result<SecretValue, CodecError> {
        serde_json::to_vec(secret)
            .map(SecretValue::new)
            .map_err(|e| CodecError::Encode {
                reason: e.to_string(),
            })
    }
}
