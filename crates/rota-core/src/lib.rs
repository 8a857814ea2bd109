//! # Rota Core
//!
//! Staged credential rotation for managed secret stores.
//!
//! A rotation scheduler invokes the rotator once per protocol step with the
//! same version token:
//!
//! 1. **createSecret**: generate a credential and stage it as `PENDING`
//! 2. **setSecret**: apply the pending credential to the downstream system
//! 3. **testSecret**: verify the pending credential works
//! 4. **finishSecret**: atomically promote `PENDING` to `CURRENT`
//!
//! Every step is safe to re-invoke. The core reaches the secret backend only
//! through [`SecretStore`] and the credential system only through
//! [`ServiceClient`].
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use rota_core::{
//!     InMemorySecretStore, JsonCodec, RotationConfig, Rotator, SecretId, ServiceClient,
//!     ServiceError, TriggerPayload,
//! };
//!
//! struct Noop;
//!
//! impl ServiceClient for Noop {
//!     type Secret = BTreeMap<String, String>;
//!
//!     async fn create(&self, secret: &mut Self::Secret) -> Result<(), ServiceError> {
//!         secret.insert("password".to_string(), "fresh".to_string());
//!         Ok(())
//!     }
//!
//!     async fn set(
//!         &self,
//!         _current: &Self::Secret,
//!         _pending: &Self::Secret,
//!         _previous: Option<&Self::Secret>,
//!     ) -> Result<(), ServiceError> {
//!         Ok(())
//!     }
//!
//!     async fn test(&self, _secret: &Self::Secret) -> Result<(), ServiceError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemorySecretStore::new();
//! let id = SecretId::new("db-user")?;
//! store.create_secret(&id, r#"{"user":"app","password":"old"}"#);
//! let token = store.start_rotation(&id)?;
//!
//! let rotator = Rotator::new(RotationConfig::new(store, Noop, JsonCodec::new()));
//! rotator
//!     .handle(TriggerPayload::new("db-user", token.as_str(), "createSecret"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod rotator;
pub mod service;
pub mod stage;
pub mod steps;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod validator;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{CodecError, Error, ErrorCategory, Result, ServiceError, StoreError};
pub use types::{RotationEvent, RotationStep, SecretId, SecretValue, TriggerPayload, VersionId};

pub use stage::{SecretDescription, Stage, StageLabel};

pub use codec::{JsonCodec, SecretCodec};

pub use config::{RotationConfig, RotationSettings, parse_flag};

pub use store::SecretStore;

pub use service::ServiceClient;

pub use memory::InMemorySecretStore;

pub use rotator::Rotator;

pub use validator::validate_event;
