//! API key pair rotation.
//!
//! The rotated secret is a flat attribute map in which one attribute holds
//! the API key id and another holds the API key secret. Rotation mints a new
//! key with the same spec as the current one; the old key stays valid until
//! the issuing system retires it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rota_core::{ServiceClient, ServiceError};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{PluginError, Result};

/// Secret shape handled by [`ApiKeyPairClient`].
pub type AttributeSecret = BTreeMap<String, String>;

/// Environment variable naming the key id attribute.
pub const ATTRIBUTE_KEY_ENV: &str = "ATTRIBUTE_KEY";
/// Environment variable naming the key secret attribute.
pub const ATTRIBUTE_SECRET_ENV: &str = "ATTRIBUTE_SECRET";
/// Default key id attribute.
pub const DEFAULT_ATTRIBUTE_KEY: &str = "user";
/// Default key secret attribute.
pub const DEFAULT_ATTRIBUTE_SECRET: &str = "password";

const ROTATED_SUFFIX: &str = "-rotate";

/// Credentials the client presents to the key issuing API.
#[derive(Clone)]
pub struct AdminCredentials {
    /// Admin API key.
    pub api_key: String,
    /// Admin API secret.
    pub api_secret: Zeroizing<String>,
}

impl AdminCredentials {
    /// Creates admin credentials, rejecting empty values.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if either value is empty.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = Zeroizing::new(api_secret.into());
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(PluginError::Config {
                reason: "admin API key-secret pair must be provided".to_string(),
            });
        }
        Ok(Self {
            api_key,
            api_secret,
        })
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Which attributes of the secret hold the key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyPairSettings {
    /// Attribute holding the API key id.
    pub attribute_key: String,
    /// Attribute holding the API key secret.
    pub attribute_secret: String,
}

impl Default for ApiKeyPairSettings {
    fn default() -> Self {
        Self {
            attribute_key: DEFAULT_ATTRIBUTE_KEY.to_string(),
            attribute_secret: DEFAULT_ATTRIBUTE_SECRET.to_string(),
        }
    }
}

impl ApiKeyPairSettings {
    /// Reads attribute names from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if both attributes resolve to the same name.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads attribute names through `lookup`. Unset or empty values fall
    /// back to `user` and `password`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if both attributes resolve to the same name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let settings = Self {
            attribute_key: read(ATTRIBUTE_KEY_ENV, DEFAULT_ATTRIBUTE_KEY),
            attribute_secret: read(ATTRIBUTE_SECRET_ENV, DEFAULT_ATTRIBUTE_SECRET),
        };
        if settings.attribute_key == settings.attribute_secret {
            return Err(PluginError::Config {
                reason: format!(
                    "key and secret attributes must differ, both are {:?}",
                    settings.attribute_key
                ),
            });
        }
        Ok(settings)
    }
}

/// Properties of an API key that carry over to its replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeySpec {
    /// Human-readable name.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Principal owning the key.
    pub owner: String,
    /// Resource the key grants access to.
    pub resource: String,
}

/// An API key as returned by the issuing system.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Key id.
    pub id: String,
    /// Key properties.
    pub spec: ApiKeySpec,
    /// Key secret; only present on freshly minted keys.
    pub secret: Option<Zeroizing<String>>,
}

impl ApiKey {
    /// Checks that an existing key read back from the issuer has an id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if the id is empty.
    pub fn validate_existing(&self) -> std::result::Result<(), ServiceError> {
        if self.id.is_empty() {
            return Err(ServiceError::Rejected {
                reason: "existing API key is corrupt: id is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Checks that a freshly minted key has an id and a secret.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if either is missing.
    pub fn validate_minted(&self) -> std::result::Result<(), ServiceError> {
        if self.id.is_empty() {
            return Err(ServiceError::Rejected {
                reason: "new API key is corrupt: id is empty".to_string(),
            });
        }
        if self.secret.as_ref().is_none_or(|secret| secret.is_empty()) {
            return Err(ServiceError::Rejected {
                reason: "new API key is corrupt: secret is empty".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The key issuing API the client drives.
pub trait ApiKeyIssuer: Send + Sync {
    /// Reads an existing key by id.
    fn read_key(
        &self,
        admin: &AdminCredentials,
        id: &str,
    ) -> impl Future<Output = std::result::Result<ApiKey, ServiceError>> + Send;

    /// Mints a new key with the given spec.
    fn create_key(
        &self,
        admin: &AdminCredentials,
        spec: &ApiKeySpec,
    ) -> impl Future<Output = std::result::Result<ApiKey, ServiceError>> + Send;
}

impl<T: ApiKeyIssuer> ApiKeyIssuer for Arc<T> {
    fn read_key(
        &self,
        admin: &AdminCredentials,
        id: &str,
    ) -> impl Future<Output = std::result::Result<ApiKey, ServiceError>> + Send {
        (**self).read_key(admin, id)
    }

    fn create_key(
        &self,
        admin: &AdminCredentials,
        spec: &ApiKeySpec,
    ) -> impl Future<Output = std::result::Result<ApiKey, ServiceError>> + Send {
        (**self).create_key(admin, spec)
    }
}

/// Service client rotating an API key pair stored in an attribute map.
#[derive(Debug)]
pub struct ApiKeyPairClient<I> {
    issuer: I,
    admin: AdminCredentials,
    settings: ApiKeyPairSettings,
}

impl<I: ApiKeyIssuer> ApiKeyPairClient<I> {
    /// Creates a client.
    #[must_use]
    pub const fn new(issuer: I, admin: AdminCredentials, settings: ApiKeyPairSettings) -> Self {
        Self {
            issuer,
            admin,
            settings,
        }
    }

    /// Returns the attribute settings.
    #[must_use]
    pub const fn settings(&self) -> &ApiKeyPairSettings {
        &self.settings
    }

    /// Attributes other than the key pair, which must survive rotation unchanged.
    fn other_attributes<'a>(&self, secret: &'a AttributeSecret) -> BTreeSet<(&'a String, &'a String)> {
        secret
            .iter()
            .filter(|(name, _)| {
                **name != self.settings.attribute_key && **name != self.settings.attribute_secret
            })
            .collect()
    }
}

fn attribute<'a>(
    secret: &'a AttributeSecret,
    name: &str,
) -> std::result::Result<&'a String, ServiceError> {
    secret.get(name).ok_or_else(|| ServiceError::InvalidSecret {
        reason: format!("{name:?} field not found"),
    })
}

/// Prefixes an error with which of the two secrets it concerns.
fn concerning(which: &str, err: ServiceError) -> ServiceError {
    match err {
        ServiceError::InvalidSecret { reason } => ServiceError::InvalidSecret {
            reason: format!("{which} secret: {reason}"),
        },
        ServiceError::Rejected { reason } => ServiceError::Rejected {
            reason: format!("{which} secret: {reason}"),
        },
        ServiceError::Unavailable { reason } => ServiceError::Unavailable {
            reason: format!("{which} secret: {reason}"),
        },
    }
}

fn rotated_display_name(name: &str) -> String {
    if name.ends_with(ROTATED_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ROTATED_SUFFIX}")
    }
}

impl<I: ApiKeyIssuer> ServiceClient for ApiKeyPairClient<I> {
    type Secret = AttributeSecret;

    async fn create(&self, secret: &mut AttributeSecret) -> std::result::Result<(), ServiceError> {
        let current_id = attribute(secret, &self.settings.attribute_key)?.clone();

        debug!(key_id = %current_id, "reading current API key");
        let current = self.issuer.read_key(&self.admin, &current_id).await?;
        current.validate_existing()?;

        let spec = ApiKeySpec {
            display_name: rotated_display_name(&current.spec.display_name),
            ..current.spec.clone()
        };
        let minted = self.issuer.create_key(&self.admin, &spec).await?;
        minted.validate_minted()?;

        let minted_secret = minted
            .secret
            .as_ref()
            .map(|secret| secret.as_str().to_string())
            .unwrap_or_default();
        info!(old_key = %current_id, new_key = %minted.id, "minted API key");
        secret.insert(self.settings.attribute_key.clone(), minted.id);
        secret.insert(self.settings.attribute_secret.clone(), minted_secret);
        Ok(())
    }

    async fn set(
        &self,
        current: &AttributeSecret,
        pending: &AttributeSecret,
        _previous: Option<&AttributeSecret>,
    ) -> std::result::Result<(), ServiceError> {
        self.test(current).await.map_err(|e| concerning("current", e))?;
        self.test(pending).await.map_err(|e| concerning("pending", e))?;

        let key = &self.settings.attribute_key;
        let secret = &self.settings.attribute_secret;

        if attribute(current, key)? == attribute(pending, key)? {
            return Err(ServiceError::Rejected {
                reason: format!("API key {key:?} shall be modified"),
            });
        }
        if attribute(current, secret)? == attribute(pending, secret)? {
            return Err(ServiceError::Rejected {
                reason: format!("API secret {secret:?} shall be modified"),
            });
        }
        if self.other_attributes(current) != self.other_attributes(pending) {
            return Err(ServiceError::Rejected {
                reason: "additional attributes of the current and pending secrets shall match"
                    .to_string(),
            });
        }
        Ok(())
    }

    async fn test(&self, secret: &AttributeSecret) -> std::result::Result<(), ServiceError> {
        let id = attribute(secret, &self.settings.attribute_key)?;
        attribute(secret, &self.settings.attribute_secret)?;

        self.issuer.read_key(&self.admin, id).await?.validate_existing()
    }
}
