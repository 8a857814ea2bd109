//! # Rota Plugins
//!
//! [`ServiceClient`](rota_core::ServiceClient) implementations for common
//! credential systems.
//!
//! - [`ApiKeyPairClient`]: mints a replacement API key pair through an
//!   [`ApiKeyIssuer`] and stores it in an attribute map
//! - [`RolePasswordClient`]: resets a database role password through a
//!   [`PasswordResetter`] and verifies it with a [`ConnectionProber`]
//!
//! The remote APIs stay behind traits so the clients can run against any
//! transport.

pub mod api_key;
pub mod error;
pub mod role_password;

pub use api_key::{
    AdminCredentials, ApiKey, ApiKeyIssuer, ApiKeyPairClient, ApiKeyPairSettings, ApiKeySpec,
    AttributeSecret,
};
pub use error::{PluginError, Result};
pub use role_password::{ConnectionProber, PasswordResetter, RolePasswordClient, RoleSecret};
