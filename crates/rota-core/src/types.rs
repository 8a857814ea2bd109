//! Core types for rotation events.
//!
//! - [`SecretId`]: a validated secret identifier (name or ARN)
//! - [`VersionId`]: a validated client request token naming one secret version
//! - [`SecretValue`]: opaque staged payload bytes that zeroize on drop
//! - [`RotationStep`]: the four protocol steps
//! - [`TriggerPayload`] / [`RotationEvent`]: the raw and validated trigger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Rejects empty, oversized, whitespace or control-character identifiers.
fn validate_token(kind: &str, value: &str, max_length: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidEvent {
            reason: format!("{kind} cannot be empty"),
        });
    }

    if value.len() > max_length {
        return Err(Error::InvalidEvent {
            reason: format!("{kind} exceeds maximum length of {max_length} bytes"),
        });
    }

    if let Some(c) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidEvent {
            reason: format!("{kind} contains invalid character {c:?}"),
        });
    }

    Ok(())
}

/// Identifier of a secret in the secret store.
///
/// Accepts plain names as well as ARNs. Must be non-empty, at most
/// [`SecretId::MAX_LENGTH`] bytes, and free of whitespace and control
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretId(String);

impl SecretId {
    /// Maximum length of a secret identifier.
    pub const MAX_LENGTH: usize = 2048;

    /// Creates a new `SecretId` after validating the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEvent`] if the identifier is invalid.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_token("secret id", &id, Self::MAX_LENGTH)?;
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SecretId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SecretId> for String {
    fn from(id: SecretId) -> Self {
        id.0
    }
}

impl AsRef<str> for SecretId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Client request token identifying one version of a secret.
///
/// Ordering is byte order of the token, which is what makes scans over a
/// secret's versions deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId(String);

impl VersionId {
    /// Maximum length of a version token.
    pub const MAX_LENGTH: usize = 64;

    /// Creates a new `VersionId` after validating the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEvent`] if the token is invalid.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        validate_token("client request token", &token, Self::MAX_LENGTH)?;
        Ok(Self(token))
    }

    /// Mints a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VersionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> Self {
        id.0
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Staged secret payload as held by the secret store.
///
/// The bytes are cleared from memory when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    data: Vec<u8>,
}

impl SecretValue {
    /// Creates a new `SecretValue` from payload bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the payload as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the payload as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Returns the length of the payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for SecretValue {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&str> for SecretValue {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("len", &self.data.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.data.ct_eq(&other.data).into()
    }
}

impl Eq for SecretValue {}

/// One step of the four-step rotation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationStep {
    /// Generate a new credential and stage it as `PENDING`.
    Create,
    /// Apply the pending credential to the downstream system.
    Set,
    /// Verify the pending credential works.
    Test,
    /// Promote the pending version to `CURRENT`.
    Finish,
}

impl RotationStep {
    /// All steps, in protocol order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Set, Self::Test, Self::Finish];

    /// Returns the step name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "createSecret",
            Self::Set => "setSecret",
            Self::Test => "testSecret",
            Self::Finish => "finishSecret",
        }
    }
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| Error::UnknownStep { step: s.to_string() })
    }
}

/// Raw trigger payload delivered by the rotation scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// The secret name or ARN.
    #[serde(rename = "SecretId")]
    pub secret_id: String,
    /// The version token of the candidate secret version.
    #[serde(rename = "ClientRequestToken")]
    pub client_request_token: String,
    /// The rotation step name.
    #[serde(rename = "Step")]
    pub step: String,
}

impl TriggerPayload {
    /// Creates a payload from its three fields.
    #[must_use]
    pub fn new(
        secret_id: impl Into<String>,
        client_request_token: impl Into<String>,
        step: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            client_request_token: client_request_token.into(),
            step: step.into(),
        }
    }
}

/// A validated rotation trigger.
///
/// Re-deliveries of the same trigger carry the same version token; there is
/// no retry counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    /// The secret being rotated.
    pub secret_id: SecretId,
    /// The candidate version token.
    pub version: VersionId,
    /// The step to execute.
    pub step: RotationStep,
}

impl RotationEvent {
    /// Creates a new event.
    #[must_use]
    pub const fn new(secret_id: SecretId, version: VersionId, step: RotationStep) -> Self {
        Self {
            secret_id,
            version,
            step,
        }
    }
}

impl TryFrom<TriggerPayload> for RotationEvent {
    type Error = Error;

    /// The step is parsed first so a protocol mismatch is reported as such
    /// even when the identifiers are also malformed.
    fn try_from(payload: TriggerPayload) -> Result<Self> {
        let step = payload.step.parse()?;
        let secret_id = SecretId::new(payload.secret_id)?;
        let version = VersionId::new(payload.client_request_token)?;
        Ok(Self::new(secret_id, version, step))
    }
}
