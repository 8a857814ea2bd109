//! Error types for the rotation core.
//!
//! [`Error`] is what a rotation invocation reports to its caller. The port
//! and codec failures it wraps ([`StoreError`], [`ServiceError`],
//! [`CodecError`]) are produced by the collaborators themselves.

use std::fmt;

use thiserror::Error;

use crate::stage::Stage;
use crate::types::{RotationStep, SecretId, VersionId};

/// Errors that can occur while handling a rotation event.
#[derive(Debug, Error)]
pub enum Error {
    /// The trigger payload could not be turned into a rotation event.
    #[error("invalid rotation event: {reason}")]
    InvalidEvent {
        /// Why the event was rejected.
        reason: String,
    },

    /// The trigger named a step outside the four-step protocol.
    #[error("unknown step {step}")]
    UnknownStep {
        /// The step name as received.
        step: String,
    },

    /// The store reports rotation as disabled for the secret.
    #[error("{step}: secret {secret_id} is not enabled for rotation")]
    RotationDisabled {
        /// The step that was requested.
        step: RotationStep,
        /// The secret the event referred to.
        secret_id: SecretId,
    },

    /// The event's version is unknown to the store or carries no rotation stage.
    #[error("{step}: secret version {version} has no stage for rotation of secret {secret_id}")]
    VersionNotStaged {
        /// The step that was requested.
        step: RotationStep,
        /// The secret the event referred to.
        secret_id: SecretId,
        /// The version token from the event.
        version: VersionId,
    },

    /// A required read or write against the secret store failed.
    #[error("{step}: secret store unavailable: {source}")]
    StoreUnavailable {
        /// The step that was running.
        step: RotationStep,
        /// The underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The service client rejected or failed a credential operation.
    #[error("{step}: service client failed: {source}")]
    Service {
        /// The step that was running.
        step: RotationStep,
        /// The failure reported by the service client.
        #[source]
        source: ServiceError,
    },

    /// A staged payload could not be decoded or encoded.
    #[error("{step}: {stage} payload: {source}")]
    Codec {
        /// The step that was running.
        step: RotationStep,
        /// The stage whose payload was being processed.
        stage: Stage,
        /// The codec failure.
        #[source]
        source: CodecError,
    },
}

impl Error {
    /// Returns the step that failed, when the failure happened inside one.
    #[must_use]
    pub const fn step(&self) -> Option<RotationStep> {
        match self {
            Self::InvalidEvent { .. } | Self::UnknownStep { .. } => None,
            Self::RotationDisabled { step, .. }
            | Self::VersionNotStaged { step, .. }
            | Self::StoreUnavailable { step, .. }
            | Self::Service { step, .. }
            | Self::Codec { step, .. } => Some(*step),
        }
    }

    /// Classifies the error for the invoking runtime's retry and alerting.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidEvent { .. }
            | Self::UnknownStep { .. }
            | Self::RotationDisabled { .. }
            | Self::VersionNotStaged { .. } => ErrorCategory::Validation,
            Self::StoreUnavailable { .. } => ErrorCategory::Store,
            Self::Service { .. } => ErrorCategory::Service,
            Self::Codec { .. } => ErrorCategory::Codec,
        }
    }

    /// Whether re-delivering the same event may succeed.
    ///
    /// Validation and codec failures are deterministic for a given store
    /// state; store and service failures may be transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Store | ErrorCategory::Service)
    }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or stale trigger, or rotation not permitted.
    Validation,
    /// The secret store failed or lacked a required record.
    Store,
    /// The downstream credential system failed.
    Service,
    /// A staged payload does not match the configured secret type.
    Codec,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Store => "store",
            Self::Service => "service",
            Self::Codec => "codec",
        };
        f.write_str(name)
    }
}

/// Failures reported by a [`SecretStore`](crate::store::SecretStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The secret, version, or staged value does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of what was looked up.
        resource: String,
    },

    /// The backend could not be reached or returned a server-side failure.
    #[error("backend unavailable: {reason}")]
    Unavailable {
        /// The reason the backend failed.
        reason: String,
    },

    /// The request contradicts the store's current state.
    #[error("conflict: {reason}")]
    Conflict {
        /// The reason the request was refused.
        reason: String,
    },
}

impl StoreError {
    /// Builds a `NotFound` error for a staged value lookup.
    #[must_use]
    pub fn missing_value(secret_id: &SecretId, stage: Stage, version: Option<&VersionId>) -> Self {
        let resource = match version {
            Some(version) => format!("{stage} value of secret {secret_id} at version {version}"),
            None => format!("{stage} value of secret {secret_id}"),
        };
        Self::NotFound { resource }
    }

    /// Builds a `NotFound` error for an unknown secret.
    #[must_use]
    pub fn missing_secret(secret_id: &SecretId) -> Self {
        Self::NotFound {
            resource: format!("secret {secret_id}"),
        }
    }

    /// Returns true if the failure means the record is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures reported by a [`ServiceClient`](crate::service::ServiceClient) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The secret does not carry the fields the service needs.
    #[error("invalid secret: {reason}")]
    InvalidSecret {
        /// What is wrong with the secret.
        reason: String,
    },

    /// The downstream system refused the credential operation.
    #[error("rejected: {reason}")]
    Rejected {
        /// The reason given by the downstream system.
        reason: String,
    },

    /// The downstream system could not be reached.
    #[error("unavailable: {reason}")]
    Unavailable {
        /// The reason the call failed.
        reason: String,
    },
}

/// Failures converting between staged payload bytes and the typed secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload does not decode into the secret type.
    #[error("decode failed: {reason}")]
    Decode {
        /// The decoder's message.
        reason: String,
    },

    /// The secret could not be encoded.
    #[error("encode failed: {reason}")]
    Encode {
        /// The encoder's message.
        reason: String,
    },
}

/// Result type alias for rotation operations.
pub type Result<T> = std::result::Result<T, Error>;
