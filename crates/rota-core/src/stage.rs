//! Version staging vocabulary.
//!
//! A secret store attaches stage labels to versions of a secret. Rotation
//! relies on three of them:
//!
//! - `CURRENT`: the version clients use; at most one version carries it
//! - `PENDING`: the candidate being rotated in; at most one version carries it
//! - `PREVIOUS`: the version that was `CURRENT` before the last promotion
//!
//! Stores may attach other labels as well. They are kept as
//! [`StageLabel::Custom`] and never count as a rotation stage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::VersionId;

/// A stage label recognized by the rotation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// The active version.
    Current,
    /// The candidate version staged for promotion.
    Pending,
    /// The version demoted by the last promotion.
    Previous,
}

impl Stage {
    /// All recognized stages.
    pub const ALL: [Self; 3] = [Self::Current, Self::Pending, Self::Previous];

    /// Returns the canonical label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Pending => "PENDING",
            Self::Previous => "PREVIOUS",
        }
    }

    /// Parses a label as reported by a store.
    ///
    /// Accepts the canonical spelling and the managed-store `AWS` prefixed
    /// spelling (`AWSCURRENT`, ...).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let bare = label.strip_prefix("AWS").unwrap_or(label);
        Self::ALL.into_iter().find(|stage| stage.as_str() == bare)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label attached to a secret version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageLabel {
    /// One of the rotation stages.
    Staged(Stage),
    /// Any other label the store carries.
    Custom(String),
}

impl StageLabel {
    /// Returns the rotation stage, if this label is one.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Staged(stage) => Some(*stage),
            Self::Custom(_) => None,
        }
    }
}

impl From<Stage> for StageLabel {
    fn from(stage: Stage) -> Self {
        Self::Staged(stage)
    }
}

impl From<&str> for StageLabel {
    fn from(label: &str) -> Self {
        Stage::from_label(label).map_or_else(|| Self::Custom(label.to_string()), Self::Staged)
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staged(stage) => stage.fmt(f),
            Self::Custom(label) => f.write_str(label),
        }
    }
}

/// A store's view of one secret: whether rotation is enabled and which
/// labels each version carries.
///
/// Versions are kept in token order so scans are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretDescription {
    /// Whether the store has rotation enabled for this secret.
    pub rotation_enabled: bool,
    /// Labels per version.
    pub versions: BTreeMap<VersionId, BTreeSet<StageLabel>>,
}

impl SecretDescription {
    /// Creates a description with no versions.
    #[must_use]
    pub fn new(rotation_enabled: bool) -> Self {
        Self {
            rotation_enabled,
            versions: BTreeMap::new(),
        }
    }

    /// Adds a version with the given labels.
    #[must_use]
    pub fn with_version<L>(mut self, version: VersionId, labels: impl IntoIterator<Item = L>) -> Self
    where
        L: Into<StageLabel>,
    {
        self.versions
            .entry(version)
            .or_default()
            .extend(labels.into_iter().map(Into::into));
        self
    }

    /// Returns the labels of a version, if the store knows it.
    #[must_use]
    pub fn labels(&self, version: &VersionId) -> Option<&BTreeSet<StageLabel>> {
        self.versions.get(version)
    }

    /// Returns true if `version` carries `stage`.
    #[must_use]
    pub fn has_stage(&self, version: &VersionId, stage: Stage) -> bool {
        self.labels(version)
            .is_some_and(|labels| labels.contains(&StageLabel::Staged(stage)))
    }

    /// Returns true if `version` carries at least one rotation stage.
    #[must_use]
    pub fn is_staged(&self, version: &VersionId) -> bool {
        self.labels(version)
            .is_some_and(|labels| labels.iter().any(|label| label.stage().is_some()))
    }

    /// Returns every version carrying `stage`, lowest token first.
    pub fn versions_with(&self, stage: Stage) -> impl Iterator<Item = &VersionId> {
        self.versions
            .iter()
            .filter(move |(_, labels)| labels.contains(&StageLabel::Staged(stage)))
            .map(|(version, _)| version)
    }
}
