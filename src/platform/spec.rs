// ABOUTME: Service specification model shared with the orchestration platform.
// ABOUTME: Immutable specs, registered revisions, and runtime service state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One container definition inside a service spec.
///
/// Only the image reference is meaningful to this tool; everything else the
/// platform attaches to a container (ports, environment, log config, ...)
/// rides along in `extra`, opaque and untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDef {
    pub name: String,
    pub image: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A service specification as the platform understands it.
///
/// Specs are immutable once registered; promotion always derives a new value
/// and registers it as a fresh revision, it never edits one in place. The
/// fields here are exactly the whitelist a registration submits — baseline
/// metadata like the prior revision number never leaks through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub family: String,
    pub container_defs: Vec<ContainerDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,

    #[serde(default)]
    pub volumes: Vec<serde_json::Value>,
    #[serde(default)]
    pub placement_constraints: Vec<serde_json::Value>,
    #[serde(default)]
    pub compatibilities: Vec<String>,
}

/// A spec the platform has accepted, with its assigned revision number.
///
/// Revision numbers are monotonically increasing per family, assigned by the
/// platform, and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredSpec {
    pub spec: ServiceSpec,
    pub revision: u64,
}

impl RegisteredSpec {
    pub fn revision_ref(&self) -> RevisionRef {
        RevisionRef::new(&self.spec.family, self.revision)
    }
}

/// Reference to one registered revision: `family:revision`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionRef {
    family: String,
    revision: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid revision reference (expected family:revision): {0}")]
pub struct ParseRevisionRefError(pub String);

impl RevisionRef {
    pub fn new(family: &str, revision: u64) -> Self {
        Self {
            family: family.to_string(),
            revision,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The same family pointed at a different revision number.
    pub fn with_revision(&self, revision: u64) -> Self {
        Self {
            family: self.family.clone(),
            revision,
        }
    }
}

impl fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}

impl FromStr for RevisionRef {
    type Err = ParseRevisionRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, revision) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseRevisionRefError(s.to_string()))?;
        if family.is_empty() {
            return Err(ParseRevisionRefError(s.to_string()));
        }
        let revision = revision
            .parse()
            .map_err(|_| ParseRevisionRefError(s.to_string()))?;
        Ok(Self::new(family, revision))
    }
}

impl Serialize for RevisionRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What the platform reports about a live service.
///
/// More than one deployment means a rollout is already in flight, which
/// blocks a new promotion from starting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRuntimeState {
    pub active_revision: RevisionRef,
    pub deployment_count: usize,
}

/// Which revision a promotion uses as its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSelector {
    /// The revision the service currently runs.
    Live,
    /// An explicit prior revision number (>= 1).
    Number(u64),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("revision numbers start at 1, got {0}")]
pub struct InvalidRevision(pub u64);

impl RevisionSelector {
    pub fn from_flag(revision: Option<u64>) -> Result<Self, InvalidRevision> {
        match revision {
            None => Ok(Self::Live),
            Some(0) => Err(InvalidRevision(0)),
            Some(n) => Ok(Self::Number(n)),
        }
    }

    /// Resolve against the service's live revision reference.
    pub fn resolve(&self, live: &RevisionRef) -> RevisionRef {
        match self {
            Self::Live => live.clone(),
            Self::Number(n) => live.with_revision(*n),
        }
    }
}
