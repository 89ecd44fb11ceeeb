// ABOUTME: Orchestration platform contract consumed by the pipeline.
// ABOUTME: Describe services and specs, register revisions, repoint services.

use async_trait::async_trait;

use super::spec::{RegisteredSpec, RevisionRef, ServiceRuntimeState, ServiceSpec};

/// Errors surfaced by the orchestration platform.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    /// The named cluster, service, or revision does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform rejected the request (invalid limits, malformed ARN, ...).
    #[error("rejected by platform: {0}")]
    Rejected(String),

    /// The platform could not be reached; safe to retry a read.
    #[error("platform transport error: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Definitive failures abort a poll loop immediately; transport errors
    /// are retried until the deadline.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Rejected(_))
    }
}

/// The orchestration platform, as far as promotion needs it.
///
/// Implementations live at the edge (HTTP adapter, test stubs); the pipeline
/// only ever talks through this trait.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Runtime state of a live service, including its active revision.
    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceRuntimeState, PlatformError>;

    /// Fetch the immutable spec registered under a revision reference.
    async fn describe_spec(&self, revision: &RevisionRef) -> Result<ServiceSpec, PlatformError>;

    /// Register a spec as a new immutable revision and return it with its
    /// assigned revision number. Must not touch any live service.
    async fn register_spec(&self, spec: &ServiceSpec) -> Result<RegisteredSpec, PlatformError>;

    /// Point the service's desired state at a revision. Idempotent at the
    /// platform: repeating with the same target is a no-op.
    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        target: &RevisionRef,
    ) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitive_classification() {
        assert!(PlatformError::NotFound("x".into()).is_definitive());
        assert!(PlatformError::Rejected("x".into()).is_definitive());
        assert!(!PlatformError::Transport("x".into()).is_definitive());
    }
}
