// ABOUTME: The promotion attempt: request parameters plus typestate carrier.
// ABOUTME: One AttemptId per attempt, minted at construction and never reused.

use crate::platform::RevisionRef;
use crate::types::{AttemptId, ImageOptions, RegistryScope};

use super::state::Initialized;
use super::transform::ExternalImagePolicy;

/// Everything the caller decides about a promotion before it starts.
#[derive(Debug)]
pub struct PromotionRequest {
    pub cluster: String,
    pub service: String,
    pub images: ImageOptions,
    pub scope: RegistryScope,
    pub external_images: ExternalImagePolicy,
}

/// One promotion attempt, parameterized by how far it has progressed.
///
/// Transitions consume the attempt and return it in the next stage, so an
/// attempt can never skip a stage or run one twice. The id is minted here,
/// once, and identifies the attempt everywhere it leaves a trace: the
/// registry tag, log lines, and the history message.
pub struct Attempt<S> {
    pub(crate) request: PromotionRequest,
    pub(crate) id: AttemptId,
    pub(crate) state: S,
}

impl Attempt<Initialized> {
    pub fn new(request: PromotionRequest) -> Self {
        Self {
            request,
            id: AttemptId::generate(),
            state: Initialized,
        }
    }
}

impl<S> Attempt<S> {
    pub fn id(&self) -> AttemptId {
        self.id
    }

    pub fn cluster(&self) -> &str {
        &self.request.cluster
    }

    pub fn service(&self) -> &str {
        &self.request.service
    }
}

/// What a finished promotion reports back to the caller.
#[derive(Debug, Clone)]
pub struct PromotionOutcome {
    pub attempt_id: AttemptId,
    pub cluster: String,
    pub service: String,
    pub baseline: RevisionRef,
    pub target: RevisionRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PromotionRequest {
        PromotionRequest {
            cluster: "prod".into(),
            service: "web".into(),
            images: ImageOptions::default(),
            scope: RegistryScope::aws_ecr(),
            external_images: ExternalImagePolicy::Drop,
        }
    }

    #[test]
    fn each_attempt_gets_its_own_id() {
        let a = Attempt::new(request());
        let b = Attempt::new(request());
        assert_ne!(a.id(), b.id());
    }
}
