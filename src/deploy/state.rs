// ABOUTME: Stage markers for the promotion pipeline typestate.
// ABOUTME: Each stage carries exactly the data the next transition needs.

use crate::platform::{RevisionRef, ServiceSpec};

use super::transform::RetagOp;

/// Nothing observed yet; no side effects have happened.
#[derive(Debug)]
pub struct Initialized;

/// Preflight passed: the baseline was read and the candidate derived.
/// Still no side effects.
#[derive(Debug)]
pub struct Planned {
    pub(crate) baseline: RevisionRef,
    pub(crate) candidate: ServiceSpec,
    pub(crate) retags: Vec<RetagOp>,
}

/// Every in-scope image now carries the attempt tag in the registry.
#[derive(Debug)]
pub struct Retagged {
    pub(crate) baseline: RevisionRef,
    pub(crate) candidate: ServiceSpec,
}

/// The candidate spec exists on the platform as an immutable revision.
#[derive(Debug)]
pub struct Registered {
    pub(crate) baseline: RevisionRef,
    pub(crate) target: RevisionRef,
}

/// The service has been told to move to the target revision.
#[derive(Debug)]
pub struct Updated {
    pub(crate) baseline: RevisionRef,
    pub(crate) target: RevisionRef,
}

/// The service is running the target revision with a single deployment.
#[derive(Debug)]
pub struct Converged {
    pub(crate) baseline: RevisionRef,
    pub(crate) target: RevisionRef,
}
