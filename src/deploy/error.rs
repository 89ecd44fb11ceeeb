// ABOUTME: Error type covering every way a promotion attempt can fail.
// ABOUTME: Wraps the per-collaborator errors; adds the preflight abort.

use thiserror::Error;

use crate::history::HistoryError;
use crate::platform::{PlatformError, RegistryError};

use super::transform::TransformError;
use super::wait::ConvergenceError;

#[derive(Debug, Error)]
pub enum DeployError {
    /// Another deployment is already in flight for the service. Raised
    /// before any side effect, so aborting here leaves nothing behind.
    #[error("{service} already has {deployments} deployments in flight, refusing to start another")]
    AlreadyDeploying { service: String, deployments: usize },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
