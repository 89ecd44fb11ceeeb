// ABOUTME: Top-level error type for the CLI surface.
// ABOUTME: Wraps pipeline, platform, and history errors for exit reporting.

use thiserror::Error;

use crate::deploy::DeployError;
use crate::history::HistoryError;
use crate::platform::{InvalidEndpoint, InvalidRevision, PlatformError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Endpoint(#[from] InvalidEndpoint),

    #[error(transparent)]
    Revision(#[from] InvalidRevision),

    /// Rollback found nothing to do: either no history exists for the
    /// service, or the latest recorded revision is already live.
    #[error("no rollback target for {service}: {reason}")]
    NoRollbackTarget { service: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
