// ABOUTME: Convergence waiter: polls the platform until the service settles.
// ABOUTME: Explicit poll state machine, cancellable, bounded by a deadline.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant};

use crate::platform::{Orchestrator, PlatformError, RevisionRef, ServiceRuntimeState};

#[derive(Debug, Error)]
pub enum ConvergenceError {
    /// The service did not settle within the deadline. The cut-over was
    /// already issued and is NOT rolled back; the platform may still finish
    /// on its own.
    #[error("service did not converge within {0:?}")]
    Timeout(Duration),

    /// The caller gave up. Same caveat as `Timeout`: the cut-over stands.
    #[error("wait for convergence was cancelled")]
    Cancelled,

    #[error("platform failed while waiting: {0}")]
    PlatformFailure(#[from] PlatformError),
}

/// Polling cadence and overall deadline for one wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Requests cancellation of a wait in progress.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Observes cancellation requests. Cloneable; a dropped handle means the
/// wait can never be cancelled, which is fine for non-interactive callers.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle(tx), CancelSignal(rx))
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_handle, signal) = Self::channel();
        signal
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is gone.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Where one poll iteration left the wait.
#[derive(Debug)]
enum PollState {
    Polling,
    Converged,
    TimedOut,
    Cancelled,
    PlatformFailed(PlatformError),
}

fn is_converged(observed: &ServiceRuntimeState, target: &RevisionRef) -> bool {
    observed.deployment_count == 1 && observed.active_revision == *target
}

/// Poll `describe_service` until the service runs `target` with exactly one
/// deployment, the deadline passes, cancellation fires, or the platform
/// reports a definitive failure. Transient transport errors are logged and
/// retried; they only surface if they outlast the deadline.
pub async fn wait_for_convergence<O>(
    platform: &O,
    cluster: &str,
    service: &str,
    target: &RevisionRef,
    opts: WaitOptions,
    mut cancel: CancelSignal,
) -> Result<(), ConvergenceError>
where
    O: Orchestrator + ?Sized,
{
    let deadline = Instant::now() + opts.timeout;
    let mut state = PollState::Polling;

    loop {
        state = match state {
            PollState::Polling => {
                let polled = tokio::select! {
                    _ = cancel.cancelled() => Some(PollState::Cancelled),
                    _ = time::sleep_until(deadline) => Some(PollState::TimedOut),
                    observed = platform.describe_service(cluster, service) => match observed {
                        Ok(runtime) if is_converged(&runtime, target) => {
                            Some(PollState::Converged)
                        }
                        Ok(runtime) => {
                            tracing::debug!(
                                active = %runtime.active_revision,
                                deployments = runtime.deployment_count,
                                "service not yet converged"
                            );
                            None
                        }
                        Err(e) if e.is_definitive() => Some(PollState::PlatformFailed(e)),
                        Err(e) => {
                            tracing::warn!("transient failure while polling, will retry: {e}");
                            None
                        }
                    },
                };
                match polled {
                    Some(next) => next,
                    // Pause between polls, still responsive to the deadline
                    // and to cancellation.
                    None => tokio::select! {
                        _ = cancel.cancelled() => PollState::Cancelled,
                        _ = time::sleep_until(deadline) => PollState::TimedOut,
                        _ = time::sleep(opts.poll_interval) => PollState::Polling,
                    },
                }
            }
            PollState::Converged => return Ok(()),
            PollState::TimedOut => return Err(ConvergenceError::Timeout(opts.timeout)),
            PollState::Cancelled => return Err(ConvergenceError::Cancelled),
            PollState::PlatformFailed(e) => return Err(ConvergenceError::PlatformFailure(e)),
        };
    }
}
