// ABOUTME: The promotion pipeline: retag, register, cut over, wait, record.
// ABOUTME: Typestate attempt plus the pure spec transform and the waiter.

mod attempt;
mod error;
mod state;
mod transform;
mod transitions;
mod wait;

pub use attempt::{Attempt, PromotionOutcome, PromotionRequest};
pub use error::DeployError;
pub use state::{Converged, Initialized, Planned, Registered, Retagged, Updated};
pub use transform::{ExternalImagePolicy, RetagOp, TransformError, plan_retags, transform};
pub use wait::{
    CancelHandle, CancelSignal, ConvergenceError, WaitOptions, wait_for_convergence,
};
