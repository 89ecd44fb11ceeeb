// ABOUTME: Stage transitions for a promotion attempt.
// ABOUTME: Consuming methods; each stage can only move to the next one.

use futures::future::try_join_all;

use crate::history::HistoryStore;
use crate::platform::{ManifestRegistry, Orchestrator, RevisionSelector};

use super::attempt::{Attempt, PromotionOutcome};
use super::error::DeployError;
use super::state::{Converged, Initialized, Planned, Registered, Retagged, Updated};
use super::transform::{plan_retags, transform};
use super::wait::{CancelSignal, WaitOptions, wait_for_convergence};

impl Attempt<Initialized> {
    /// Read the live service, refuse to stack deployments, resolve the
    /// baseline revision, and derive the candidate spec. No side effects:
    /// a failure here leaves the registry and platform untouched.
    ///
    /// The single-deployment check is a read followed by later writes, so a
    /// deployment started elsewhere between this check and `cut_over` is not
    /// detected. The platform itself is the only place that race could be
    /// closed.
    pub async fn preflight<O>(
        self,
        platform: &O,
        selector: RevisionSelector,
    ) -> Result<Attempt<Planned>, DeployError>
    where
        O: Orchestrator + ?Sized,
    {
        let runtime = platform
            .describe_service(self.cluster(), self.service())
            .await?;
        if runtime.deployment_count > 1 {
            return Err(DeployError::AlreadyDeploying {
                service: self.request.service,
                deployments: runtime.deployment_count,
            });
        }

        let baseline = selector.resolve(&runtime.active_revision);
        tracing::debug!(attempt = %self.id, baseline = %baseline, "resolved baseline revision");
        let baseline_spec = platform.describe_spec(&baseline).await?;

        let candidate = transform(
            &baseline_spec,
            &self.id,
            &self.request.images,
            self.request.external_images,
            &self.request.scope,
        )?;
        let retags = plan_retags(&baseline_spec, &self.request.images, &self.request.scope)?;

        Ok(Attempt {
            request: self.request,
            id: self.id,
            state: Planned {
                baseline,
                candidate,
                retags,
            },
        })
    }
}

impl Attempt<Planned> {
    /// Copy every in-scope image to the attempt tag. Runs the copies
    /// concurrently and fails on the first error; registration only happens
    /// once every tag the candidate references actually exists.
    pub async fn retag_images<R>(self, registry: &R) -> Result<Attempt<Retagged>, DeployError>
    where
        R: ManifestRegistry + ?Sized,
    {
        let tag = self.id.as_tag();
        try_join_all(self.state.retags.iter().map(|op| {
            tracing::debug!(
                repository = %op.repository,
                from = %op.from_tag,
                to = %tag,
                "retagging image"
            );
            registry.retag(&op.repository, &op.from_tag, &tag)
        }))
        .await?;

        Ok(Attempt {
            request: self.request,
            id: self.id,
            state: Retagged {
                baseline: self.state.baseline,
                candidate: self.state.candidate,
            },
        })
    }
}

impl Attempt<Retagged> {
    /// Register the candidate spec; the platform assigns the new revision.
    pub async fn register<O>(self, platform: &O) -> Result<Attempt<Registered>, DeployError>
    where
        O: Orchestrator + ?Sized,
    {
        let registered = platform.register_spec(&self.state.candidate).await?;
        let target = registered.revision_ref();
        tracing::info!(attempt = %self.id, target = %target, "registered new revision");

        Ok(Attempt {
            request: self.request,
            id: self.id,
            state: Registered {
                baseline: self.state.baseline,
                target,
            },
        })
    }
}

impl Attempt<Registered> {
    /// Point the service at the target revision. The platform rolls out
    /// asynchronously from here.
    pub async fn cut_over<O>(self, platform: &O) -> Result<Attempt<Updated>, DeployError>
    where
        O: Orchestrator + ?Sized,
    {
        platform
            .update_service(self.cluster(), self.service(), &self.state.target)
            .await?;

        Ok(Attempt {
            request: self.request,
            id: self.id,
            state: Updated {
                baseline: self.state.baseline,
                target: self.state.target,
            },
        })
    }
}

impl Attempt<Updated> {
    pub fn baseline_revision(&self) -> u64 {
        self.state.baseline.revision()
    }

    pub fn target_revision(&self) -> u64 {
        self.state.target.revision()
    }

    /// Wait until the service settles on the target revision. On timeout or
    /// cancellation the cut-over stands; nothing is rolled back and nothing
    /// is recorded in history.
    pub async fn await_convergence<O>(
        self,
        platform: &O,
        opts: WaitOptions,
        cancel: CancelSignal,
    ) -> Result<Attempt<Converged>, DeployError>
    where
        O: Orchestrator + ?Sized,
    {
        wait_for_convergence(
            platform,
            self.cluster(),
            self.service(),
            &self.state.target,
            opts,
            cancel,
        )
        .await?;

        Ok(Attempt {
            request: self.request,
            id: self.id,
            state: Converged {
                baseline: self.state.baseline,
                target: self.state.target,
            },
        })
    }
}

impl Attempt<Converged> {
    /// Append the converged promotion to history and finish the attempt.
    /// History is only ever written here, so the log never names a revision
    /// the service did not reach.
    pub async fn record<H>(self, history: &H) -> Result<PromotionOutcome, DeployError>
    where
        H: HistoryStore + ?Sized,
    {
        let message = format!(
            "deploy: revision {} -> {} ({})",
            self.state.baseline.revision(),
            self.state.target.revision(),
            self.id
        );
        history
            .push_state(
                self.cluster(),
                self.service(),
                self.state.target.revision(),
                &message,
            )
            .await?;

        Ok(PromotionOutcome {
            attempt_id: self.id,
            cluster: self.request.cluster,
            service: self.request.service,
            baseline: self.state.baseline,
            target: self.state.target,
        })
    }
}
