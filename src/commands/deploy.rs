// ABOUTME: The deploy command: drives one promotion attempt end to end.
// ABOUTME: Wires live adapters; the pipeline itself is collaborator-generic.

use crate::cli::DeployArgs;
use crate::deploy::{
    Attempt, CancelSignal, DeployError, ExternalImagePolicy, PromotionOutcome, PromotionRequest,
    WaitOptions,
};
use crate::history::HistoryStore;
use crate::notify::{ConsoleSink, NotificationSink, Severity};
use crate::platform::{
    HttpOrchestrator, HttpRegistry, ManifestRegistry, Orchestrator, RevisionSelector,
};
use crate::types::RegistryScope;

pub async fn run(args: DeployArgs) -> crate::Result<()> {
    let platform = HttpOrchestrator::connect(&args.platform.platform_endpoint)?;
    let registry = HttpRegistry::connect(&args.registry_endpoint)?;
    let history = super::open_history(&args.state);
    let sink = ConsoleSink;

    let selector = RevisionSelector::from_flag(args.revision)?;
    let wait = super::wait_options(&args.wait);
    let cancel = super::interrupt_signal();

    let request = PromotionRequest {
        cluster: args.cluster,
        service: args.service_name,
        images: args.image.into_iter().collect(),
        scope: RegistryScope::aws_ecr(),
        external_images: if args.keep_external {
            ExternalImagePolicy::Keep
        } else {
            ExternalImagePolicy::Drop
        },
    };

    match run_promotion(
        &platform, &registry, &history, &sink, request, selector, wait, cancel,
    )
    .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            sink.notify(Severity::Danger, &format!("deployment failed: {e}"));
            Err(e.into())
        }
    }
}

/// Run one promotion attempt against any set of collaborators.
///
/// Stage order is enforced by the attempt's type: preflight, retag, register,
/// cut over, wait, record. The sink hears about each visible milestone.
#[allow(clippy::too_many_arguments)]
pub async fn run_promotion<O, R, H>(
    platform: &O,
    registry: &R,
    history: &H,
    sink: &dyn NotificationSink,
    request: PromotionRequest,
    selector: RevisionSelector,
    wait: WaitOptions,
    cancel: CancelSignal,
) -> Result<PromotionOutcome, DeployError>
where
    O: Orchestrator + ?Sized,
    R: ManifestRegistry + ?Sized,
    H: HistoryStore + ?Sized,
{
    let attempt = Attempt::new(request);
    sink.notify(
        Severity::Info,
        &format!(
            "starting deployment {} of {} in {}",
            attempt.id(),
            attempt.service(),
            attempt.cluster()
        ),
    );

    let attempt = attempt.preflight(platform, selector).await?;
    let attempt = attempt.retag_images(registry).await?;
    let attempt = attempt.register(platform).await?;
    let attempt = attempt.cut_over(platform).await?;

    sink.notify(
        Severity::Info,
        &format!(
            "deploy: revision {} -> {}",
            attempt.baseline_revision(),
            attempt.target_revision()
        ),
    );

    let attempt = attempt.await_convergence(platform, wait, cancel).await?;
    let outcome = attempt.record(history).await?;

    sink.notify(
        Severity::Good,
        &format!(
            "{} is now running revision {}",
            outcome.service,
            outcome.target.revision()
        ),
    );
    Ok(outcome)
}
