// ABOUTME: The rollback command: re-point the service at the last recorded
// ABOUTME: revision. No retag or register; the old revision still exists.

use crate::Error;
use crate::cli::RollbackArgs;
use crate::deploy::{CancelSignal, DeployError, WaitOptions, wait_for_convergence};
use crate::history::HistoryStore;
use crate::notify::{ConsoleSink, NotificationSink, Severity};
use crate::platform::{HttpOrchestrator, Orchestrator, RevisionRef};

pub async fn run(args: RollbackArgs) -> crate::Result<()> {
    let platform = HttpOrchestrator::connect(&args.platform.platform_endpoint)?;
    let history = super::open_history(&args.state);
    let sink = ConsoleSink;
    let wait = super::wait_options(&args.wait);
    let cancel = super::interrupt_signal();

    match run_rollback(
        &platform,
        &history,
        &sink,
        &args.cluster,
        &args.service_name,
        wait,
        cancel,
    )
    .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            sink.notify(Severity::Danger, &format!("rollback failed: {e}"));
            Err(e)
        }
    }
}

/// Redirect the service to the revision named by its latest history entry.
///
/// Revisions are immutable and never deleted, so rolling back is just a
/// cut-over to an existing revision followed by the same convergence wait a
/// deploy uses. Refuses when no history exists or the recorded revision is
/// already live.
pub async fn run_rollback<O, H>(
    platform: &O,
    history: &H,
    sink: &dyn NotificationSink,
    cluster: &str,
    service: &str,
    wait: WaitOptions,
    cancel: CancelSignal,
) -> crate::Result<RevisionRef>
where
    O: Orchestrator + ?Sized,
    H: HistoryStore + ?Sized,
{
    let entry = history
        .latest(cluster, service)
        .await
        .map_err(DeployError::from)?
        .ok_or_else(|| Error::NoRollbackTarget {
            service: service.to_string(),
            reason: "no deployment history recorded".into(),
        })?;

    let runtime = platform.describe_service(cluster, service).await?;
    if runtime.deployment_count > 1 {
        return Err(DeployError::AlreadyDeploying {
            service: service.to_string(),
            deployments: runtime.deployment_count,
        }
        .into());
    }

    if runtime.active_revision.revision() == entry.revision {
        return Err(Error::NoRollbackTarget {
            service: service.to_string(),
            reason: format!("revision {} is already live", entry.revision),
        });
    }

    let target = runtime.active_revision.with_revision(entry.revision);
    let message = format!(
        "rollback: revision {} -> {}",
        runtime.active_revision.revision(),
        target.revision()
    );
    sink.notify(Severity::Info, &message);

    platform.update_service(cluster, service, &target).await?;
    wait_for_convergence(platform, cluster, service, &target, wait, cancel)
        .await
        .map_err(DeployError::from)?;
    history
        .push_state(cluster, service, target.revision(), &message)
        .await
        .map_err(DeployError::from)?;

    sink.notify(
        Severity::Good,
        &format!("{service} is now running revision {}", target.revision()),
    );
    Ok(target)
}
