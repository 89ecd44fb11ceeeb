// ABOUTME: The history command: print the most recent recorded deployment.

use crate::cli::HistoryArgs;
use crate::deploy::DeployError;
use crate::history::HistoryStore;

pub async fn run(args: HistoryArgs) -> crate::Result<()> {
    let history = super::open_history(&args.state);
    match history
        .latest(&args.cluster, &args.service_name)
        .await
        .map_err(DeployError::from)?
    {
        Some(entry) => {
            println!(
                "{}  revision {}  {}",
                entry.recorded_at.to_rfc3339(),
                entry.revision,
                entry.message
            );
        }
        None => {
            println!(
                "no history recorded for {}/{}",
                args.cluster, args.service_name
            );
        }
    }
    Ok(())
}
