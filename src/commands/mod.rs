// ABOUTME: CLI command implementations and the top-level dispatcher.
// ABOUTME: Shared wiring helpers for history, waiting, and interrupts.

pub mod deploy;
pub mod history;
pub mod rollback;

use std::time::Duration;

use crate::cli::{Cli, Command, StateArgs, WaitArgs};
use crate::deploy::{CancelSignal, WaitOptions};
use crate::history::{FileHistoryStore, default_state_dir};

pub async fn run(cli: Cli) -> crate::Result<()> {
    match cli.command {
        Command::Deploy(args) => deploy::run(args).await,
        Command::Rollback(args) => rollback::run(args).await,
        Command::History(args) => history::run(args).await,
    }
}

fn wait_options(args: &WaitArgs) -> WaitOptions {
    WaitOptions {
        poll_interval: Duration::from_secs(args.poll_interval),
        timeout: Duration::from_secs(args.timeout),
    }
}

fn open_history(args: &StateArgs) -> FileHistoryStore {
    let dir = args.state_dir.clone().unwrap_or_else(default_state_dir);
    FileHistoryStore::open(dir)
}

/// Cancellation signal wired to Ctrl-C, so an operator can abandon a wait
/// without killing the process mid-write.
fn interrupt_signal() -> CancelSignal {
    let (handle, signal) = CancelSignal::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            handle.cancel();
        }
    });
    signal
}
