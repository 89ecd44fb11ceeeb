// ABOUTME: Command-line interface definition for stevedore.
// ABOUTME: Clap derive structs; parsing only, no behavior.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::ImageOption;

#[derive(Debug, Parser)]
#[command(
    name = "stevedore",
    version,
    about = "Promote container images into running services as new revisions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retag images, register a new revision, and roll the service onto it
    Deploy(DeployArgs),
    /// Point the service back at the most recently recorded revision
    Rollback(RollbackArgs),
    /// Show the most recent recorded deployment for a service
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Cluster the service runs in
    #[arg(long)]
    pub cluster: String,

    /// Service to deploy
    #[arg(long = "service-name", value_name = "NAME")]
    pub service_name: String,

    /// Image to promote, as repository:tag; repeat for multiple containers
    #[arg(long, value_name = "REPOSITORY:TAG", required = true)]
    pub image: Vec<ImageOption>,

    /// Base the deployment on this revision instead of the live one
    #[arg(long, value_name = "NUMBER")]
    pub revision: Option<u64>,

    /// Keep containers whose image lives outside the managed registry
    /// instead of dropping them from the new revision
    #[arg(long)]
    pub keep_external: bool,

    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Registry endpoint (host:port)
    #[arg(long, value_name = "ENDPOINT", default_value = "localhost:5000")]
    pub registry_endpoint: String,

    #[command(flatten)]
    pub wait: WaitArgs,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// Cluster the service runs in
    #[arg(long)]
    pub cluster: String,

    /// Service to roll back
    #[arg(long = "service-name", value_name = "NAME")]
    pub service_name: String,

    #[command(flatten)]
    pub platform: PlatformArgs,

    #[command(flatten)]
    pub wait: WaitArgs,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Cluster the service runs in
    #[arg(long)]
    pub cluster: String,

    /// Service to inspect
    #[arg(long = "service-name", value_name = "NAME")]
    pub service_name: String,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Debug, Args)]
pub struct PlatformArgs {
    /// Orchestration platform endpoint (host:port)
    #[arg(long, value_name = "ENDPOINT", default_value = "localhost:8500")]
    pub platform_endpoint: String,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Seconds between convergence polls
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    pub poll_interval: u64,

    /// Seconds to wait for the service to converge before giving up
    #[arg(long, value_name = "SECONDS", default_value_t = 600)]
    pub timeout: u64,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    /// Directory holding deployment history logs
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}
