// ABOUTME: Library root for stevedore, a revision-promotion deployment tool.
// ABOUTME: Re-exports the pipeline, collaborator contracts, and CLI surface.

pub mod cli;
pub mod commands;
pub mod deploy;
pub mod error;
pub mod history;
pub mod notify;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
