// ABOUTME: Best-effort progress and failure notifications for operators.
// ABOUTME: Sink contract plus the console implementation used by the CLI.

/// How a notification should be presented.
///
/// Mirrors the chat-webhook convention: `Good` for success, `Danger` for
/// failure, `Info` for everything in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Good,
    Danger,
}

/// Fire-and-forget notification delivery.
///
/// Sinks must never fail the caller: a sink that cannot deliver swallows the
/// error (tracing it at most). The pipeline reports every stage transition
/// here, so delivery problems must not abort a deployment attempt.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Sink printing to the terminal, failures to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{message}"),
            Severity::Good => println!("✓ {message}"),
            Severity::Danger => eprintln!("✗ {message}"),
        }
    }
}
