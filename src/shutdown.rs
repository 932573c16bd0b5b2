//! Cooperative shutdown on SIGINT / SIGTERM.
//!
//! The first signal cancels a [`CancellationToken`]. The walker checks the
//! token before recursing into each subdirectory and after each file, so no
//! new conversions are submitted once it flips. Conversions that were already
//! launched keep running and are drained normally.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShutdownError {
    #[error("failed to install signal handler: {0}")]
    Handler(#[from] ctrlc::Error),
}

/// Shared one-way flag: starts clear, may be set once, never reset.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the call that set the flag.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

const INTERRUPT_NOTICE: &str =
    "Interrupted: finishing running conversions, no new work will start";

/// Cancel `token`; the first call also writes the notice to `out`.
fn on_signal(token: &CancellationToken, out: &mut impl Write) {
    if token.cancel() {
        let _ = writeln!(out, "{INTERRUPT_NOTICE}");
    }
}

/// Register the process-wide handler that cancels `token`.
///
/// The notice goes straight to stderr, whatever the log filter.
/// Can only be called once per process.
pub fn install(token: CancellationToken) -> Result<(), ShutdownError> {
    ctrlc::set_handler(move || on_signal(&token, &mut std::io::stderr()))?;
    Ok(())
}
