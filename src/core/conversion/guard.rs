use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use crate::models::config::DEFAULT_ENTRY_TIMEOUT_MS;
use crate::models::{ConversionOutcome, EntryError};

/// Races one entry's conversion against a deadline
///
/// The work runs on its own thread with a child cancellation token. When the
/// deadline wins, the token is cancelled and the outcome is `Failed(Timeout)`;
/// whatever the worker produces later is dropped with the channel.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `work` for `entry_name`, waiting at most the deadline
    ///
    /// Cancelling `parent` also cancels the token handed to `work`.
    pub fn run<F>(&self, entry_name: &str, parent: &CancellationToken, work: F) -> ConversionOutcome
    where
        F: FnOnce(CancellationToken) -> ConversionOutcome + Send + 'static,
    {
        let token = parent.child_token();
        let worker_token = token.clone();
        let (tx, rx) = mpsc::sync_channel(1);

        let spawned = thread::Builder::new()
            .name("entry-convert".to_string())
            .spawn(move || {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(worker_token))) {
                    Ok(outcome) => outcome,
                    Err(payload) => ConversionOutcome::Failed(EntryError::Worker(
                        format!("panicked: {}", panic_message(payload.as_ref()))
                    )),
                };
                // Receiver is gone if the deadline already fired
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            return ConversionOutcome::Failed(EntryError::Worker(
                format!("Failed to spawn worker: {}", e)
            ));
        }

        match rx.recv_timeout(self.deadline) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                token.cancel();
                let after_ms = self.deadline.as_millis() as u64;
                warn!(entry = entry_name, after_ms, "conversion timed out");
                ConversionOutcome::Failed(EntryError::Timeout {
                    entry: entry_name.to_string(),
                    after_ms,
                })
            }
            Err(RecvTimeoutError::Disconnected) => ConversionOutcome::Failed(EntryError::Worker(
                "worker exited without a result".to_string()
            )),
        }
    }
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_ENTRY_TIMEOUT_MS))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
