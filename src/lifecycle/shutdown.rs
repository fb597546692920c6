//! Background stop listener.

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::signals::{TerminationSignal, TerminationSignals};

/// Why a registration is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal(TerminationSignal),
    /// The owning context was cancelled.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Signal(signal) => write!(f, "signal {}", signal),
            StopReason::Requested => f.write_str("stop requested"),
        }
    }
}

/// Task waiting for a termination signal or for `context` to be cancelled.
///
/// Either way it cancels `context`, runs `on_stop` to completion and then
/// cancels `done`. Fires at most once.
pub struct SignalListener {
    task: JoinHandle<()>,
}

impl SignalListener {
    pub fn spawn<F, Fut>(context: CancellationToken, done: CancellationToken, on_stop: F) -> Self
    where
        F: FnOnce(StopReason) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Installed here rather than in the task so a signal sent right after
        // `spawn` returns is already ours.
        let signals = TerminationSignals::install()
            .inspect_err(|error| {
                // Only an explicit stop can end the registration now.
                tracing::error!(%error, "Failed to install signal handlers");
            })
            .ok();

        let task = tokio::spawn(async move {
            let signal = async move {
                match signals {
                    Some(mut signals) => signals.recv().await,
                    None => std::future::pending().await,
                }
            };

            let reason = tokio::select! {
                signal = signal => StopReason::Signal(signal),
                _ = context.cancelled() => StopReason::Requested,
            };

            context.cancel();
            on_stop(reason).await;
            done.cancel();
        });

        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl fmt::Debug for SignalListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalListener")
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_runs_on_stop_then_done() {
        let context = CancellationToken::new();
        let done = CancellationToken::new();
        let seen = Arc::new(Mutex::new(None));

        let sink = seen.clone();
        let listener = SignalListener::spawn(context.clone(), done.clone(), move |reason| async move {
            *sink.lock().unwrap() = Some(reason);
        });

        assert!(!done.is_cancelled());
        context.cancel();
        tokio::time::timeout(Duration::from_secs(1), done.cancelled())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(StopReason::Requested));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(listener.is_finished());
    }

    #[tokio::test]
    async fn test_idle_until_cancelled() {
        let context = CancellationToken::new();
        let done = CancellationToken::new();
        let _listener = SignalListener::spawn(context.clone(), done.clone(), |_| async {});

        let result = tokio::time::timeout(Duration::from_millis(100), done.cancelled()).await;
        assert!(result.is_err());
        assert!(!context.is_cancelled());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(StopReason::Signal(TerminationSignal::Terminate).to_string(), "signal SIGTERM");
        assert_eq!(StopReason::Requested.to_string(), "stop requested");
    }
}
