//! Debounced recomputation of a calculator while inputs are being edited.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::TARGET_CALC;

/// Feeds inputs to a background task that runs `calculate` once inputs have
/// been quiet for the configured window. Results are published on a watch channel.
pub struct Debouncer<I> {
    tx: mpsc::UnboundedSender<I>,
    handle: JoinHandle<()>,
}

impl<I: Send + 'static> Debouncer<I> {
    pub fn spawn<O, F>(quiet: Duration, calculate: F) -> (Self, watch::Receiver<Option<O>>)
    where
        O: Send + Sync + 'static,
        F: Fn(&I) -> O + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<I>();
        let (result_tx, result_rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let mut pending: Option<I> = None;
            loop {
                match pending.take() {
                    None => match rx.recv().await {
                        Some(input) => pending = Some(input),
                        None => break,
                    },
                    Some(input) => {
                        tokio::select! {
                            next = rx.recv() => match next {
                                Some(newer) => pending = Some(newer),
                                None => {
                                    // Sender dropped mid-window: flush the last input.
                                    result_tx.send_replace(Some(calculate(&input)));
                                    break;
                                }
                            },
                            _ = sleep(quiet) => {
                                debug!(target: TARGET_CALC, "Inputs quiet for {:?}, recalculating", quiet);
                                result_tx.send_replace(Some(calculate(&input)));
                            }
                        }
                    }
                }
            }
        });

        (Self { tx, handle }, result_rx)
    }

    /// Queues a new set of inputs, restarting the quiet window.
    pub fn update(&self, input: I) {
        if self.tx.send(input).is_err() {
            warn!(target: TARGET_CALC, "Debounce task has stopped, input dropped");
        }
    }

    /// Closes the input side and waits for any pending calculation to finish.
    pub async fn finish(self) {
        let Debouncer { tx, handle } = self;
        drop(tx);
        if let Err(e) = handle.await {
            warn!(target: TARGET_CALC, "Debounce task failed: {}", e);
        }
    }
}
