//! Engine Runtime
//!
//! A fixed pool of tokio workers pulling envelopes from a bounded queue and
//! running one dispatcher invocation each. `stop` refuses new work, lets the
//! workers finish what is already queued, then returns.
//!
//! The queue has a single sender shared by every handle. `stop` drops it, so
//! the workers see the channel close only after everything accepted has been
//! received.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::dto::MessageEnvelope;
use crate::application::use_cases::MessageDispatcher;

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Envelopes that may wait for a worker.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

/// Submission errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The runtime is stopping or stopped.
    #[error("Engine runtime is stopped")]
    Stopped,
}

/// Cloneable handle for submitting envelopes.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: Arc<RwLock<Option<mpsc::Sender<MessageEnvelope>>>>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    /// Queue an envelope, waiting for space when the queue is full.
    ///
    /// `Ok` means the envelope will be processed before `stop` returns.
    pub async fn submit(&self, envelope: MessageEnvelope) -> Result<(), RuntimeError> {
        if self.shutdown.is_cancelled() {
            return Err(RuntimeError::Stopped);
        }
        let sender = self.sender.read().await;
        let Some(sender) = sender.as_ref() else {
            return Err(RuntimeError::Stopped);
        };
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(RuntimeError::Stopped),
            sent = sender.send(envelope) => sent.map_err(|_| RuntimeError::Stopped),
        }
    }

    /// Returns true once `stop` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Running worker pool.
#[derive(Debug)]
pub struct EngineRuntime {
    handle: EngineHandle,
    workers: Vec<JoinHandle<()>>,
    processed: Arc<AtomicU64>,
}

impl EngineRuntime {
    /// Spawn the workers. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(dispatcher: Arc<MessageDispatcher>, config: RuntimeConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let shutdown = CancellationToken::new();
        let processed = Arc::new(AtomicU64::new(0));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&dispatcher),
                    Arc::clone(&receiver),
                    Arc::clone(&processed),
                ))
            })
            .collect();

        tracing::info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "engine runtime started"
        );

        Self {
            handle: EngineHandle {
                sender: Arc::new(RwLock::new(Some(sender))),
                shutdown,
            },
            workers,
            processed,
        }
    }

    /// Handle for submitting envelopes.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Envelopes processed so far.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Stop accepting work, drain the queue and wait for the workers.
    ///
    /// Returns the number of envelopes processed over the runtime's life.
    pub async fn stop(self) -> u64 {
        // Wakes submitters blocked on a full queue so the write lock is free.
        self.handle.shutdown.cancel();
        self.handle.sender.write().await.take();
        drop(self.handle);

        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "engine worker panicked");
            }
        }

        let processed = self.processed.load(Ordering::Relaxed);
        tracing::info!(processed, "engine runtime stopped");
        processed
    }
}

async fn run_worker(
    worker: usize,
    dispatcher: Arc<MessageDispatcher>,
    receiver: Arc<Mutex<mpsc::Receiver<MessageEnvelope>>>,
    processed: Arc<AtomicU64>,
) {
    loop {
        // None only once the sender is gone and the queue is empty.
        let next = receiver.lock().await.recv().await;
        let Some(envelope) = next else {
            break;
        };

        let envelope_id = envelope.id.clone();
        if let Err(e) = dispatcher.dispatch(envelope).await {
            tracing::warn!(worker, envelope_id = %envelope_id, error = %e, "envelope dropped");
        }
        processed.fetch_add(1, Ordering::Relaxed);
    }
    tracing::debug!(worker, "engine worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::EngineSettings;
    use crate::application::use_cases::test_support::engine;
    use crate::domain::quote::request::fixtures::quote_request_payload;
    use serde_json::json;

    fn envelope(id: &str) -> MessageEnvelope {
        serde_json::from_value(json!({
            "id": format!("env-{id}"),
            "type": "quote",
            "content": {
                "headers": {"fspiop-source": "payerfsp", "fspiop-destination": "payeefsp"},
                "payload": quote_request_payload(id, "USD")
            },
            "metadata": {"event": {"type": "quote", "action": "post"}}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn processes_submitted_envelopes_before_stopping() {
        let test = engine(EngineSettings::default(), Vec::new());
        let runtime = EngineRuntime::start(
            Arc::new(MessageDispatcher::new(test.ctx.clone())),
            RuntimeConfig {
                workers: 2,
                queue_capacity: 8,
            },
        );
        let handle = runtime.handle();

        for id in ["q-1", "q-2", "q-3"] {
            handle.submit(envelope(id)).await.unwrap();
        }

        assert_eq!(runtime.stop().await, 3);
        assert_eq!(test.repository.quote_count(), 3);
        assert_eq!(test.client.requests().len(), 3);
    }

    #[tokio::test]
    async fn submit_after_stop_is_refused() {
        let test = engine(EngineSettings::default(), Vec::new());
        let runtime = EngineRuntime::start(
            Arc::new(MessageDispatcher::new(test.ctx.clone())),
            RuntimeConfig::default(),
        );
        let handle = runtime.handle();

        runtime.stop().await;

        assert!(handle.is_stopped());
        assert_eq!(
            handle.submit(envelope("q-1")).await,
            Err(RuntimeError::Stopped)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn accepted_envelopes_are_processed_when_stop_races_submit() {
        let test = engine(EngineSettings::default(), Vec::new());
        let runtime = EngineRuntime::start(
            Arc::new(MessageDispatcher::new(test.ctx.clone())),
            RuntimeConfig {
                workers: 2,
                queue_capacity: 2,
            },
        );

        let submitters: Vec<_> = (0..8)
            .map(|n| {
                let handle = runtime.handle();
                tokio::spawn(async move {
                    let mut accepted = 0_u64;
                    for i in 0..25 {
                        if handle.submit(envelope(&format!("q-{n}-{i}"))).await.is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();
        tokio::task::yield_now().await;

        let processed = runtime.stop().await;
        let mut accepted = 0;
        for submitter in submitters {
            accepted += submitter.await.unwrap();
        }

        assert_eq!(processed, accepted);
        assert_eq!(test.repository.quote_count(), usize::try_from(accepted).unwrap());
    }

    #[tokio::test]
    async fn undecodable_envelope_still_counts() {
        let test = engine(EngineSettings::default(), Vec::new());
        let runtime = EngineRuntime::start(
            Arc::new(MessageDispatcher::new(test.ctx.clone())),
            RuntimeConfig::default(),
        );
        let mut bad = envelope("q-1");
        bad.metadata.event.action = "delete".to_string();

        runtime.handle().submit(bad).await.unwrap();

        assert_eq!(runtime.stop().await, 1);
        assert!(test.client.requests().is_empty());
    }
}
