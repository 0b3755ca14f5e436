//! Submission state machine driving one batch exchange at a time
//!
//! Each submission is tagged with a generation number. Starting a new one
//! aborts the request still in flight, and any completion whose generation
//! is not the latest is dropped, so results never land out of order.

use crate::error::{SubmitError, ValidationError};
use crate::proxy::aggregator::{aggregate, ResultSet};
use crate::proxy::client::BatchClient;
use crate::proxy::models::{BatchRequest, RawTestEntry};
use crate::proxy::validator::validate;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

/// Where the current submission stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Succeeded,
    /// Rejected locally before any request was sent
    Rejected(ValidationError),
    Failed(SubmitError),
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmissionState::Loading)
    }

    /// Message to show the operator, if any
    pub fn message(&self) -> Option<String> {
        match self {
            SubmissionState::Rejected(err) => Some(err.to_string()),
            SubmissionState::Failed(err) => Some(err.banner()),
            _ => None,
        }
    }
}

/// Finished exchange, tagged with the submission it belongs to
#[derive(Debug)]
struct Completion {
    generation: u64,
    outcome: Result<Vec<RawTestEntry>, SubmitError>,
}

/// Owns the result set and the single in-flight request
pub struct Orchestrator {
    client: BatchClient,
    state: SubmissionState,
    results: ResultSet,
    generation: u64,
    in_flight: Option<AbortHandle>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl Orchestrator {
    pub fn new(client: BatchClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            state: SubmissionState::Idle,
            results: ResultSet::default(),
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Validate the input and start a new submission.
    ///
    /// Must be called from within a tokio runtime. Any previous request is
    /// aborted and its results are cleared, whether or not validation passes.
    pub fn submit(&mut self, raw: &str, max_threads: Option<i64>) -> Result<(), ValidationError> {
        let request = self.begin(raw, max_threads)?;

        let generation = self.generation;
        let client = self.client.clone();
        let tx = self.tx.clone();
        info!(generation, max_threads = request.max_threads, "Starting submission");

        let task = tokio::spawn(async move {
            let outcome = client.test_batch(&request).await;
            // The receiver only goes away with the orchestrator itself
            let _ = tx.send(Completion { generation, outcome });
        });
        self.in_flight = Some(task.abort_handle());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Err(join_err) = task.await {
                if join_err.is_panic() {
                    error!(generation, "Submission task panicked");
                    let _ = tx.send(Completion {
                        generation,
                        outcome: Err(SubmitError::Unknown),
                    });
                }
            }
        });

        Ok(())
    }

    /// Validate, cancel the previous submission and reset state
    fn begin(&mut self, raw: &str, max_threads: Option<i64>) -> Result<BatchRequest, ValidationError> {
        let validated = validate(raw, max_threads);

        self.cancel_in_flight();
        self.generation += 1;
        self.results = ResultSet::default();

        match validated {
            Ok(submission) => {
                self.state = SubmissionState::Loading;
                Ok(submission.into_request())
            }
            Err(err) => {
                debug!("Rejected empty proxy list");
                self.state = SubmissionState::Rejected(err.clone());
                Err(err)
            }
        }
    }

    /// Apply any finished submissions without blocking.
    ///
    /// Returns true when the visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(completion) => changed |= self.apply(completion),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Wait until the current submission finishes
    pub async fn wait(&mut self) -> &SubmissionState {
        while self.state.is_loading() {
            match self.rx.recv().await {
                Some(completion) => {
                    self.apply(completion);
                }
                None => break,
            }
        }
        &self.state
    }

    fn apply(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation || !self.state.is_loading() {
            debug!(
                stale = completion.generation,
                current = self.generation,
                "Discarding stale submission result"
            );
            return false;
        }

        self.in_flight = None;
        match completion.outcome {
            Ok(entries) => {
                self.results = aggregate(entries);
                info!(
                    total = self.results.len(),
                    success = self.results.success_count,
                    error = self.results.error_count,
                    "Submission finished"
                );
                self.state = SubmissionState::Succeeded;
            }
            Err(err) => {
                error!(error = %err, "Submission failed");
                self.results = ResultSet::default();
                self.state = SubmissionState::Failed(err);
            }
        }
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!(generation = self.generation, "Aborting in-flight submission");
            handle.abort();
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
