//! Run controller
//!
//! Owns the lifecycle of one in-flight execution: submits the request, polls the
//! task on a fixed interval until it settles, and publishes every state change on
//! a watch channel. Starting a new run or dropping the controller aborts the
//! previous run's task; anything that task still delivers is rejected by the
//! generation/handle check in [`RunState`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context as _;
use coderun_client::ExecutionClient;
use coderun_core::domain::execution::{ExecutionRequest, TaskHandle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::backend::ExecutionBackend;
use crate::config::{CompletionPolicy, ControllerConfig};
use crate::draft::Draft;
use crate::state::{Phase, RunState, Tick, TransitionError};
use crate::submission::{SubmitOutcome, submit};

/// Loop bookkeeping, exposed so callers can check that nothing leaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerStats {
    /// Poll loops currently alive (0 or 1)
    pub active_loops: usize,
    /// Runs aborted before they settled
    pub cancelled_runs: usize,
}

/// Drives runs against an [`ExecutionBackend`]
///
/// Must be used from within a tokio runtime.
pub struct RunController<B: ExecutionBackend + ?Sized + 'static> {
    backend: Arc<B>,
    config: ControllerConfig,
    state: Arc<watch::Sender<RunState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    active_loops: Arc<AtomicUsize>,
    cancelled_runs: AtomicUsize,
}

impl RunController<ExecutionClient> {
    /// Builds a controller talking HTTP to `config.api_url`
    pub fn from_config(config: ControllerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let client = ExecutionClient::with_timeout(config.api_url.clone(), config.request_timeout)
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client, config))
    }
}

impl<B: ExecutionBackend + 'static> RunController<B> {
    pub fn new(backend: B, config: ControllerConfig) -> Self {
        Self::with_shared(Arc::new(backend), config)
    }
}

impl<B: ExecutionBackend + ?Sized + 'static> RunController<B> {
    /// Creates a controller around a backend that is also used elsewhere
    pub fn with_shared(backend: Arc<B>, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(RunState::new());
        Self {
            backend,
            config,
            state: Arc::new(state),
            worker: Mutex::new(None),
            active_loops: Arc::new(AtomicUsize::new(0)),
            cancelled_runs: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state snapshot
    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            active_loops: self.active_loops.load(Ordering::SeqCst),
            cancelled_runs: self.cancelled_runs.load(Ordering::SeqCst),
        }
    }

    /// Starts a run for `request`, tearing down any run still in flight
    ///
    /// Returns the generation of the new run.
    pub fn run(&self, request: ExecutionRequest) -> u64 {
        let mut worker = self.worker.lock().unwrap();
        self.abort_worker(&mut worker);

        let mut run = 0;
        self.state.send_modify(|state| run = state.restart());

        info!(
            "Starting run {} ({} byte(s) of code, {} dependencies)",
            run,
            request.code.len(),
            request.dependencies.len()
        );

        let task = RunTask {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            poll_interval: self.config.poll_interval,
            completion: self.config.completion,
            active_loops: Arc::clone(&self.active_loops),
        };
        *worker = Some(tokio::spawn(task.drive(run, request)));

        run
    }

    /// Starts a run from whatever the draft currently holds
    pub fn run_draft(&self, draft: &Draft) -> u64 {
        self.run(draft.to_request())
    }

    /// Tears the current run down and returns to `Idle`
    pub fn cancel(&self) {
        let mut worker = self.worker.lock().unwrap();
        self.abort_worker(&mut worker);

        self.state.send_if_modified(|state| {
            if *state.phase() == Phase::Idle {
                return false;
            }
            state.supersede();
            true
        });
    }

    /// Waits until the current run has nothing left in flight
    pub async fn wait_settled(&self) -> RunState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| state.phase().is_settled()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn abort_worker(&self, worker: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = worker.take() {
            if !handle.is_finished() {
                handle.abort();
                self.cancelled_runs.fetch_add(1, Ordering::SeqCst);
                debug!("Aborted unfinished run task");
            }
        }
    }
}

impl<B: ExecutionBackend + ?Sized + 'static> Drop for RunController<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().ok().and_then(Option::take) {
            handle.abort();
        }
        self.state.send_modify(RunState::supersede);
    }
}

/// Everything a spawned run needs, detached from the controller
struct RunTask<B: ExecutionBackend + ?Sized> {
    backend: Arc<B>,
    state: Arc<watch::Sender<RunState>>,
    poll_interval: Duration,
    completion: CompletionPolicy,
    active_loops: Arc<AtomicUsize>,
}

impl<B: ExecutionBackend + ?Sized> RunTask<B> {
    async fn drive(self, run: u64, request: ExecutionRequest) {
        let outcome = submit(self.backend.as_ref(), &request).await;
        let handle = match &outcome {
            SubmitOutcome::Accepted(handle) => Some(handle.clone()),
            SubmitOutcome::Rejected(_) => None,
        };

        if let Err(e) = self.apply(|state| state.apply_submission(run, outcome)) {
            debug!("Dropping submission outcome: {}", e);
            return;
        }

        if let Some(handle) = handle {
            self.poll_until_settled(run, handle).await;
        }
    }

    /// Polls `handle` until it completes, fails, or is superseded
    ///
    /// The next tick is only scheduled once the previous round trip resolved.
    async fn poll_until_settled(&self, run: u64, handle: TaskHandle) {
        let _loop = LoopGuard::enter(&self.active_loops);
        info!("Polling task {} every {:?}", handle, self.poll_interval);

        loop {
            time::sleep(self.poll_interval).await;
            debug!("Polling task {}", handle);

            let result = match self.backend.task_result(&handle).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Polling task {} failed: {}", handle, e);
                    if let Err(stale) =
                        self.apply(|state| state.apply_poll_error(run, &handle, e.to_string()))
                    {
                        debug!("Dropping poll error for task {}: {}", handle, stale);
                    }
                    return;
                }
            };

            match self.apply(|state| state.apply_poll(run, &handle, &result, self.completion)) {
                Ok(Tick::Continue) => {}
                Ok(Tick::Finished) => {
                    info!("Task {} completed", handle);
                    return;
                }
                Err(e) => {
                    debug!("Dropping poll result for task {}: {}", handle, e);
                    return;
                }
            }
        }
    }

    /// Runs one transition under the channel lock and notifies receivers if it applied
    fn apply<T>(
        &self,
        transition: impl FnOnce(&mut RunState) -> Result<T, TransitionError>,
    ) -> Result<T, TransitionError> {
        let mut applied = None;
        self.state.send_if_modified(|state| {
            let result = transition(state);
            let modified = result.is_ok();
            applied = Some(result);
            modified
        });
        applied.expect("send_if_modified runs the closure exactly once")
    }
}

/// Counts a live poll loop for as long as it exists, including when the task is aborted
struct LoopGuard(Arc<AtomicUsize>);

impl LoopGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
