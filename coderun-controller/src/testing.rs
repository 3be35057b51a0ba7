//! Scripted execution backend for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coderun_client::ClientError;
use coderun_core::domain::diagnostic::DiagnosticIssue;
use coderun_core::domain::execution::{ExecutionRequest, PollResult, TaskHandle};
use tokio::sync::Notify;

use crate::backend::ExecutionBackend;

enum PollStep {
    Respond(Result<PollResult, ClientError>),
    /// Holds the response back until the gate is notified
    Gated(Arc<Notify>, PollResult),
}

/// Backend that replays queued answers
///
/// Submissions are answered in order. Polls are answered per handle; once a
/// handle's queue is empty every further poll reports `PENDING`.
#[derive(Default)]
pub struct ScriptedBackend {
    submissions: Mutex<VecDeque<Result<TaskHandle, ClientError>>>,
    polls: Mutex<HashMap<String, VecDeque<PollStep>>>,
    requests: Mutex<Vec<ExecutionRequest>>,
    poll_log: Mutex<Vec<TaskHandle>>,
    /// Notified every time a poll starts
    pub poll_started: Notify,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(self, id: &str) -> Self {
        self.push_submission(Ok(TaskHandle::new(id)))
    }

    pub fn reject(self, issues: Vec<DiagnosticIssue>) -> Self {
        self.push_submission(Err(ClientError::Rejected {
            status: 400,
            issues,
        }))
    }

    pub fn fail_submit(self, error: ClientError) -> Self {
        self.push_submission(Err(error))
    }

    pub fn respond(self, id: &str, result: PollResult) -> Self {
        self.push_poll(id, PollStep::Respond(Ok(result)))
    }

    pub fn fail_poll(self, id: &str, error: ClientError) -> Self {
        self.push_poll(id, PollStep::Respond(Err(error)))
    }

    pub fn gated(self, id: &str, gate: Arc<Notify>, result: PollResult) -> Self {
        self.push_poll(id, PollStep::Gated(gate, result))
    }

    /// Number of polls issued for `id`
    pub fn polls_for(&self, id: &str) -> usize {
        self.poll_log
            .lock()
            .unwrap()
            .iter()
            .filter(|handle| handle.as_str() == id)
            .count()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_log.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push_submission(self, answer: Result<TaskHandle, ClientError>) -> Self {
        self.submissions.lock().unwrap().push_back(answer);
        self
    }

    fn push_poll(self, id: &str, step: PollStep) -> Self {
        self.polls
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(step);
        self
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn execute(&self, request: &ExecutionRequest) -> Result<TaskHandle, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::ParseError("no scripted submission".to_string())))
    }

    async fn task_result(&self, handle: &TaskHandle) -> Result<PollResult, ClientError> {
        self.poll_log.lock().unwrap().push(handle.clone());
        self.poll_started.notify_one();

        let step = self
            .polls
            .lock()
            .unwrap()
            .get_mut(handle.as_str())
            .and_then(VecDeque::pop_front);

        match step {
            Some(PollStep::Respond(answer)) => answer,
            Some(PollStep::Gated(gate, result)) => {
                gate.notified().await;
                Ok(result)
            }
            None => Ok(PollResult {
                status: Some("PENDING".to_string()),
                ..Default::default()
            }),
        }
    }
}
