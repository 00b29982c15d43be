use crate::executor::PipelineExecutor;
use doccore::{DocflowError, SessionStore, WorkflowId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

/// How many times a terminal status write is attempted before giving up
/// and leaving the session in `processing`.
const TERMINAL_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Wall-clock budget for one executor pass
    pub run_timeout: Duration,
    /// Total passes before the session is finalized as an error
    pub max_attempts: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(300),
            max_attempts: 3,
        }
    }
}

/// Schedules workflow runs off the request path.
///
/// `start` creates the session record, spawns the run, and returns the
/// session token immediately; callers observe the outcome by polling
/// the session store.
pub struct ExecutionCoordinator {
    executor: Arc<PipelineExecutor>,
    sessions: Arc<dyn SessionStore>,
    config: CoordinatorConfig,
}

impl ExecutionCoordinator {
    pub fn new(executor: Arc<PipelineExecutor>, sessions: Arc<dyn SessionStore>) -> Self {
        Self::with_config(executor, sessions, CoordinatorConfig::default())
    }

    pub fn with_config(
        executor: Arc<PipelineExecutor>,
        sessions: Arc<dyn SessionStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            executor,
            sessions,
            config,
        }
    }

    /// Schedule a run of the workflow and return its session token.
    ///
    /// Errors raised while scheduling (here, the initial session write)
    /// surface synchronously; everything after that is reported through
    /// the session record.
    pub async fn start(&self, workflow_id: WorkflowId) -> Result<String, DocflowError> {
        let session_id = format!("{}.{}", workflow_id, Uuid::new_v4());
        self.sessions.create(&session_id, workflow_id).await?;

        tracing::info!(
            "Scheduled workflow {} run as session {}",
            workflow_id,
            session_id
        );

        let executor = Arc::clone(&self.executor);
        let sessions = Arc::clone(&self.sessions);
        let config = self.config.clone();
        let spawned_id = session_id.clone();
        tokio::spawn(async move {
            run_to_completion(executor, sessions, config, workflow_id, spawned_id).await;
        });

        Ok(session_id)
    }
}

/// Drive the executor to a terminal session status.
///
/// Each attempt is a brand-new pass through the executor; there is no
/// resumption from a partial node list. A trace is terminal success
/// even when its last record is a node error. Executor-level failures
/// and budget overruns are retried up to `max_attempts`, then recorded
/// as the session's error.
async fn run_to_completion(
    executor: Arc<PipelineExecutor>,
    sessions: Arc<dyn SessionStore>,
    config: CoordinatorConfig,
    workflow_id: WorkflowId,
    session_id: String,
) {
    let mut last_error = String::new();

    for attempt in 1..=config.max_attempts.max(1) {
        match timeout(config.run_timeout, executor.run(workflow_id)).await {
            Ok(Ok(trace)) => {
                tracing::info!(
                    "Workflow {} finished ({} node results), session {}",
                    workflow_id,
                    trace.results.len(),
                    session_id
                );
                let outcome = match serde_json::to_value(&trace) {
                    Ok(json) => Outcome::Completed(json),
                    Err(e) => Outcome::Failed(format!("failed to serialize trace: {e}")),
                };
                finalize(sessions.as_ref(), &session_id, outcome).await;
                return;
            }
            Ok(Err(e)) => {
                last_error = e.to_string();
                tracing::error!(
                    "Workflow {} run failed (attempt {}/{}): {}",
                    workflow_id,
                    attempt,
                    config.max_attempts,
                    last_error
                );
            }
            Err(_) => {
                last_error = format!(
                    "workflow run exceeded the {}s budget",
                    config.run_timeout.as_secs()
                );
                tracing::error!(
                    "Workflow {} timed out (attempt {}/{})",
                    workflow_id,
                    attempt,
                    config.max_attempts
                );
            }
        }
    }

    finalize(sessions.as_ref(), &session_id, Outcome::Failed(last_error)).await;
}

enum Outcome {
    Completed(serde_json::Value),
    Failed(String),
}

/// Best-effort terminal write: retried a fixed number of times, logged
/// on persistent failure, never panicking the worker. If it ultimately
/// fails the session stays `processing` and pollers time out
/// client-side.
async fn finalize(sessions: &dyn SessionStore, session_id: &str, outcome: Outcome) {
    for attempt in 1..=TERMINAL_WRITE_ATTEMPTS {
        let written = match &outcome {
            Outcome::Completed(trace) => sessions.complete(session_id, trace.clone()).await,
            Outcome::Failed(message) => sessions.fail(session_id, message).await,
        };

        match written {
            Ok(()) => return,
            Err(e) if attempt < TERMINAL_WRITE_ATTEMPTS => {
                tracing::warn!(
                    "Recording terminal status for session {} failed (attempt {}/{}): {}",
                    session_id,
                    attempt,
                    TERMINAL_WRITE_ATTEMPTS,
                    e
                );
            }
            Err(e) => {
                tracing::error!(
                    "Giving up recording terminal status for session {}: {}",
                    session_id,
                    e
                );
            }
        }
    }
}
