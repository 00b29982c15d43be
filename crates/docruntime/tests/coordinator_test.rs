use async_trait::async_trait;
use doccore::{
    DocumentRenderer, IoType, Node, NodeError, NodeKind, NodeProcessor, RenderError,
    SessionRecord, SessionStatus, SessionStore, Value, Workflow, WorkflowId, WorkflowStore,
};
use docruntime::{
    CoordinatorConfig, ExecutionCoordinator, InMemorySessionStore, InMemoryWorkflowStore,
    PipelineExecutor, ProcessorRegistry,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Uppercases its input; sleeps first when the config sets `delay_ms`
struct UpperProcessor;

#[async_trait]
impl NodeProcessor for UpperProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Formatter
    }

    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        if let Some(delay_ms) = config.get("delay_ms").and_then(Value::as_f64) {
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        }
        Ok(input.unwrap_or_default().to_ascii_uppercase())
    }
}

struct StubRenderer;

impl DocumentRenderer for StubRenderer {
    fn render(&self, text: &str) -> Result<Vec<u8>, RenderError> {
        Ok(text.as_bytes().to_vec())
    }
}

struct Harness {
    store: Arc<InMemoryWorkflowStore>,
    sessions: Arc<InMemorySessionStore>,
    coordinator: ExecutionCoordinator,
}

fn harness(config: CoordinatorConfig) -> Harness {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());

    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(UpperProcessor));

    let executor = Arc::new(PipelineExecutor::new(
        Arc::clone(&store) as Arc<dyn WorkflowStore>,
        Arc::new(registry),
        Arc::new(StubRenderer),
    ));
    let coordinator = ExecutionCoordinator::with_config(
        executor,
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        config,
    );

    Harness {
        store,
        sessions,
        coordinator,
    }
}

fn quick_config() -> CoordinatorConfig {
    CoordinatorConfig {
        run_timeout: Duration::from_secs(5),
        max_attempts: 2,
    }
}

async fn seed_workflow(
    store: &InMemoryWorkflowStore,
    input_data: &str,
    configs: Vec<HashMap<String, Value>>,
) -> WorkflowId {
    let workflow = Workflow::new(
        "async test",
        IoType::Text,
        IoType::Text,
        Some(input_data.to_string()),
    );
    let id = workflow.id;
    store.save_workflow(workflow).await;
    for config in configs {
        store
            .append_node(Node::new(id, NodeKind::Formatter, config))
            .await;
    }
    id
}

async fn wait_terminal(sessions: &InMemorySessionStore, session_id: &str) -> SessionRecord {
    for _ in 0..200 {
        if let Some(record) = sessions.get(session_id).await {
            if record.status != SessionStatus::Processing {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} never reached a terminal status");
}

#[tokio::test]
async fn start_returns_a_workflow_prefixed_session() {
    let h = harness(quick_config());
    let id = seed_workflow(&h.store, "hi", vec![HashMap::new()]).await;

    let session_id = h.coordinator.start(id).await.unwrap();

    assert!(session_id.starts_with(&id.to_string()));
    let record = h.sessions.get(&session_id).await.expect("session exists");
    assert_eq!(record.workflow_id, id);
}

#[tokio::test]
async fn successful_run_completes_the_session() {
    let h = harness(quick_config());
    let id = seed_workflow(&h.store, "hello world", vec![HashMap::new()]).await;

    let session_id = h.coordinator.start(id).await.unwrap();
    let record = wait_terminal(&h.sessions, &session_id).await;

    assert_eq!(record.status, SessionStatus::Completed);
    let trace = record.result.expect("trace stored");
    assert_eq!(trace["final_result"], "HELLO WORLD");
    assert_eq!(trace["results"].as_array().unwrap().len(), 1);
    assert_eq!(trace["results"][0]["status"], "success");
}

#[tokio::test]
async fn run_with_no_nodes_records_an_error() {
    let h = harness(quick_config());
    let id = seed_workflow(&h.store, "hi", vec![]).await;

    let session_id = h.coordinator.start(id).await.unwrap();
    let record = wait_terminal(&h.sessions, &session_id).await;

    assert_eq!(record.status, SessionStatus::Error);
    let payload = record.result.expect("error payload");
    assert_eq!(payload["error"], true);
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("no nodes"));
}

#[tokio::test]
async fn exceeding_the_run_budget_records_an_error() {
    let h = harness(CoordinatorConfig {
        run_timeout: Duration::from_millis(50),
        max_attempts: 1,
    });
    let id = seed_workflow(
        &h.store,
        "slow",
        vec![HashMap::from([(
            "delay_ms".to_string(),
            Value::from(500.0),
        )])],
    )
    .await;

    let session_id = h.coordinator.start(id).await.unwrap();
    let record = wait_terminal(&h.sessions, &session_id).await;

    assert_eq!(record.status, SessionStatus::Error);
    assert!(record.result.unwrap()["message"]
        .as_str()
        .unwrap()
        .contains("budget"));
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() {
    let h = harness(quick_config());
    let first = seed_workflow(&h.store, "one", vec![HashMap::new()]).await;
    let second = seed_workflow(&h.store, "two", vec![HashMap::new()]).await;

    let session_a = h.coordinator.start(first).await.unwrap();
    let session_b = h.coordinator.start(second).await.unwrap();
    assert_ne!(session_a, session_b);

    let record_a = wait_terminal(&h.sessions, &session_a).await;
    let record_b = wait_terminal(&h.sessions, &session_b).await;

    assert_eq!(record_a.result.unwrap()["final_result"], "ONE");
    assert_eq!(record_b.result.unwrap()["final_result"], "TWO");
}

#[tokio::test]
async fn unknown_sessions_are_absent() {
    let h = harness(quick_config());
    assert!(h.sessions.get("nonexistent-session").await.is_none());
}
