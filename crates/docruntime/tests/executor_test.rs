use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use doccore::{
    DocumentRenderer, IoType, Node, NodeError, NodeKind, NodeProcessor, RenderError, RunStatus,
    Value, Workflow, WorkflowError, WorkflowId, WorkflowStore,
};
use docruntime::{InMemoryWorkflowStore, PipelineExecutor, ProcessorRegistry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Test processor with an observable invocation counter. Appends "+"
/// to its input, or fails when the node config says so.
struct ProbeProcessor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NodeProcessor for ProbeProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Formatter
    }

    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if config.get("fail").and_then(Value::as_bool) == Some(true) {
            return Err(NodeError::InvalidInput("forced failure".into()));
        }

        Ok(format!("{}+", input.unwrap_or("")))
    }
}

struct StubRenderer;

impl DocumentRenderer for StubRenderer {
    fn render(&self, text: &str) -> Result<Vec<u8>, RenderError> {
        Ok(format!("%PDF {text}").into_bytes())
    }
}

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(&self, _text: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError("renderer exploded".into()))
    }
}

fn probe_registry(calls: &Arc<AtomicUsize>) -> Arc<ProcessorRegistry> {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(ProbeProcessor {
        calls: Arc::clone(calls),
    }));
    Arc::new(registry)
}

fn ok_config() -> HashMap<String, Value> {
    HashMap::new()
}

fn fail_config() -> HashMap<String, Value> {
    HashMap::from([("fail".to_string(), Value::from(true))])
}

async fn seed_workflow(
    store: &InMemoryWorkflowStore,
    input_type: IoType,
    output_type: IoType,
    input_data: Option<&str>,
    configs: Vec<HashMap<String, Value>>,
) -> WorkflowId {
    let workflow = Workflow::new(
        "test workflow",
        input_type,
        output_type,
        input_data.map(String::from),
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

#[tokio::test]
async fn threads_output_through_nodes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(
        &store,
        IoType::Text,
        IoType::Text,
        Some("hello world"),
        vec![ok_config(), ok_config()],
    )
    .await;

    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));
    let trace = executor.run(id).await.unwrap();

    assert_eq!(trace.results.len(), 2);
    assert!(trace
        .results
        .iter()
        .all(|r| r.status == RunStatus::Success));
    assert_eq!(trace.results[0].result.as_deref(), Some("hello world+"));
    assert_eq!(trace.final_result.as_deref(), Some("hello world++"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_node_aborts_remaining_nodes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(
        &store,
        IoType::Text,
        IoType::Text,
        Some("start"),
        vec![
            ok_config(),
            ok_config(),
            fail_config(),
            ok_config(),
            ok_config(),
        ],
    )
    .await;

    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));
    let trace = executor.run(id).await.unwrap();

    assert_eq!(trace.results.len(), 3);
    assert_eq!(trace.results[0].status, RunStatus::Success);
    assert_eq!(trace.results[1].status, RunStatus::Success);
    assert_eq!(trace.results[2].status, RunStatus::Error);
    assert!(trace.results[2]
        .error
        .as_deref()
        .unwrap()
        .contains("forced failure"));
    assert!(trace.results[2].result.is_none());
    assert!(trace.final_result.is_none());

    // Nodes 4 and 5 never executed
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_pipeline_is_an_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(&store, IoType::Text, IoType::Text, Some("x"), vec![]).await;

    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));
    let result = executor.run(id).await;

    assert!(matches!(result, Err(WorkflowError::EmptyPipeline)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_workflow_is_not_found() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));

    let missing = WorkflowId::new_v4();
    let result = executor.run(missing).await;

    assert!(matches!(result, Err(WorkflowError::NotFound(id)) if id == missing));
}

#[tokio::test]
async fn unregistered_kind_is_recorded_in_the_trace() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let workflow = Workflow::new("test", IoType::Text, IoType::Text, Some("x".into()));
    let id = workflow.id;
    store.save_workflow(workflow).await;
    store
        .append_node(Node::new(id, NodeKind::GenerativeAi, HashMap::new()))
        .await;

    // Registry only knows the probe's formatter kind
    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));
    let trace = executor.run(id).await.unwrap();

    assert_eq!(trace.results.len(), 1);
    assert_eq!(trace.results[0].status, RunStatus::Error);
    assert!(trace.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Unsupported node kind"));
    assert!(trace.final_result.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pdf_output_is_rendered_and_base64_encoded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(
        &store,
        IoType::Text,
        IoType::Pdf,
        Some("report body"),
        vec![ok_config()],
    )
    .await;

    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(StubRenderer));
    let trace = executor.run(id).await.unwrap();

    let encoded = trace.final_result.expect("final result");
    let decoded = STANDARD.decode(encoded).expect("valid base64");
    assert_eq!(decoded, b"%PDF report body+");
}

#[tokio::test]
async fn renderer_failure_fails_the_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(
        &store,
        IoType::Text,
        IoType::Pdf,
        Some("x"),
        vec![ok_config()],
    )
    .await;

    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(FailingRenderer));
    let result = executor.run(id).await;

    assert!(matches!(result, Err(WorkflowError::RenderFailed(_))));
}

#[tokio::test]
async fn aborted_pdf_run_skips_rendering() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryWorkflowStore::new());
    let id = seed_workflow(
        &store,
        IoType::Text,
        IoType::Pdf,
        Some("x"),
        vec![fail_config()],
    )
    .await;

    // The failing renderer proves rendering is never reached
    let executor = PipelineExecutor::new(store, probe_registry(&calls), Arc::new(FailingRenderer));
    let trace = executor.run(id).await.unwrap();

    assert_eq!(trace.results.len(), 1);
    assert_eq!(trace.results[0].status, RunStatus::Error);
    assert!(trace.final_result.is_none());
}
