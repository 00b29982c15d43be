use crate::registry::ProcessorRegistry;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use doccore::{
    DocumentRenderer, ExecutionTrace, IoType, NodeRunRecord, WorkflowError, WorkflowId,
    WorkflowStore,
};
use std::sync::Arc;

/// Executes a workflow's nodes strictly in order, threading each node's
/// output into the next node's input.
pub struct PipelineExecutor {
    store: Arc<dyn WorkflowStore>,
    registry: Arc<ProcessorRegistry>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl PipelineExecutor {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        registry: Arc<ProcessorRegistry>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            store,
            registry,
            renderer,
        }
    }

    /// Run the workflow's pipeline and return the per-node trace.
    ///
    /// The first failing node aborts the remaining nodes: its error is
    /// recorded in the trace and `final_result` stays empty. A trace
    /// containing an error entry is still a normal return value; only
    /// failures outside the node loop (missing workflow, empty pipeline,
    /// PDF rendering) surface as an `Err`.
    pub async fn run(&self, workflow_id: WorkflowId) -> Result<ExecutionTrace, WorkflowError> {
        let workflow = self
            .store
            .find_workflow(workflow_id)
            .await
            .ok_or(WorkflowError::NotFound(workflow_id))?;

        let nodes = self.store.list_nodes(workflow_id).await;
        if nodes.is_empty() {
            return Err(WorkflowError::EmptyPipeline);
        }

        tracing::info!(
            "Running workflow {} ({}, {} nodes)",
            workflow_id,
            workflow.name,
            nodes.len()
        );

        let mut results = Vec::with_capacity(nodes.len());
        let mut current = workflow.input_data.clone();
        let mut aborted = false;

        for node in &nodes {
            let outcome = match self.registry.get(node.kind) {
                Ok(processor) => processor
                    .process(&node.config, current.as_deref())
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(result) => {
                    tracing::info!("Node {} ({}) completed", node.id, node.kind);
                    results.push(NodeRunRecord::success(node, result.clone()));
                    current = Some(result);
                }
                Err(message) => {
                    tracing::error!("Node {} ({}) failed: {}", node.id, node.kind, message);
                    results.push(NodeRunRecord::failure(node, message));
                    aborted = true;
                    break;
                }
            }
        }

        let final_result = if aborted {
            None
        } else {
            match (workflow.output_type, current) {
                (IoType::Pdf, Some(text)) => Some(self.render_pdf(text).await?),
                (_, value) => value,
            }
        };

        Ok(ExecutionTrace {
            workflow_id,
            workflow_name: workflow.name,
            input_type: workflow.input_type,
            output_type: workflow.output_type,
            results,
            final_result,
        })
    }

    /// Render the final text as a PDF and base64-encode it for transport.
    /// Rendering is CPU-bound, so it runs on the blocking pool.
    async fn render_pdf(&self, text: String) -> Result<String, WorkflowError> {
        let renderer = Arc::clone(&self.renderer);
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&text))
            .await
            .map_err(|e| WorkflowError::RenderFailed(format!("render task panicked: {e}")))?
            .map_err(|e| WorkflowError::RenderFailed(e.to_string()))?;

        Ok(STANDARD.encode(bytes))
    }
}
