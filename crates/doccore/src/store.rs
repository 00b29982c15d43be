use crate::workflow::{Node, Workflow, WorkflowId};
use async_trait::async_trait;
use thiserror::Error;

/// Persistence seam for workflows and their node sequences.
///
/// The executor and the append validator rely only on `find_workflow`,
/// `list_nodes`, and `append_node`; the remaining operations exist for
/// the HTTP surface. `list_nodes` returns nodes in creation order.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn find_workflow(&self, id: WorkflowId) -> Option<Workflow>;

    async fn list_nodes(&self, workflow_id: WorkflowId) -> Vec<Node>;

    async fn append_node(&self, node: Node) -> Node;

    async fn save_workflow(&self, workflow: Workflow) -> Workflow;

    /// Delete a workflow and, cascading, its nodes. Returns whether the
    /// workflow existed.
    async fn delete_workflow(&self, id: WorkflowId) -> bool;

    async fn list_workflows(&self) -> Vec<Workflow>;
}

/// Binary file storage addressed by the logical path recorded at upload
/// time (e.g. `uploads/1733822400_report.pdf`).
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, std::io::Error>;

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), std::io::Error>;
}

#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct ExtractionError(pub String);

/// PDF text extraction. Implementations are blocking; callers run them
/// on the blocking thread pool.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Text-to-PDF rendering. The produced bytes are opaque to the engine,
/// which only base64-encodes them for transport. Blocking, like
/// [`TextExtractor`].
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, text: &str) -> Result<Vec<u8>, RenderError>;
}
