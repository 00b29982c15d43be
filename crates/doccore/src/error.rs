use crate::workflow::NodeKind;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DocflowError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Session store error: {0}")]
    Session(#[from] SessionStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures local to one node of a running pipeline. These abort the
/// remaining nodes of the current run and land in its trace; they never
/// propagate beyond the run.
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

#[derive(Error, Debug, Clone)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(Uuid),

    #[error("Workflow has no nodes to run")]
    EmptyPipeline,

    #[error("Unsupported node kind: {0}")]
    UnsupportedNodeKind(NodeKind),

    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Violations of the node-append rules. Surfaced synchronously to the
/// caller attempting the append; the append is rejected outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("The first node of a PDF workflow must be text extraction")]
    PdfMustStartWithExtractText,

    #[error("Text workflows cannot use text-extraction nodes")]
    ExtractTextNotAllowed,

    #[error("This node kind cannot be added to the workflow")]
    NodeNotAllowed,
}

#[derive(Error, Debug, Clone)]
#[error("session store unavailable: {0}")]
pub struct SessionStoreError(pub String);
