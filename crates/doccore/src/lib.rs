//! Core abstractions for the docflow engine
//!
//! This crate provides the entities, error taxonomy, and collaborator
//! trait seams that all other components depend on. It has no runtime
//! dependencies of its own.

mod error;
mod processor;
mod session;
mod store;
mod trace;
mod value;
mod workflow;

pub use error::{DocflowError, DomainError, NodeError, SessionStoreError, WorkflowError};
pub use processor::NodeProcessor;
pub use session::{SessionRecord, SessionStatus, SessionStore};
pub use store::{
    DocumentRenderer, ExtractionError, FileStore, RenderError, TextExtractor, WorkflowStore,
};
pub use trace::{ExecutionTrace, NodeRunRecord, RunStatus};
pub use value::Value;
pub use workflow::{IoType, Node, NodeId, NodeKind, Workflow, WorkflowId};

/// Result type for docflow operations
pub type Result<T> = std::result::Result<T, DocflowError>;
