//! Workflow execution runtime
//!
//! This crate provides the execution engine that runs linear pipelines:
//! the processor registry, the sequential executor, the in-memory
//! workflow/session stores, and the coordinator that schedules runs off
//! the request path.

mod coordinator;
mod executor;
mod memory;
mod registry;

pub use coordinator::{CoordinatorConfig, ExecutionCoordinator};
pub use executor::PipelineExecutor;
pub use memory::{InMemorySessionStore, InMemoryWorkflowStore};
pub use registry::ProcessorRegistry;
