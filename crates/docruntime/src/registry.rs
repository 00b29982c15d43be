use doccore::{NodeKind, NodeProcessor, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of node processors, keyed by the kind they handle.
///
/// Processors are registered once at startup and shared; lookups after
/// that are read-only and safe from any number of concurrent runs.
pub struct ProcessorRegistry {
    processors: HashMap<NodeKind, Arc<dyn NodeProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Register a processor under the kind it reports
    pub fn register(&mut self, processor: Arc<dyn NodeProcessor>) {
        let kind = processor.kind();
        tracing::info!("Registering node kind: {}", kind);
        self.processors.insert(kind, processor);
    }

    /// Resolve the processor for a node kind
    pub fn get(&self, kind: NodeKind) -> Result<Arc<dyn NodeProcessor>, WorkflowError> {
        self.processors
            .get(&kind)
            .cloned()
            .ok_or(WorkflowError::UnsupportedNodeKind(kind))
    }

    /// All registered kinds
    pub fn kinds(&self) -> Vec<NodeKind> {
        self.processors.keys().copied().collect()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
