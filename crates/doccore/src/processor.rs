use crate::error::NodeError;
use crate::workflow::NodeKind;
use crate::Value;
use async_trait::async_trait;
use std::collections::HashMap;

/// Core trait implemented by every node processor.
///
/// A processor is a pure transformation from the pipeline's running
/// value to the next one: it takes this node's configuration and the
/// previous node's output (or the workflow input for the first node)
/// and produces a string. Processors hold no per-run state and are
/// shared across concurrent runs.
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    /// The node kind this processor handles
    fn kind(&self) -> NodeKind;

    /// Run the node against the current pipeline value
    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError>;
}
