use crate::workflow::{IoType, Node, NodeId, NodeKind, WorkflowId};
use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Outcome of one node within a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRunRecord {
    pub node_id: NodeId,
    #[serde(rename = "node_type")]
    pub kind: NodeKind,
    pub config: HashMap<String, Value>,
    pub result: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeRunRecord {
    pub fn success(node: &Node, result: String) -> Self {
        Self {
            node_id: node.id,
            kind: node.kind,
            config: node.config.clone(),
            result: Some(result),
            status: RunStatus::Success,
            error: None,
        }
    }

    pub fn failure(node: &Node, error: String) -> Self {
        Self {
            node_id: node.id,
            kind: node.kind,
            config: node.config.clone(),
            result: None,
            status: RunStatus::Error,
            error: Some(error),
        }
    }
}

/// Full record of one pipeline run: per-node outcomes plus the final
/// value. `final_result` is `None` when the run aborted on a node
/// failure; for PDF output it carries the rendered document as base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub input_type: IoType,
    pub output_type: IoType,
    pub results: Vec<NodeRunRecord>,
    pub final_result: Option<String>,
}
