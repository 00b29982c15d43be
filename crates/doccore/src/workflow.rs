use crate::error::DomainError;
use crate::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type NodeId = Uuid;

/// Declared input/output format of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoType {
    Text,
    Pdf,
}

impl IoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IoType::Text => "text",
            IoType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of node kinds a pipeline can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    ExtractText,
    GenerativeAi,
    Formatter,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::ExtractText => "extract_text",
            NodeKind::GenerativeAi => "generative_ai",
            NodeKind::Formatter => "formatter",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a workflow's linear pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub workflow_id: WorkflowId,
    #[serde(rename = "node_type")]
    pub kind: NodeKind,
    pub config: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(workflow_id: WorkflowId, kind: NodeKind, config: HashMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            kind,
            config,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Workflow definition: a named, typed pipeline over a single input.
///
/// Updates are copy-on-write: every mutation method returns a new value
/// with `updated_at` refreshed, leaving the original untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub input_type: IoType,
    pub output_type: IoType,
    #[serde(default)]
    pub input_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        input_type: IoType,
        output_type: IoType,
        input_data: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            input_type,
            output_type,
            input_data,
            created_at: now,
            updated_at: now,
            nodes: Vec::new(),
        }
    }

    /// Attach the persisted node sequence, e.g. before domain validation
    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn rename(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn update_io_config(
        &self,
        input_type: IoType,
        output_type: IoType,
        input_data: Option<String>,
    ) -> Self {
        Self {
            input_type,
            output_type,
            input_data,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Whether a node of the given kind may be appended to this pipeline.
    ///
    /// PDF workflows must start with text extraction; text workflows may
    /// never contain a text-extraction node.
    pub fn can_append(&self, kind: NodeKind) -> bool {
        if self.input_type == IoType::Pdf && self.nodes.is_empty() {
            return kind == NodeKind::ExtractText;
        }

        if self.input_type == IoType::Text && kind == NodeKind::ExtractText {
            return false;
        }

        true
    }

    /// Check the append rules, reporting which rule was violated.
    ///
    /// The final `NodeNotAllowed` arm is unreachable for the two current
    /// input types; it stays so that a new input type cannot silently
    /// bypass validation.
    pub fn validate_append(&self, kind: NodeKind) -> Result<(), DomainError> {
        if self.can_append(kind) {
            return Ok(());
        }

        if self.input_type == IoType::Pdf && self.nodes.is_empty() {
            return Err(DomainError::PdfMustStartWithExtractText);
        }

        if self.input_type == IoType::Text && kind == NodeKind::ExtractText {
            return Err(DomainError::ExtractTextNotAllowed);
        }

        Err(DomainError::NodeNotAllowed)
    }
}
