use async_trait::async_trait;
use chrono::Utc;
use doccore::{
    Node, SessionRecord, SessionStatus, SessionStore, SessionStoreError, Workflow, WorkflowId,
    WorkflowStore,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory workflow/node storage.
///
/// Nodes are kept per workflow in append order, which is also creation
/// order, so `list_nodes` needs no sorting.
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
    nodes: RwLock<HashMap<WorkflowId, Vec<Node>>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            nodes: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find_workflow(&self, id: WorkflowId) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    async fn list_nodes(&self, workflow_id: WorkflowId) -> Vec<Node> {
        self.nodes
            .read()
            .await
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append_node(&self, node: Node) -> Node {
        let mut nodes = self.nodes.write().await;
        nodes
            .entry(node.workflow_id)
            .or_default()
            .push(node.clone());
        node
    }

    async fn save_workflow(&self, workflow: Workflow) -> Workflow {
        // The node sequence lives in its own map; the stored workflow
        // record stays bare.
        let stored = Workflow {
            nodes: Vec::new(),
            ..workflow.clone()
        };
        self.workflows.write().await.insert(stored.id, stored);
        workflow
    }

    async fn delete_workflow(&self, id: WorkflowId) -> bool {
        let existed = self.workflows.write().await.remove(&id).is_some();
        if existed {
            self.nodes.write().await.remove(&id);
        }
        existed
    }

    async fn list_workflows(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by_key(|w| w.created_at);
        workflows
    }
}

/// In-memory session store for the polled status protocol.
///
/// Finalization is write-once: once a session has left `processing`,
/// further `complete`/`fail` calls leave it unchanged.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn finalize(
        &self,
        session_id: &str,
        status: SessionStatus,
        result: serde_json::Value,
    ) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(record) if record.status != SessionStatus::Processing => {
                tracing::warn!(
                    "Session {} already finalized as {:?}; ignoring write",
                    session_id,
                    record.status
                );
            }
            Some(record) => {
                record.status = status;
                record.result = Some(result);
                record.updated_at = Utc::now();
            }
            None => {
                // Upsert: a finalize can arrive for a session whose
                // create was lost.
                let now = Utc::now();
                sessions.insert(
                    session_id.to_string(),
                    SessionRecord {
                        session_id: session_id.to_string(),
                        workflow_id: WorkflowId::nil(),
                        status,
                        result: Some(result),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        session_id: &str,
        workflow_id: WorkflowId,
    ) -> Result<(), SessionStoreError> {
        let now = Utc::now();
        self.sessions.write().await.insert(
            session_id.to_string(),
            SessionRecord {
                session_id: session_id.to_string(),
                workflow_id,
                status: SessionStatus::Processing,
                result: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn complete(
        &self,
        session_id: &str,
        trace: serde_json::Value,
    ) -> Result<(), SessionStoreError> {
        self.finalize(session_id, SessionStatus::Completed, trace)
            .await
    }

    async fn fail(&self, session_id: &str, message: &str) -> Result<(), SessionStoreError> {
        let payload = serde_json::json!({ "error": true, "message": message });
        self.finalize(session_id, SessionStatus::Error, payload)
            .await
    }

    async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(session_id).cloned()
    }
}
