use crate::error::SessionStoreError;
use crate::workflow::WorkflowId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Processing,
    Completed,
    Error,
}

/// Durable record of one asynchronous execution, keyed by its session
/// token. `result` holds the serialized trace once completed, or
/// `{"error": true, "message": ...}` once failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub workflow_id: WorkflowId,
    pub status: SessionStatus,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key-value store backing the polled status protocol.
///
/// A session is written at most twice: created in `processing`, then
/// finalized exactly once via `complete` or `fail`. A finalized session
/// never reverts, and stays queryable by token alone even after its
/// workflow is deleted.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(
        &self,
        session_id: &str,
        workflow_id: WorkflowId,
    ) -> Result<(), SessionStoreError>;

    async fn complete(
        &self,
        session_id: &str,
        trace: serde_json::Value,
    ) -> Result<(), SessionStoreError>;

    async fn fail(&self, session_id: &str, message: &str) -> Result<(), SessionStoreError>;

    async fn get(&self, session_id: &str) -> Option<SessionRecord>;
}
