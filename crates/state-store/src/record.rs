//! Saga records and terminal status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::InstanceId;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The status of a saga run.
///
/// ```text
/// Running ──┬──► Succeeded
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaStatus {
    /// Steps are being executed.
    #[default]
    Running,

    /// All steps completed (terminal state).
    Succeeded,

    /// A step or the credential gate failed (terminal state).
    Failed,
}

impl SagaStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaStatus::Succeeded | SagaStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Running => "Running",
            SagaStatus::Succeeded => "Succeeded",
            SagaStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The persisted state of one saga run.
///
/// Single-writer: only the owning orchestrator task mutates a record, and
/// it commits the record to the store after every transition. Step outputs
/// are kept in step order so a partial failure still surfaces whatever
/// identifiers earlier steps produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaRecord {
    pub instance_id: InstanceId,
    pub saga_type: String,
    /// The step currently executing, or the last one that ran.
    pub current_step: Option<String>,
    pub step_outputs: BTreeMap<String, serde_json::Value>,
    pub status: SagaStatus,
    pub failure_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SagaRecord {
    /// Creates a running record for a new saga instance.
    pub fn new(instance_id: InstanceId, saga_type: impl Into<String>) -> Self {
        Self {
            instance_id,
            saga_type: saga_type.into(),
            current_step: None,
            step_outputs: BTreeMap::new(),
            status: SagaStatus::Running,
            failure_message: None,
            updated_at: Utc::now(),
        }
    }

    /// Marks a step as the one currently executing.
    pub fn begin_step(&mut self, step: impl Into<String>) {
        self.current_step = Some(step.into());
        self.updated_at = Utc::now();
    }

    /// Records a step's output.
    pub fn record_output<T: Serialize>(&mut self, step: &str, output: &T) -> Result<()> {
        self.step_outputs
            .insert(step.to_string(), serde_json::to_value(output)?);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transitions to the succeeded terminal state.
    pub fn succeed(&mut self) {
        self.status = SagaStatus::Succeeded;
        self.updated_at = Utc::now();
    }

    /// Transitions to the failed terminal state with a reason.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SagaStatus::Failed;
        self.failure_message = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// The human-readable progress string exposed to status queries.
    pub fn status_line(&self) -> String {
        match (&self.status, &self.current_step) {
            (SagaStatus::Running, Some(step)) => format!("running:{step}"),
            (SagaStatus::Running, None) => "running".to_string(),
            (status, _) => status.as_str().to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_running() {
        let record = SagaRecord::new(InstanceId::new(), "create-auction");
        assert_eq!(record.status, SagaStatus::Running);
        assert!(record.current_step.is_none());
        assert!(record.step_outputs.is_empty());
        assert_eq!(record.status_line(), "running");
    }

    #[test]
    fn step_lifecycle_accumulates_outputs() {
        let mut record = SagaRecord::new(InstanceId::new(), "create-auction");

        record.begin_step("create_collection");
        assert_eq!(record.status_line(), "running:create_collection");

        record
            .record_output("create_collection", &"collection-1")
            .unwrap();
        record.begin_step("verify_collection");
        record.record_output("verify_collection", &"sig-1").unwrap();

        assert_eq!(record.step_outputs.len(), 2);
        assert_eq!(
            record.step_outputs["create_collection"],
            serde_json::json!("collection-1")
        );
    }

    #[test]
    fn failure_preserves_earlier_outputs() {
        let mut record = SagaRecord::new(InstanceId::new(), "create-auction");
        record.begin_step("create_collection");
        record
            .record_output("create_collection", &"collection-1")
            .unwrap();
        record.begin_step("verify_collection");
        record.fail("collection verification failed");

        assert_eq!(record.status, SagaStatus::Failed);
        assert!(record.status.is_terminal());
        assert_eq!(
            record.failure_message.as_deref(),
            Some("collection verification failed")
        );
        assert!(record.step_outputs.contains_key("create_collection"));
        assert_eq!(record.status_line(), "failed");
    }

    #[test]
    fn terminal_states() {
        assert!(!SagaStatus::Running.is_terminal());
        assert!(SagaStatus::Succeeded.is_terminal());
        assert!(SagaStatus::Failed.is_terminal());
    }

    #[test]
    fn record_serialization_roundtrip() {
        let mut record = SagaRecord::new(InstanceId::new(), "refund");
        record.begin_step("gather_proofs");
        record.record_output("gather_proofs", &3u32).unwrap();
        record.succeed();

        let json = serde_json::to_string(&record).unwrap();
        let back: SagaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.instance_id, record.instance_id);
        assert_eq!(back.status, SagaStatus::Succeeded);
        assert_eq!(back.step_outputs["gather_proofs"], serde_json::json!(3));
    }
}
