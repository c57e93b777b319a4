//! Per-run audit trail.
//!
//! Every candidate decision is recorded through the [`RunLog`] seam. The
//! default sink forwards to `tracing`; tests use [`MemoryRunLog`] to assert
//! on the sequence of decisions.

use serde::Serialize;
use std::sync::Mutex;
use sweep_core::{ActionKind, EntityKind};
use uuid::Uuid;

/// One recorded decision within a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub run_id: Uuid,
    pub policy_id: String,
    pub entity_kind: EntityKind,
    pub action: ActionKind,
    /// Absent for selection-level failures.
    pub entity_id: Option<i64>,
    pub outcome: RunEventOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventOutcome {
    Deleted,
    Anonymized,
    /// Dependent records block the entity; not an error.
    SkippedDependent,
    /// The candidate selection query failed for this policy/action pass.
    SelectionFailed(String),
    /// The delete/update action failed for this candidate.
    Failed(String),
}

/// Sink boundary for run events. Implementations must not fail the run.
pub trait RunLog: Send + Sync {
    fn record(&self, event: RunEvent);
}

impl<T: RunLog + ?Sized> RunLog for std::sync::Arc<T> {
    fn record(&self, event: RunEvent) {
        (**self).record(event)
    }
}

/// Default sink: structured logging through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRunLog;

impl RunLog for TracingRunLog {
    fn record(&self, event: RunEvent) {
        match &event.outcome {
            RunEventOutcome::Deleted | RunEventOutcome::Anonymized => {
                tracing::info!(
                    run_id = %event.run_id,
                    policy = %event.policy_id,
                    kind = %event.entity_kind,
                    action = %event.action,
                    id = event.entity_id,
                    outcome = ?event.outcome,
                    "candidate processed"
                );
            }
            RunEventOutcome::SkippedDependent => {
                tracing::debug!(
                    run_id = %event.run_id,
                    policy = %event.policy_id,
                    kind = %event.entity_kind,
                    id = event.entity_id,
                    "candidate skipped, dependent records present"
                );
            }
            RunEventOutcome::SelectionFailed(msg) | RunEventOutcome::Failed(msg) => {
                tracing::warn!(
                    run_id = %event.run_id,
                    policy = %event.policy_id,
                    kind = %event.entity_kind,
                    action = %event.action,
                    id = event.entity_id,
                    error = %msg,
                    "candidate action failed"
                );
            }
        }
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryRunLog {
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("run log poisoned").clone()
    }
}

impl RunLog for MemoryRunLog {
    fn record(&self, event: RunEvent) {
        self.events.lock().expect("run log poisoned").push(event);
    }
}
