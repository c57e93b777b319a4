//! The run coordinator.
//!
//! A linear state machine: `NotStarted -> Running -> Committed | RolledBack`.
//! One logical transaction spans the whole run. Per policy, the delete pass
//! always precedes the anonymize pass, so a row qualifying for both is
//! deleted rather than anonymized and orphaned. A `(kind, id)` pair acted on
//! once is never acted on again within the run, whichever policy or action
//! would otherwise match it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use sweep_core::{ActionKind, EntityKind, Policy, RetentionConfig};
use thiserror::Error;
use uuid::Uuid;

use crate::audit::{RunEvent, RunEventOutcome, RunLog};
use crate::clock::Clock;
use crate::executor::{self, CandidateOutcome};
use crate::selector;
use crate::store::{EntityStore, StoreError};

/// Errors that abort a run outright. Selection and action failures are
/// accumulated into the report instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to begin run transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("failed to commit run: {0}")]
    Commit(#[source] StoreError),

    #[error("failed to roll back run: {0}")]
    Rollback(#[source] StoreError),
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Committed,
    RolledBack,
}

/// Final report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The commit decision. Under `dry_run` the store is always rolled back
    /// physically; this still reports what a real run would have decided.
    pub status: RunStatus,
    pub updated: u64,
    pub deleted: u64,
    pub errors: Vec<String>,
    pub dry_run: bool,
}

impl RunReport {
    /// 0 on commit, 1 on rollback; consumable by a cron runner.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Committed => 0,
            RunStatus::RolledBack => 1,
        }
    }

    /// Success summary line.
    pub fn output(&self) -> String {
        format!(
            "{} record(s) anonymized, {} record(s) deleted.",
            self.updated, self.deleted
        )
    }

    /// Newline-joined accumulated error messages.
    pub fn error_output(&self) -> String {
        self.errors.join("\n")
    }
}

/// Mutable state scoped to one run; created at start, consumed into the
/// report, never persisted.
#[derive(Debug, Default)]
struct RunState {
    processed: BTreeSet<(EntityKind, i64)>,
    updated: u64,
    deleted: u64,
    errors: Vec<String>,
}

/// Orchestrates one full retention run.
pub struct RunCoordinator<S: EntityStore, L: RunLog> {
    store: S,
    clock: Arc<dyn Clock>,
    log: L,
    retention: RetentionConfig,
    actor: String,
    dry_run: bool,
}

impl<S: EntityStore, L: RunLog> RunCoordinator<S, L> {
    pub fn new(
        store: S,
        clock: Arc<dyn Clock>,
        log: L,
        retention: RetentionConfig,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            log,
            retention,
            actor: actor.into(),
            dry_run: false,
        }
    }

    /// Roll back unconditionally at the end, whatever the outcome.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute the whole batch over the given policies, in order.
    pub async fn run(&self, policies: &[Policy]) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();
        tracing::info!(
            %run_id,
            policies = policies.len(),
            dry_run = self.dry_run,
            "starting retention run"
        );

        self.store.begin().await.map_err(RunError::Begin)?;

        let mut state = RunState::default();
        for policy in policies {
            // Hard ordering requirement: delete before anonymize, per
            // policy, before moving to the next policy.
            for action in [ActionKind::Delete, ActionKind::Anonymize] {
                self.run_pass(run_id, policy, action, started_at, &mut state)
                    .await;
            }
        }

        let status = if state.errors.is_empty() {
            RunStatus::Committed
        } else {
            RunStatus::RolledBack
        };

        if status == RunStatus::Committed && !self.dry_run {
            self.store.commit().await.map_err(RunError::Commit)?;
        } else {
            self.store.rollback().await.map_err(RunError::Rollback)?;
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: self.clock.now(),
            status,
            updated: state.updated,
            deleted: state.deleted,
            errors: state.errors,
            dry_run: self.dry_run,
        };

        match report.status {
            RunStatus::Committed => {
                tracing::info!(%run_id, updated = report.updated, deleted = report.deleted, "run committed");
            }
            RunStatus::RolledBack => {
                tracing::warn!(%run_id, errors = report.errors.len(), "run rolled back");
            }
        }

        Ok(report)
    }

    /// One pass (delete or anonymize) of one policy.
    async fn run_pass(
        &self,
        run_id: Uuid,
        policy: &Policy,
        action: ActionKind,
        now: DateTime<Utc>,
        state: &mut RunState,
    ) {
        let Some(delay_key) = policy.delay_key(action) else {
            return;
        };
        let delay = self.retention.months(delay_key);
        if delay <= 0 {
            // Action disabled: selection is never invoked.
            return;
        }

        let candidates = match selector::select(
            &self.store,
            policy,
            action,
            self.retention.entity,
            delay,
            now,
        )
        .await
        {
            Ok(ids) => ids,
            Err(e) => {
                let message = format!(
                    "candidate selection failed for policy '{}' ({action}): {e}",
                    policy.id
                );
                self.log.record(RunEvent {
                    run_id,
                    policy_id: policy.id.clone(),
                    entity_kind: policy.entity_kind,
                    action,
                    entity_id: None,
                    outcome: RunEventOutcome::SelectionFailed(message.clone()),
                });
                state.errors.push(message);
                return;
            }
        };

        for id in candidates {
            let key = (policy.entity_kind, id);
            if state.processed.contains(&key) {
                continue;
            }

            let outcome =
                executor::process_candidate(&self.store, policy, action, id, &self.actor).await;

            let event_outcome = match &outcome {
                CandidateOutcome::Deleted => {
                    state.deleted += 1;
                    state.processed.insert(key);
                    RunEventOutcome::Deleted
                }
                CandidateOutcome::Anonymized => {
                    state.updated += 1;
                    state.processed.insert(key);
                    RunEventOutcome::Anonymized
                }
                CandidateOutcome::SkippedDependent => {
                    // Not counted, not an error, not marked processed.
                    RunEventOutcome::SkippedDependent
                }
                CandidateOutcome::Failed(message) => {
                    state.errors.push(message.clone());
                    RunEventOutcome::Failed(message.clone())
                }
            };

            self.log.record(RunEvent {
                run_id,
                policy_id: policy.id.clone(),
                entity_kind: policy.entity_kind,
                action,
                entity_id: Some(id),
                outcome: event_outcome,
            });
        }
    }
}
