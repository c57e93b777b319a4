//! Per-candidate action execution.
//!
//! Isolated from the coordinator's looping so the fetch/check/mutate
//! sequence can be exercised on its own. Failures never propagate as `Err`;
//! the caller folds every outcome into the run state and decides
//! commit-vs-rollback at the end.

use sweep_core::{ActionKind, EntityKind, Policy};
use sweep_policy::apply_field_rules;

use crate::store::EntityStore;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Deleted,
    Anonymized,
    /// Dependent records block the entity, skip without error.
    SkippedDependent,
    /// The action failed; the message names action, kind, id and cause.
    Failed(String),
}

/// Process one candidate id for one policy and action.
///
/// The entity is fetched fresh immediately before mutation, and the
/// dependent-record check runs against that freshest state. Zero affected
/// rows counts as a failure.
pub async fn process_candidate(
    store: &dyn EntityStore,
    policy: &Policy,
    action: ActionKind,
    id: i64,
    actor: &str,
) -> CandidateOutcome {
    let kind = policy.entity_kind;

    let mut record = match store.fetch(kind, id).await {
        Ok(record) => record,
        Err(e) => return CandidateOutcome::Failed(failure(action, kind, id, &e.to_string())),
    };

    match store.is_referenced(kind, id).await {
        Ok(true) => return CandidateOutcome::SkippedDependent,
        Ok(false) => {}
        Err(e) => return CandidateOutcome::Failed(failure(action, kind, id, &e.to_string())),
    }

    match action {
        ActionKind::Delete => match store.delete(kind, id, actor).await {
            Ok(affected) if affected > 0 => CandidateOutcome::Deleted,
            Ok(_) => CandidateOutcome::Failed(failure(action, kind, id, "no rows affected")),
            Err(e) => CandidateOutcome::Failed(failure(action, kind, id, &e.to_string())),
        },
        ActionKind::Anonymize => {
            apply_field_rules(&mut record, &policy.field_rules);
            match store.update(&record, actor).await {
                Ok(affected) if affected > 0 => CandidateOutcome::Anonymized,
                Ok(_) => CandidateOutcome::Failed(failure(action, kind, id, "no rows affected")),
                Err(e) => CandidateOutcome::Failed(failure(action, kind, id, &e.to_string())),
            }
        }
    }
}

fn failure(action: ActionKind, kind: EntityKind, id: i64, cause: &str) -> String {
    format!("{action} of {kind} {id} failed: {cause}")
}
