//! Candidate selection.
//!
//! Renders a policy's selection template against the current run parameters
//! and executes it through the store. Query failure surfaces as an error so
//! the caller can tell it apart from an empty candidate set.

use chrono::{DateTime, Utc};
use sweep_core::{ActionKind, Policy};

use crate::store::{EntityStore, StoreError};

/// Timestamp literal format substituted for `__NOW__`.
const NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Substitute `__ENTITY__`, `__DELAY__` and `__NOW__` in a selection
/// template. Substitution is textual, mirroring the template contract.
pub fn render_template(
    template: &str,
    entity: i64,
    delay_months: i64,
    now: DateTime<Utc>,
) -> String {
    template
        .replace("__ENTITY__", &entity.to_string())
        .replace("__DELAY__", &delay_months.to_string())
        .replace("__NOW__", &now.format(NOW_FORMAT).to_string())
}

/// Select candidate ids for one policy and action.
pub async fn select(
    store: &dyn EntityStore,
    policy: &Policy,
    action: ActionKind,
    entity: i64,
    delay_months: i64,
    now: DateTime<Utc>,
) -> Result<Vec<i64>, StoreError> {
    let sql = render_template(policy.template_for(action), entity, delay_months, now);
    tracing::debug!(policy = %policy.id, action = %action, "selecting candidates");
    store.query_ids(&sql).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn render_substitutes_every_placeholder() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let rendered = render_template(
            "SELECT t.rowid FROM third_parties t WHERE t.entity = __ENTITY__ \
             AND t.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month'",
            1,
            12,
            now,
        );
        assert_eq!(
            rendered,
            "SELECT t.rowid FROM third_parties t WHERE t.entity = 1 \
             AND t.tms < TIMESTAMP '2026-03-14 09:26:53' - INTERVAL '12 month'"
        );
    }

    #[test]
    fn render_replaces_repeated_placeholders() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rendered = render_template("__DELAY__/__DELAY__", 1, 6, now);
        assert_eq!(rendered, "6/6");
    }
}
