//! Postgres implementation of the engine's [`EntityStore`].
//!
//! One `PgStore` serves every entity kind; per-kind differences (table,
//! anonymizable columns, blocking child tables) live in a static metadata
//! table rather than per-kind handler types. The run's single logical
//! transaction is a real Postgres transaction held for the duration of the
//! run; dropping the store without commit lets Postgres roll it back.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Arguments, Postgres, Transaction};
use sweep_core::{EntityKind, EntityRecord, UpstreamConfig};
use sweep_engine::{EntityStore, StoreError};
use tokio::sync::Mutex;

/// Per-kind table metadata.
struct EntityMeta {
    table: &'static str,
    /// Columns fetched for (and writable by) anonymization.
    columns: &'static [&'static str],
    /// Child tables whose rows block mutation: (table, fk column).
    children: &'static [(&'static str, &'static str)],
}

fn meta(kind: EntityKind) -> &'static EntityMeta {
    match kind {
        EntityKind::ThirdParty => &EntityMeta {
            table: "third_parties",
            columns: &[
                "name",
                "name_alias",
                "address",
                "town",
                "email",
                "url",
                "phone",
                "fax",
                "capital",
                "socialnetworks",
                "note_private",
                "note_public",
            ],
            children: &[
                ("invoices", "fk_third_party"),
                ("supplier_invoices", "fk_third_party"),
                ("orders", "fk_third_party"),
                ("proposals", "fk_third_party"),
            ],
        },
        EntityKind::Contact => &EntityMeta {
            table: "contacts",
            columns: &[
                "lastname",
                "firstname",
                "address",
                "town",
                "email",
                "phone_pro",
                "phone_mobile",
                "socialnetworks",
                "note_private",
                "note_public",
            ],
            children: &[("invoice_contacts", "fk_contact")],
        },
        EntityKind::Member => &EntityMeta {
            table: "members",
            columns: &[
                "lastname",
                "firstname",
                "address",
                "town",
                "email",
                "phone",
                "phone_mobile",
                "socialnetworks",
                "note_private",
            ],
            children: &[("subscriptions", "fk_member")],
        },
        EntityKind::Candidature => &EntityMeta {
            table: "candidatures",
            columns: &[
                "lastname",
                "firstname",
                "email",
                "phone",
                "email_msgid",
                "remuneration_requested",
            ],
            children: &[],
        },
    }
}

/// Postgres-backed entity store.
pub struct PgStore {
    pool: sqlx::PgPool,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgStore {
    /// Connect using the configured URL.
    pub async fn connect(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let url = config.resolve_url().ok_or_else(|| {
            anyhow::anyhow!("no database URL configured (database_url or database_url_env)")
        })?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&url)
            .await?;
        Ok(Self {
            pool,
            tx: Mutex::new(None),
        })
    }
}

fn bind_value(args: &mut PgArguments, value: &Value) -> Result<(), StoreError> {
    let result = match value {
        Value::Null => args.add(Option::<String>::None),
        Value::Bool(b) => args.add(*b),
        Value::String(s) => args.add(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                args.add(i)
            } else if let Some(f) = n.as_f64() {
                args.add(f)
            } else {
                args.add(n.to_string())
            }
        }
        // arrays/objects land in json(b) columns
        other => args.add(sqlx::types::Json(other.clone())),
    };
    result.map_err(|e| StoreError::Database(e.to_string()))
}

/// Build the UPDATE statement and its arguments for a record.
///
/// Only columns declared in the metadata are written, in declaration order,
/// so a record can't smuggle writes into unrelated columns.
fn build_update(
    meta: &EntityMeta,
    record: &EntityRecord,
    actor: &str,
) -> Result<(String, PgArguments), StoreError> {
    let mut args = PgArguments::default();
    let mut sets = Vec::new();
    let mut n = 1;

    for column in meta.columns {
        let Some(value) = record.get(column) else {
            continue;
        };
        bind_value(&mut args, value)?;
        sets.push(format!("{column} = ${n}"));
        n += 1;
    }

    args.add(actor.to_string())
        .map_err(|e| StoreError::Database(e.to_string()))?;
    sets.push(format!("modified_by = ${n}"));
    n += 1;

    args.add(record.id)
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let sql = format!(
        "UPDATE {} SET {}, tms = now() WHERE rowid = ${n}",
        meta.table,
        sets.join(", ")
    );
    Ok((sql, args))
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        if guard.is_some() {
            return Err(StoreError::Database("transaction already active".into()));
        }
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        *guard = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.take().ok_or(StoreError::NoTransaction)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.take().ok_or(StoreError::NoTransaction)?;
        tx.rollback()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn query_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::NoTransaction)?;
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn fetch(&self, kind: EntityKind, id: i64) -> Result<EntityRecord, StoreError> {
        let meta = meta(kind);
        let sql = format!(
            "SELECT row_to_json(x) FROM (SELECT {} FROM {} WHERE rowid = $1) x",
            meta.columns.join(", "),
            meta.table
        );

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::NoTransaction)?;
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some(Value::Object(fields)) = row else {
            return Err(StoreError::NotFound { kind, id });
        };

        let mut record = EntityRecord::new(kind, id);
        for (column, value) in fields {
            record.set(column, value);
        }
        Ok(record)
    }

    async fn update(&self, record: &EntityRecord, actor: &str) -> Result<u64, StoreError> {
        let (sql, args) = build_update(meta(record.kind), record, actor)?;

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::NoTransaction)?;
        let result = sqlx::query_with(&sql, args)
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, kind: EntityKind, id: i64, actor: &str) -> Result<u64, StoreError> {
        let table = meta(kind).table;
        tracing::debug!(kind = %kind, id, actor, "deleting entity");

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::NoTransaction)?;
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE rowid = $1"))
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn is_referenced(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError> {
        let meta = meta(kind);
        if meta.children.is_empty() {
            return Ok(false);
        }

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::NoTransaction)?;
        for (child, fk) in meta.children {
            let sql = format!("SELECT EXISTS (SELECT 1 FROM {child} WHERE {fk} = $1)");
            let exists: bool = sqlx::query_scalar(&sql)
                .bind(id)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;
            if exists {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_writes_only_declared_columns_in_order() {
        let mut record = EntityRecord::new(EntityKind::Candidature, 11);
        record.set("email", json!("anonymous+11@example.invalid"));
        record.set("phone", json!(""));
        record.set("rogue_column", json!("nope"));

        let (sql, _args) = build_update(meta(EntityKind::Candidature), &record, "system:sweep")
            .expect("update must build");
        assert_eq!(
            sql,
            "UPDATE candidatures SET email = $1, phone = $2, modified_by = $3, \
             tms = now() WHERE rowid = $4"
        );
        assert!(!sql.contains("rogue_column"));
    }

    #[test]
    fn kinds_without_children_never_block() {
        assert!(meta(EntityKind::Candidature).children.is_empty());
        assert!(!meta(EntityKind::Member).children.is_empty());
    }
}
