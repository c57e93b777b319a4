use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Configuration types shared across all sweep crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{ConfigError, FeaturesConfig, RetentionConfig, SweepConfig, UpstreamConfig};

/// Entity families the retention engine can act on.
///
/// This is a closed set: every kind maps to a concrete table and a concrete
/// store implementation. Adding a new retainable entity family means adding a
/// variant here plus its catalog entries in `sweep-policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Customers, prospects and suppliers (`third_parties`).
    ThirdParty,
    /// Physical contact persons (`contacts`).
    Contact,
    /// Membership records (`members`).
    Member,
    /// Recruitment applications (`candidatures`).
    Candidature,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ThirdParty => "third_party",
            EntityKind::Contact => "contact",
            EntityKind::Member => "member",
            EntityKind::Candidature => "candidature",
        }
    }

    /// Primary table backing this entity family.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::ThirdParty => "third_parties",
            EntityKind::Contact => "contacts",
            EntityKind::Member => "members",
            EntityKind::Candidature => "candidatures",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two actions a policy can apply to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Delete,
    Anonymize,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Delete => "delete",
            ActionKind::Anonymize => "anonymize",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level anonymization rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Replace the value with `<field>-anon-<id>`.
    Anonymize,
    /// Replace `__ID__` in the template with the entity id and assign the
    /// result, but only when the field currently holds a non-empty value.
    Template(String),
    /// Assign the value as-is, unconditionally (e.g. `capital: 0`,
    /// `socialnetworks: []`).
    Set(serde_json::Value),
}

/// One retention policy: which rows of which entity family are selected, and
/// what is done to them.
///
/// Policies are configuration data, not code. The delay thresholds themselves
/// live in [`RetentionConfig`]; a policy only names the config keys so that
/// operators can tune (or disable) each action independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Stable policy key, e.g. `third_party_customer`.
    pub id: String,

    /// Category label for grouping in reports and listings.
    pub group: String,

    /// Entity family this policy targets.
    pub entity_kind: EntityKind,

    /// Config key resolving to the delete delay in months.
    /// Absent or resolving to <= 0 disables the delete pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_delay_key: Option<String>,

    /// Config key resolving to the anonymize delay in months.
    /// Absent or resolving to <= 0 disables the anonymize pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymize_delay_key: Option<String>,

    /// Candidate selection predicate with `__ENTITY__`, `__DELAY__` and
    /// `__NOW__` placeholders. Must yield one id column.
    pub selection_template: String,

    /// Delete-specific selection predicate. When absent, the general
    /// `selection_template` is reused for the delete pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_selection_template: Option<String>,

    /// Ordered field -> rule mapping applied during the anonymize pass.
    #[serde(default)]
    pub field_rules: Vec<(String, FieldRule)>,
}

impl Policy {
    /// Selection template to use for the given action.
    pub fn template_for(&self, action: ActionKind) -> &str {
        match action {
            ActionKind::Delete => self
                .delete_selection_template
                .as_deref()
                .unwrap_or(&self.selection_template),
            ActionKind::Anonymize => &self.selection_template,
        }
    }

    /// Delay config key for the given action, if the action is configured.
    pub fn delay_key(&self, action: ActionKind) -> Option<&str> {
        match action {
            ActionKind::Delete => self.delete_delay_key.as_deref(),
            ActionKind::Anonymize => self.anonymize_delay_key.as_deref(),
        }
    }
}

/// A fetched entity row: its id plus the current field values.
///
/// Every candidate gets its own freshly fetched record. Records are never
/// shared between candidates, so a partial mutation can't bleed into another
/// candidate's processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: i64,
    /// Field values keyed by column name. BTreeMap keeps iteration stable.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self {
            kind,
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: serde_json::Value) {
        self.fields.insert(field.into(), value);
    }

    /// A field is empty when it is absent, null, or the empty string.
    pub fn field_is_empty(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy(delete_template: Option<&str>) -> Policy {
        Policy {
            id: "third_party_customer".into(),
            group: "third_party".into(),
            entity_kind: EntityKind::ThirdParty,
            delete_delay_key: Some("third_party_customer_delete".into()),
            anonymize_delay_key: Some("third_party_customer_anonymize".into()),
            selection_template: "SELECT rowid FROM third_parties".into(),
            delete_selection_template: delete_template.map(str::to_string),
            field_rules: vec![("name".into(), FieldRule::Anonymize)],
        }
    }

    #[test]
    fn delete_template_falls_back_to_general_one() {
        let p = policy(None);
        assert_eq!(p.template_for(ActionKind::Delete), p.selection_template);

        let p = policy(Some("SELECT rowid FROM third_parties WHERE status = 0"));
        assert_eq!(
            p.template_for(ActionKind::Delete),
            "SELECT rowid FROM third_parties WHERE status = 0"
        );
        assert_eq!(
            p.template_for(ActionKind::Anonymize),
            "SELECT rowid FROM third_parties"
        );
    }

    #[test]
    fn field_emptiness() {
        let mut rec = EntityRecord::new(EntityKind::Contact, 7);
        rec.set("email", json!("alice@example.com"));
        rec.set("phone", json!(""));
        rec.set("note", json!(null));
        rec.set("capital", json!(0));

        assert!(!rec.field_is_empty("email"));
        assert!(rec.field_is_empty("phone"));
        assert!(rec.field_is_empty("note"));
        assert!(rec.field_is_empty("missing"));
        // numeric zero is a value, not an empty field
        assert!(!rec.field_is_empty("capital"));
    }

    #[test]
    fn policy_round_trips_through_yaml() {
        let p = policy(Some("SELECT rowid FROM third_parties WHERE status = 0"));
        let yaml = serde_yaml::to_string(&p).expect("policy must serialize");
        let back: Policy = serde_yaml::from_str(&yaml).expect("policy must deserialize");
        assert_eq!(back.id, p.id);
        assert_eq!(back.entity_kind, EntityKind::ThirdParty);
        assert_eq!(back.field_rules.len(), 1);
    }
}
