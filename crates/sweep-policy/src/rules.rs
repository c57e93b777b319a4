//! Field-level anonymization transform.
//!
//! Applying rules to a record is a pure in-memory mutation; persistence is
//! the store's job. Rules are applied in catalog order.

use serde_json::Value;
use sweep_core::{EntityRecord, FieldRule};

/// Apply an ordered set of field rules to a freshly fetched record.
///
/// - [`FieldRule::Anonymize`] always overwrites with `<field>-anon-<id>`.
/// - [`FieldRule::Template`] substitutes `__ID__` and assigns only when the
///   field currently holds a non-empty value; previously-empty fields are
///   left untouched so anonymization never fabricates data.
/// - [`FieldRule::Set`] assigns the configured value unconditionally.
pub fn apply_field_rules(record: &mut EntityRecord, rules: &[(String, FieldRule)]) {
    for (field, rule) in rules {
        match rule {
            FieldRule::Anonymize => {
                let value = format!("{}-anon-{}", field, record.id);
                record.set(field.clone(), Value::String(value));
            }
            FieldRule::Template(template) => {
                if record.field_is_empty(field) {
                    continue;
                }
                let id = if record.id > 0 {
                    record.id.to_string()
                } else {
                    "0".to_string()
                };
                record.set(field.clone(), Value::String(template.replace("__ID__", &id)));
            }
            FieldRule::Set(value) => {
                record.set(field.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sweep_core::EntityKind;

    fn record(id: i64) -> EntityRecord {
        let mut rec = EntityRecord::new(EntityKind::Contact, id);
        rec.set("name", json!("Alice Smith"));
        rec.set("email", json!("alice@x.com"));
        rec.set("phone", json!("+33 1 23 45 67 89"));
        rec.set("note", json!(""));
        rec
    }

    #[test]
    fn anonymize_rule_builds_field_anon_id() {
        let mut rec = record(42);
        apply_field_rules(&mut rec, &[("name".into(), FieldRule::Anonymize)]);
        assert_eq!(rec.get("name"), Some(&json!("name-anon-42")));
    }

    #[test]
    fn template_rule_substitutes_id_when_non_empty() {
        let mut rec = record(7);
        apply_field_rules(
            &mut rec,
            &[(
                "email".into(),
                FieldRule::Template("anonymous+__ID__@example.com".into()),
            )],
        );
        assert_eq!(rec.get("email"), Some(&json!("anonymous+7@example.com")));
    }

    #[test]
    fn template_rule_leaves_empty_field_untouched() {
        let mut rec = record(7);
        apply_field_rules(
            &mut rec,
            &[(
                "note".into(),
                FieldRule::Template("anonymized-__ID__".into()),
            )],
        );
        assert_eq!(rec.get("note"), Some(&json!("")));
    }

    #[test]
    fn template_rule_uses_zero_for_non_positive_id() {
        let mut rec = record(0);
        apply_field_rules(
            &mut rec,
            &[(
                "email".into(),
                FieldRule::Template("anonymous+__ID__@example.com".into()),
            )],
        );
        assert_eq!(rec.get("email"), Some(&json!("anonymous+0@example.com")));
    }

    #[test]
    fn set_rule_assigns_unconditionally() {
        let mut rec = record(9);
        apply_field_rules(
            &mut rec,
            &[
                ("phone".into(), FieldRule::Set(json!(""))),
                ("capital".into(), FieldRule::Set(json!(0))),
                ("socialnetworks".into(), FieldRule::Set(json!([]))),
            ],
        );
        assert_eq!(rec.get("phone"), Some(&json!("")));
        assert_eq!(rec.get("capital"), Some(&json!(0)));
        assert_eq!(rec.get("socialnetworks"), Some(&json!([])));
    }

    #[test]
    fn rules_apply_in_order() {
        let mut rec = record(3);
        apply_field_rules(
            &mut rec,
            &[
                ("name".into(), FieldRule::Anonymize),
                ("name".into(), FieldRule::Set(json!("gone"))),
            ],
        );
        assert_eq!(rec.get("name"), Some(&json!("gone")));
    }
}
