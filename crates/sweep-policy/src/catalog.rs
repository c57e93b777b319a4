//! Built-in policy catalog.
//!
//! One entry per entity family and commercial nature. The catalog is a pure
//! function of the enabled feature areas: disabled areas are omitted, never
//! an error. The returned order is the processing order of a run.
//!
//! Selection templates carry three placeholders substituted at run time:
//! `__ENTITY__` (tenant scope), `__DELAY__` (months) and `__NOW__` (the run
//! timestamp as a store literal). Each template must project exactly one id
//! column. The recurring shape is: the row's last modification is older than
//! the cutoff, no activity record touches it after the cutoff, and hard-stop
//! links (invoices, payments) do not exist at all.

use serde_json::json;
use sweep_core::{EntityKind, FeaturesConfig, FieldRule, Policy};

const ANON_EMAIL: &str = "anonymous+__ID__@example.invalid";

/// Produce the ordered list of built-in policies for the enabled features.
pub fn builtin_policies(features: &FeaturesConfig) -> Vec<Policy> {
    let mut policies = vec![
        third_party_customer(),
        third_party_prospect(),
        third_party_supplier(),
        contact(),
    ];

    if features.members {
        policies.push(member());
    } else {
        tracing::debug!("members feature disabled, member policies omitted");
    }

    if features.recruitment {
        policies.push(candidature());
    } else {
        tracing::debug!("recruitment feature disabled, candidature policies omitted");
    }

    policies
}

fn third_party_field_rules() -> Vec<(String, FieldRule)> {
    vec![
        ("name".into(), FieldRule::Anonymize),
        ("name_alias".into(), FieldRule::Anonymize),
        ("address".into(), FieldRule::Anonymize),
        ("town".into(), FieldRule::Anonymize),
        ("email".into(), FieldRule::Template(ANON_EMAIL.into())),
        ("url".into(), FieldRule::Set(json!(""))),
        ("phone".into(), FieldRule::Set(json!(""))),
        ("fax".into(), FieldRule::Set(json!(""))),
        ("capital".into(), FieldRule::Set(json!(0))),
        ("socialnetworks".into(), FieldRule::Set(json!([]))),
        ("note_private".into(), FieldRule::Set(json!(""))),
        ("note_public".into(), FieldRule::Set(json!(""))),
    ]
}

fn third_party_template(nature_predicate: &str) -> String {
    format!(
        "SELECT t.rowid FROM third_parties t \
         WHERE t.entity = __ENTITY__ AND {nature_predicate} \
           AND t.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month' \
           AND NOT EXISTS (SELECT 1 FROM agenda_events a \
                            WHERE a.element_type = 'third_party' AND a.fk_element = t.rowid \
                              AND a.tms >= TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month') \
           AND NOT EXISTS (SELECT 1 FROM invoices f WHERE f.fk_third_party = t.rowid) \
           AND NOT EXISTS (SELECT 1 FROM orders c WHERE c.fk_third_party = t.rowid)"
    )
}

fn third_party_customer() -> Policy {
    Policy {
        id: "third_party_customer".into(),
        group: "third_party".into(),
        entity_kind: EntityKind::ThirdParty,
        delete_delay_key: Some("third_party_customer_delete".into()),
        anonymize_delay_key: Some("third_party_customer_anonymize".into()),
        selection_template: third_party_template("t.client IN (1, 3)"),
        delete_selection_template: None,
        field_rules: third_party_field_rules(),
    }
}

fn third_party_prospect() -> Policy {
    Policy {
        id: "third_party_prospect".into(),
        group: "third_party".into(),
        entity_kind: EntityKind::ThirdParty,
        delete_delay_key: Some("third_party_prospect_delete".into()),
        anonymize_delay_key: Some("third_party_prospect_anonymize".into()),
        selection_template: third_party_template("t.client = 2"),
        delete_selection_template: None,
        field_rules: third_party_field_rules(),
    }
}

fn third_party_supplier() -> Policy {
    Policy {
        id: "third_party_supplier".into(),
        group: "third_party".into(),
        entity_kind: EntityKind::ThirdParty,
        delete_delay_key: Some("third_party_supplier_delete".into()),
        anonymize_delay_key: Some("third_party_supplier_anonymize".into()),
        selection_template: third_party_template("t.supplier = 1")
            .replace(
                "FROM invoices f WHERE f.fk_third_party",
                "FROM supplier_invoices f WHERE f.fk_third_party",
            ),
        delete_selection_template: None,
        field_rules: third_party_field_rules(),
    }
}

fn contact() -> Policy {
    Policy {
        id: "contact".into(),
        group: "contact".into(),
        entity_kind: EntityKind::Contact,
        delete_delay_key: Some("contact_delete".into()),
        anonymize_delay_key: Some("contact_anonymize".into()),
        selection_template: "SELECT c.rowid FROM contacts c \
             WHERE c.entity = __ENTITY__ \
               AND c.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month' \
               AND NOT EXISTS (SELECT 1 FROM agenda_events a \
                                WHERE a.fk_contact = c.rowid \
                                  AND a.tms >= TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month') \
               AND NOT EXISTS (SELECT 1 FROM invoice_contacts ic WHERE ic.fk_contact = c.rowid)"
            .into(),
        delete_selection_template: None,
        field_rules: vec![
            ("lastname".into(), FieldRule::Anonymize),
            ("firstname".into(), FieldRule::Anonymize),
            ("address".into(), FieldRule::Anonymize),
            ("town".into(), FieldRule::Anonymize),
            ("email".into(), FieldRule::Template(ANON_EMAIL.into())),
            ("phone_pro".into(), FieldRule::Set(json!(""))),
            ("phone_mobile".into(), FieldRule::Set(json!(""))),
            ("socialnetworks".into(), FieldRule::Set(json!([]))),
            ("note_private".into(), FieldRule::Set(json!(""))),
            ("note_public".into(), FieldRule::Set(json!(""))),
        ],
    }
}

fn member() -> Policy {
    Policy {
        id: "member".into(),
        group: "membership".into(),
        entity_kind: EntityKind::Member,
        delete_delay_key: Some("member_delete".into()),
        anonymize_delay_key: Some("member_anonymize".into()),
        selection_template: "SELECT m.rowid FROM members m \
             WHERE m.entity = __ENTITY__ \
               AND m.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month' \
               AND NOT EXISTS (SELECT 1 FROM subscriptions s \
                                WHERE s.fk_member = m.rowid \
                                  AND s.date_end >= TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month') \
               AND NOT EXISTS (SELECT 1 FROM subscription_payments p WHERE p.fk_member = m.rowid)"
            .into(),
        delete_selection_template: None,
        field_rules: vec![
            ("lastname".into(), FieldRule::Anonymize),
            ("firstname".into(), FieldRule::Anonymize),
            ("address".into(), FieldRule::Anonymize),
            ("town".into(), FieldRule::Anonymize),
            ("email".into(), FieldRule::Template(ANON_EMAIL.into())),
            ("phone".into(), FieldRule::Set(json!(""))),
            ("phone_mobile".into(), FieldRule::Set(json!(""))),
            ("socialnetworks".into(), FieldRule::Set(json!([]))),
            ("note_private".into(), FieldRule::Set(json!(""))),
        ],
    }
}

fn candidature() -> Policy {
    Policy {
        id: "candidature".into(),
        group: "recruitment".into(),
        entity_kind: EntityKind::Candidature,
        delete_delay_key: Some("candidature_delete".into()),
        anonymize_delay_key: Some("candidature_anonymize".into()),
        selection_template: "SELECT r.rowid FROM candidatures r \
             WHERE r.entity = __ENTITY__ \
               AND r.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month'"
            .into(),
        // Only applications already out of the pipeline are deleted; open
        // ones are at most anonymized.
        delete_selection_template: Some(
            "SELECT r.rowid FROM candidatures r \
             WHERE r.entity = __ENTITY__ AND r.status IN (8, 9) \
               AND r.tms < TIMESTAMP '__NOW__' - INTERVAL '__DELAY__ month'"
                .into(),
        ),
        field_rules: vec![
            ("lastname".into(), FieldRule::Anonymize),
            ("firstname".into(), FieldRule::Anonymize),
            ("email".into(), FieldRule::Template(ANON_EMAIL.into())),
            ("phone".into(), FieldRule::Set(json!(""))),
            ("email_msgid".into(), FieldRule::Set(json!(""))),
            ("remuneration_requested".into(), FieldRule::Set(json!(0))),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::ActionKind;

    #[test]
    fn catalog_is_deterministic_and_feature_gated() {
        let base = builtin_policies(&FeaturesConfig::default());
        assert_eq!(base.len(), 4);
        assert_eq!(base[0].id, "third_party_customer");
        assert_eq!(base[3].id, "contact");

        let all = builtin_policies(&FeaturesConfig {
            members: true,
            recruitment: true,
        });
        assert_eq!(all.len(), 6);
        assert_eq!(all[4].id, "member");
        assert_eq!(all[5].id, "candidature");

        // same inputs, same order
        let again = builtin_policies(&FeaturesConfig::default());
        let ids: Vec<_> = base.iter().map(|p| p.id.as_str()).collect();
        let ids_again: Vec<_> = again.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn templates_carry_all_placeholders() {
        for policy in builtin_policies(&FeaturesConfig {
            members: true,
            recruitment: true,
        }) {
            for action in [ActionKind::Delete, ActionKind::Anonymize] {
                let template = policy.template_for(action);
                assert!(
                    template.contains("__ENTITY__"),
                    "{} {} template misses __ENTITY__",
                    policy.id,
                    action
                );
                assert!(
                    template.contains("__DELAY__"),
                    "{} {} template misses __DELAY__",
                    policy.id,
                    action
                );
                assert!(
                    template.contains("__NOW__"),
                    "{} {} template misses __NOW__",
                    policy.id,
                    action
                );
            }
        }
    }

    #[test]
    fn supplier_policy_hard_stops_on_supplier_invoices() {
        let supplier = third_party_supplier();
        assert!(supplier.selection_template.contains("supplier_invoices"));
        assert!(!supplier.selection_template.contains("FROM invoices"));
    }

    #[test]
    fn candidature_delete_template_is_status_scoped() {
        let policy = candidature();
        let delete = policy.template_for(ActionKind::Delete);
        assert!(delete.contains("status IN (8, 9)"));
        assert!(!policy.template_for(ActionKind::Anonymize).contains("status"));
    }
}
