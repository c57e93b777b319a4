//! `sweep check` - validate configuration and show resolved delays.

use anyhow::{Context, Result};
use std::path::Path;
use sweep_core::{Policy, SweepConfig};
use sweep_policy::builtin_policies;

pub fn execute(config_path: &Path) -> Result<()> {
    let config = SweepConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    println!("configuration OK: {}", config_path.display());
    if let Some(project) = &config.project {
        println!("project: {project}");
    }
    println!("actor: {}", config.actor);
    println!("entity scope: {}", config.retention.entity);
    println!();

    for policy in builtin_policies(&config.features) {
        let delete = resolved(&config, policy.delete_delay_key.as_deref());
        let anonymize = resolved(&config, policy.anonymize_delay_key.as_deref());
        println!(
            "  {:<24} delete={:<14} anonymize={}",
            policy.id,
            describe(delete),
            describe(anonymize)
        );
        warn_unused_rules(&policy, anonymize);
    }
    Ok(())
}

fn resolved(config: &SweepConfig, key: Option<&str>) -> i64 {
    key.map(|k| config.retention.months(k)).unwrap_or(0)
}

fn describe(months: i64) -> String {
    if months > 0 {
        format!("{months} month(s)")
    } else {
        "disabled".to_string()
    }
}

fn warn_unused_rules(policy: &Policy, anonymize_months: i64) {
    if anonymize_months <= 0 && !policy.field_rules.is_empty() {
        tracing::debug!(
            policy = %policy.id,
            "anonymize pass disabled, field rules unused"
        );
    }
}
