//! `sweep policies` - list the enabled policy catalog.

use anyhow::{Context, Result};
use std::path::Path;
use sweep_core::SweepConfig;
use sweep_policy::builtin_policies;

pub fn execute(config_path: &Path) -> Result<()> {
    let config = SweepConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let policies = builtin_policies(&config.features);
    println!("{} policies enabled:", policies.len());
    for policy in &policies {
        println!(
            "  {:<24} group={:<12} kind={:<12} rules={}",
            policy.id,
            policy.group,
            policy.entity_kind.as_str(),
            policy.field_rules.len()
        );
    }
    Ok(())
}
