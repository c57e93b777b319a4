//! `sweep run` - execute one retention run.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use sweep_adapter_pg::PgStore;
use sweep_core::SweepConfig;
use sweep_engine::{RunCoordinator, RunStatus, SystemClock, TracingRunLog};
use sweep_policy::builtin_policies;

pub async fn execute(config_path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let config = SweepConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let policies = builtin_policies(&config.features);

    let store = PgStore::connect(&config.upstream)
        .await
        .context("connecting to database")?;

    let coordinator = RunCoordinator::new(
        store,
        Arc::new(SystemClock),
        TracingRunLog,
        config.retention.clone(),
        config.actor.clone(),
    )
    .dry_run(dry_run);

    let report = coordinator.run(&policies).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if report.status == RunStatus::RolledBack {
        bail!("run rolled back:\n{}", report.error_output());
    }

    if !json {
        println!("{}", report.output());
    }
    Ok(())
}
