//! `sync` command implementation.

use anyhow::{Context, Result};
use calib_sync_cli::{Pipeline, PipelineConfig};
use contracts::{DatasetBlueprint, SyncMode};
use tracing::{info, warn};

use crate::cli::SyncArgs;

/// Execute the `sync` command
pub async fn run_sync(args: &SyncArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        mode = ?blueprint.sync.mode,
        cameras = blueprint.cameras.len(),
        detected_only = blueprint.sync.detected_only,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                bundles = stats.report.bundles,
                duration_secs = stats.duration.as_secs_f64(),
                "Synchronization completed successfully"
            );
            stats.print_summary();
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping before all bundles were written");
        }
    }

    Ok(())
}

/// Apply CLI overrides, re-checking the camera count for stereo modes
fn apply_overrides(blueprint: &mut DatasetBlueprint, args: &SyncArgs) -> Result<()> {
    if let Some(mode) = args.mode {
        let mode = SyncMode::from(mode);
        info!(mode = ?mode, "Overriding sync mode from CLI");
        if let Some(required) = mode.required_cameras() {
            if blueprint.cameras.len() != required {
                return Err(contracts::ContractError::count_mismatch(
                    required,
                    blueprint.cameras.len(),
                ))
                .context("Sync mode override does not fit the configured cameras");
            }
        }
        blueprint.sync.mode = mode;
    }
    if args.include_undetected {
        info!("Loading records without detections");
        blueprint.sync.detected_only = false;
    }
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &DatasetBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sync mode: {:?}", blueprint.sync.mode);
    println!("Detected only: {}", blueprint.sync.detected_only);
    println!(
        "Target: {}x{} tags, {} m",
        blueprint.target.tag_rows, blueprint.target.tag_cols, blueprint.target.tag_size
    );
    println!("\nCameras ({}):", blueprint.cameras.len());
    for camera in &blueprint.cameras {
        println!("  - {} -> {}", camera.id, camera.data_dir.display());
    }
    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }
    println!();
}
