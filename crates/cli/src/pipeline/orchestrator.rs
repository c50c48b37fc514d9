//! Pipeline orchestrator - coordinates all components.
//!
//! Loads every camera stream named by the blueprint, runs the synchronizer
//! selected by `sync.mode` and dispatches the bundles to the configured
//! sinks.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ContractError, DatasetBlueprint, SyncMode, SyncedDataset};
use dispatcher::create_dispatcher;
use ingestion::StreamLoader;
use observability::{record_bundle, record_sync_report, SyncMetricsAggregator};
use tracing::{info, instrument, warn};

use super::{CalibDataLoader, PipelineStats};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The dataset blueprint
    pub blueprint: DatasetBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Load and synchronize the blueprint's cameras.
    pub fn synchronize(&self) -> Result<SyncedDataset, ContractError> {
        let blueprint = &self.config.blueprint;
        let loader = CalibDataLoader::new(StreamLoader::detected_only(blueprint.sync.detected_only))
            .with_cameras(blueprint.camera_ids());
        let dirs = blueprint.data_dirs();

        match blueprint.sync.mode.stereo_config() {
            Some(config) => match dirs.as_slice() {
                [dir0, dir1] => loader.load_stereo(dir0, dir1, config),
                _ => Err(ContractError::count_mismatch(2, dirs.len())),
            },
            None => loader.load_multicam(dirs.len(), &dirs),
        }
    }

    /// Run the pipeline to completion
    #[instrument(
        name = "pipeline_run",
        skip(self),
        fields(
            mode = mode_label(self.config.blueprint.sync.mode),
            cameras = self.config.blueprint.cameras.len()
        )
    )]
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let dataset = self
            .synchronize()
            .context("Failed to load calibration data")?;

        let mode = mode_label(blueprint.sync.mode);
        record_sync_report(&dataset.report, mode);

        let mut sync_metrics = SyncMetricsAggregator::new();
        sync_metrics.record_report(&dataset.report);
        for bundle in dataset.bundles() {
            record_bundle(&bundle);
            sync_metrics.update(&bundle);
        }

        if dataset.report.stopped_on_exhausted_stream {
            warn!("A stream ran out while aligning timestamps; later matches were not emitted");
        }

        let dispatch = if blueprint.sinks.is_empty() {
            warn!("No sinks configured - synchronized bundles are not written anywhere");
            Default::default()
        } else {
            let dispatcher =
                create_dispatcher(&blueprint.sinks).context("Failed to create sinks")?;
            dispatcher
                .run(&dataset)
                .await
                .context("Failed to dispatch bundles")?
        };

        let failed: Vec<String> = dispatch
            .sinks
            .iter()
            .filter(|(_, m)| m.failure_count > 0)
            .map(|(name, m)| format!("'{}' ({} of {})", name, m.failure_count, dispatch.bundles))
            .collect();
        if !failed.is_empty() {
            anyhow::bail!("Sink writes failed: {}", failed.join(", "));
        }

        let stats = PipelineStats {
            mode: blueprint.sync.mode,
            cameras: dataset.cameras.iter().map(ToString::to_string).collect(),
            report: dataset.report.clone(),
            duration: start_time.elapsed(),
            dispatch,
            sync_metrics,
        };

        info!(
            bundles = stats.report.bundles,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline finished"
        );
        Ok(stats)
    }
}

/// Metric label for a sync mode
pub(crate) fn mode_label(mode: SyncMode) -> &'static str {
    match mode {
        SyncMode::Paired => "paired",
        SyncMode::ExtractCommon => "extract_common",
        SyncMode::Multi => "multi",
    }
}
