//! Pipeline statistics and metrics.

use std::time::Duration;

use contracts::{SyncMode, SyncReport};
use dispatcher::DispatchReport;
use observability::SyncMetricsAggregator;

use super::orchestrator::mode_label;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Synchronizer that produced the dataset
    pub mode: SyncMode,

    /// Output stream labels, in rig order
    pub cameras: Vec<String>,

    /// Counters reported by the synchronizer
    pub report: SyncReport,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-sink dispatch outcome
    pub dispatch: DispatchReport,

    /// Bundle-level metrics aggregator
    pub sync_metrics: SyncMetricsAggregator,
}

impl PipelineStats {
    /// Share of seen timestamps that every camera observed, as percentage
    pub fn match_rate(&self) -> f64 {
        if self.report.timestamps_seen > 0 {
            self.report.timestamps_matched as f64 / self.report.timestamps_seen as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Mode: {}", mode_label(self.mode));
        println!("   ├─ Cameras: {}", self.cameras.join(", "));
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Timestamps seen: {}", self.report.timestamps_seen);
        println!(
            "   ├─ Timestamps matched: {} ({:.2}%)",
            self.report.timestamps_matched,
            self.match_rate()
        );
        println!("   └─ Bundles: {}", self.report.bundles);

        let summary = self.sync_metrics.summary();

        println!("\n📈 Sync Metrics");
        println!("   ├─ Dropped (empty intersection): {}", summary.dropped_empty);
        println!("   ├─ Skipped (partial timestamps): {}", summary.skipped_partial);
        println!(
            "   ├─ Bundles without common features: {} ({:.2}%)",
            summary.empty_bundles, summary.empty_rate
        );
        println!("   ├─ Common features: {}", summary.common_features);
        println!("   └─ Bundle gap (ms): {}", summary.bundle_gap_ms);

        if self.report.stopped_on_exhausted_stream {
            println!("\n⚠️  Stopped early: a stream ran out while aligning timestamps");
        }

        if !self.dispatch.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, metrics)) in self.dispatch.sinks.iter().enumerate() {
                let prefix = if i == self.dispatch.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed",
                    prefix, name, metrics.write_count, metrics.failure_count
                );
            }
        }

        println!();
    }
}
