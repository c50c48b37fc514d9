//! Two-stream merge join.

use std::cmp::Ordering;

use contracts::{CameraId, DetectionRecord, StereoSyncConfig, SyncedDataset};
use tracing::{debug, instrument};

use crate::intersect::PairIntersector;

/// Synchronizes two sorted camera streams on exact timestamp equality.
#[derive(Debug, Clone)]
pub struct StereoSynchronizer {
    config: StereoSyncConfig,
    cameras: [CameraId; 2],
}

impl Default for StereoSynchronizer {
    fn default() -> Self {
        Self::new(StereoSyncConfig::default())
    }
}

impl StereoSynchronizer {
    pub fn new(config: StereoSyncConfig) -> Self {
        Self {
            config,
            cameras: [CameraId::indexed(0), CameraId::indexed(1)],
        }
    }

    /// Label the two output streams.
    pub fn with_cameras(mut self, a: CameraId, b: CameraId) -> Self {
        self.cameras = [a, b];
        self
    }

    pub fn config(&self) -> StereoSyncConfig {
        self.config
    }

    /// Merge `a` and `b`, both ascending with unique timestamps.
    ///
    /// Returns two index-aligned, intersected streams. Never fails; the run
    /// ends as soon as either input is exhausted.
    #[instrument(
        name = "stereo_synchronize",
        skip(self, a, b),
        fields(len_a = a.len(), len_b = b.len(), drop_empty = self.config.drop_empty)
    )]
    pub fn synchronize(&self, a: &[DetectionRecord], b: &[DetectionRecord]) -> SyncedDataset {
        let mut dataset = SyncedDataset::with_cameras(self.cameras.to_vec());
        let (mut i, mut j) = (0, 0);

        while i < a.len() && j < b.len() {
            match a[i].timestamp.cmp(&b[j].timestamp) {
                Ordering::Equal => {
                    dataset.report.timestamps_matched += 1;
                    let common = PairIntersector::common_feature_ids(&[&a[i], &b[j]]);

                    if self.config.drop_empty && common.is_empty() {
                        dataset.report.dropped_empty += 1;
                    } else {
                        dataset.streams[0].push(a[i].restricted_to(&common));
                        dataset.streams[1].push(b[j].restricted_to(&common));
                    }
                    i += 1;
                    j += 1;
                }
                // b is behind
                Ordering::Greater => j += 1,
                // a is behind
                Ordering::Less => i += 1,
            }
        }

        let report = &mut dataset.report;
        report.bundles = dataset.streams[0].len();
        report.timestamps_seen = count_distinct(a, b);
        report.skipped_partial = report.timestamps_seen - report.timestamps_matched;

        metrics::counter!("calib_sync_bundles_total", "mode" => "stereo")
            .increment(report.bundles as u64);
        metrics::counter!("calib_sync_dropped_empty_total").increment(report.dropped_empty as u64);
        debug!(
            bundles = report.bundles,
            dropped_empty = report.dropped_empty,
            skipped = report.skipped_partial,
            "stereo streams synchronized"
        );

        dataset
    }
}

/// Size of the timestamp union of two sorted streams.
fn count_distinct(a: &[DetectionRecord], b: &[DetectionRecord]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() || j < b.len() {
        match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => match x.timestamp.cmp(&y.timestamp) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            },
            (Some(_), None) => i += 1,
            (None, _) => j += 1,
        }
        n += 1;
    }
    n
}
