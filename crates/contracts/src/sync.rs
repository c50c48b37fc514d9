//! Synchronizer configuration and output types
//!
//! `SyncedDataset` is what every synchronizer returns: one index-aligned
//! output stream per input camera.

use serde::{Deserialize, Serialize};

use crate::{CameraId, DetectionRecord, Timestamp};

/// Two-stream synchronization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereoSyncConfig {
    /// Discard matched pairs whose common feature set is empty
    pub drop_empty: bool,
}

impl StereoSyncConfig {
    /// Keep every matched pair, even fully disjoint ones
    pub const fn extract_common() -> Self {
        Self { drop_empty: false }
    }

    /// Keep only pairs sharing at least one feature
    pub const fn paired_dataset() -> Self {
        Self { drop_empty: true }
    }
}

impl Default for StereoSyncConfig {
    fn default() -> Self {
        Self::paired_dataset()
    }
}

/// Which synchronizer a dataset run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Two cameras, empty intersections dropped
    #[default]
    Paired,
    /// Two cameras, empty intersections kept
    ExtractCommon,
    /// Any number of cameras, timestamps seen by all of them
    Multi,
}

impl SyncMode {
    /// Camera count the mode requires, `None` when any count works.
    pub fn required_cameras(self) -> Option<usize> {
        match self {
            Self::Paired | Self::ExtractCommon => Some(2),
            Self::Multi => None,
        }
    }

    pub fn stereo_config(self) -> Option<StereoSyncConfig> {
        match self {
            Self::Paired => Some(StereoSyncConfig::paired_dataset()),
            Self::ExtractCommon => Some(StereoSyncConfig::extract_common()),
            Self::Multi => None,
        }
    }
}

/// Counters describing one synchronizer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Number of input streams
    pub streams: usize,

    /// Distinct timestamps seen across all inputs
    pub timestamps_seen: usize,

    /// Timestamps every stream observed
    pub timestamps_matched: usize,

    /// Bundles emitted
    pub bundles: usize,

    /// Matched timestamps discarded because nothing was seen in common
    pub dropped_empty: usize,

    /// Timestamps skipped because some stream did not observe them
    pub skipped_partial: usize,

    /// Run stopped because a stream ran out while catching up
    pub stopped_on_exhausted_stream: bool,
}

/// Index-aligned synchronized output
///
/// `streams[c][i]` is camera `c`'s record of bundle `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncedDataset {
    pub cameras: Vec<CameraId>,
    pub streams: Vec<Vec<DetectionRecord>>,
    pub report: SyncReport,
}

impl SyncedDataset {
    /// Empty dataset with one output stream per camera
    pub fn with_cameras(cameras: Vec<CameraId>) -> Self {
        let streams = vec![Vec::new(); cameras.len()];
        Self {
            report: SyncReport {
                streams: cameras.len(),
                ..Default::default()
            },
            cameras,
            streams,
        }
    }

    /// Number of synchronized bundles
    pub fn len(&self) -> usize {
        self.streams.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.streams
            .first()
            .map(|s| s.iter().map(|r| r.timestamp).collect())
            .unwrap_or_default()
    }

    /// Output stream of one camera
    pub fn stream(&self, camera: &str) -> Option<&[DetectionRecord]> {
        self.cameras
            .iter()
            .position(|c| c == camera)
            .map(|idx| self.streams[idx].as_slice())
    }

    /// Consume the dataset into per-camera streams
    pub fn into_streams(self) -> Vec<Vec<DetectionRecord>> {
        self.streams
    }

    /// Regroup the aligned streams into bundles
    pub fn bundles(&self) -> Vec<SynchronizedBundle> {
        (0..self.len())
            .map(|i| SynchronizedBundle {
                bundle_id: i as u64,
                timestamp: self.streams[0][i].timestamp,
                cameras: self.cameras.clone(),
                records: self.streams.iter().map(|s| s[i].clone()).collect(),
            })
            .collect()
    }
}

/// One timestamp's worth of intersected records, one per camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizedBundle {
    /// Position in the synchronized sequence
    pub bundle_id: u64,

    pub timestamp: Timestamp,

    pub cameras: Vec<CameraId>,

    pub records: Vec<DetectionRecord>,
}

impl SynchronizedBundle {
    /// Number of features every camera observed
    pub fn num_common_features(&self) -> usize {
        self.records.first().map_or(0, DetectionRecord::num_features)
    }

    pub fn records_by_camera(&self) -> impl Iterator<Item = (&CameraId, &DetectionRecord)> {
        self.cameras.iter().zip(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetGeometry;
    use std::sync::Arc;

    fn record(ts: Timestamp) -> DetectionRecord {
        DetectionRecord::new(ts, Arc::new(TargetGeometry::aprilgrid(2, 2, 0.1, 0.3)))
    }

    #[test]
    fn test_mode_requirements() {
        assert_eq!(SyncMode::Paired.required_cameras(), Some(2));
        assert_eq!(SyncMode::Multi.required_cameras(), None);
        assert_eq!(
            SyncMode::ExtractCommon.stereo_config(),
            Some(StereoSyncConfig { drop_empty: false })
        );
        assert_eq!(StereoSyncConfig::default(), StereoSyncConfig::paired_dataset());
    }

    #[test]
    fn test_bundles_regroup_streams() {
        let mut dataset = SyncedDataset::with_cameras(vec!["a".into(), "b".into()]);
        dataset.streams[0] = vec![record(1), record(2)];
        dataset.streams[1] = vec![record(1), record(2)];

        let bundles = dataset.bundles();
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[1].bundle_id, 1);
        assert_eq!(bundles[1].timestamp, 2);
        assert_eq!(bundles[1].records.len(), 2);
        assert_eq!(dataset.timestamps(), vec![1, 2]);
        assert_eq!(dataset.stream("b").map(<[_]>::len), Some(2));
        assert!(dataset.stream("c").is_none());
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = SyncedDataset::with_cameras(Vec::new());
        assert!(dataset.is_empty());
        assert!(dataset.bundles().is_empty());
    }
}
