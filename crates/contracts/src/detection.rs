//! DetectionRecord - one camera's view of the target at one instant
//!
//! Produced by the preprocessor (fresh detection) or the stream loader
//! (persisted detection), consumed by the synchronizers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::TargetGeometry;

/// Capture time in nanoseconds
pub type Timestamp = u64;

/// Identifier of one target feature (an AprilTag id)
pub type FeatureId = u32;

/// Corners reported per feature
pub const CORNERS_PER_FEATURE: usize = 4;

/// Image-plane point (pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Target-frame point (metres)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Measured corners of a single feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureObservation {
    /// Corner keypoints, same order as `TargetGeometry::object_points`
    pub keypoints: [Point2; CORNERS_PER_FEATURE],

    /// Matching target-frame corners, when the detector provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_points: Option<[Point3; CORNERS_PER_FEATURE]>,
}

impl FeatureObservation {
    pub fn new(keypoints: [Point2; CORNERS_PER_FEATURE]) -> Self {
        Self {
            keypoints,
            object_points: None,
        }
    }

    pub fn with_object_points(mut self, object_points: [Point3; CORNERS_PER_FEATURE]) -> Self {
        self.object_points = Some(object_points);
        self
    }
}

/// Detection of the calibration target in one image
///
/// `detected == false` means the detector failed outright; a detected record
/// with no observations is legal and distinct from that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Capture time (ns), unique within a stream
    pub timestamp: Timestamp,

    /// Target the features belong to
    pub target: Arc<TargetGeometry>,

    /// Whether detection succeeded
    pub detected: bool,

    /// Feature id -> measured corners
    #[serde(default)]
    pub observations: BTreeMap<FeatureId, FeatureObservation>,
}

impl DetectionRecord {
    /// Empty, not-yet-detected record
    pub fn new(timestamp: Timestamp, target: Arc<TargetGeometry>) -> Self {
        Self {
            timestamp,
            target,
            detected: false,
            observations: BTreeMap::new(),
        }
    }

    /// Detected record holding the given observations
    pub fn with_observations(
        timestamp: Timestamp,
        target: Arc<TargetGeometry>,
        observations: BTreeMap<FeatureId, FeatureObservation>,
    ) -> Self {
        Self {
            timestamp,
            target,
            detected: true,
            observations,
        }
    }

    /// Add (or replace) one feature; marks the record as detected.
    pub fn insert_observation(&mut self, id: FeatureId, observation: FeatureObservation) {
        self.detected = true;
        self.observations.insert(id, observation);
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.observations.keys().copied()
    }

    pub fn feature_id_set(&self) -> BTreeSet<FeatureId> {
        self.feature_ids().collect()
    }

    pub fn num_features(&self) -> usize {
        self.observations.len()
    }

    pub fn contains_feature(&self, id: FeatureId) -> bool {
        self.observations.contains_key(&id)
    }

    pub fn has_observations(&self) -> bool {
        !self.observations.is_empty()
    }

    /// Copy of this record keeping only the features in `keep`.
    pub fn restricted_to(&self, keep: &BTreeSet<FeatureId>) -> Self {
        Self {
            timestamp: self.timestamp,
            target: Arc::clone(&self.target),
            detected: self.detected,
            observations: self
                .observations
                .iter()
                .filter(|(id, _)| keep.contains(id))
                .map(|(id, obs)| (*id, obs.clone()))
                .collect(),
        }
    }

    /// Drop, in place, every feature not in `keep`.
    pub fn retain_features(&mut self, keep: &BTreeSet<FeatureId>) {
        self.observations.retain(|id, _| keep.contains(id));
    }
}
