//! Synthetic detector
//!
//! Implements `FeatureDetector` without decoding images: the target is
//! placed fronto-parallel in front of the camera and its tags are projected
//! through the camera model. Used for testing and for demo datasets.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use contracts::{
    CameraIntrinsics, ContractError, DetectionRecord, FeatureDetector, FeatureId,
    FeatureObservation, TargetGeometry, Timestamp,
};
use ingestion::RecordStore;
use nalgebra::Vector3;
use tracing::trace;

use crate::intrinsics::{nominal_image_size, project};

/// Synthetic detector configuration
#[derive(Debug, Clone)]
pub struct SyntheticDetectorConfig {
    /// Distance from camera to target (m)
    pub depth: f64,
    /// Tags reported when visible; `None` means all tags
    pub visible_tags: Option<BTreeSet<FeatureId>>,
    /// Timestamps at which detection fails
    pub undetected: BTreeSet<Timestamp>,
}

impl Default for SyntheticDetectorConfig {
    fn default() -> Self {
        Self {
            depth: 1.5,
            visible_tags: None,
            undetected: BTreeSet::new(),
        }
    }
}

/// Detector that projects the target geometry instead of reading pixels
#[derive(Debug, Clone, Default)]
pub struct SyntheticDetector {
    config: SyntheticDetectorConfig,
}

impl SyntheticDetector {
    pub fn new(config: SyntheticDetectorConfig) -> Self {
        Self { config }
    }

    /// Report only `tags`
    pub fn with_visible_tags(tags: impl IntoIterator<Item = FeatureId>) -> Self {
        Self::new(SyntheticDetectorConfig {
            visible_tags: Some(tags.into_iter().collect()),
            ..Default::default()
        })
    }

    fn is_visible(&self, id: FeatureId) -> bool {
        self.config
            .visible_tags
            .as_ref()
            .is_none_or(|tags| tags.contains(&id))
    }
}

impl FeatureDetector for SyntheticDetector {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn detect(
        &self,
        image: &Path,
        intrinsics: &CameraIntrinsics,
        target: &Arc<TargetGeometry>,
    ) -> Result<DetectionRecord, ContractError> {
        let ts = RecordStore::timestamp_from_path(image).unwrap_or_default();
        let mut record = DetectionRecord::new(ts, Arc::clone(target));
        if self.config.undetected.contains(&ts) {
            return Ok(record);
        }

        let (width, height) = target.extent();
        let (image_w, image_h) = nominal_image_size(intrinsics);
        let in_image = |x: f64, y: f64| (0.0..image_w).contains(&x) && (0.0..image_h).contains(&y);

        for id in 0..target.num_tags() as FeatureId {
            if !self.is_visible(id) {
                continue;
            }
            let Some(corners) = target.object_points(id) else {
                continue;
            };

            let projected: Option<Vec<_>> = corners
                .iter()
                .map(|p| {
                    let camera_frame =
                        Vector3::new(p.x - width / 2.0, p.y - height / 2.0, self.config.depth);
                    project(intrinsics, camera_frame).filter(|px| in_image(px.x, px.y))
                })
                .collect();

            if let Some(Ok(keypoints)) = projected.map(<[_; 4]>::try_from) {
                record.insert_observation(
                    id,
                    FeatureObservation::new(keypoints).with_object_points(corners),
                );
            }
        }

        // a target with no tag in view still counts as a detection attempt
        record.detected = true;
        trace!(ts, features = record.num_features(), "synthetic detection");
        Ok(record)
    }
}
