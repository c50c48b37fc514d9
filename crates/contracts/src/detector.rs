//! FeatureDetector trait - detection boundary
//!
//! Decouples the preprocessor from any concrete target detector. The
//! preprocessor calls `detect` once per image and persists the result.

use std::path::Path;
use std::sync::Arc;

use crate::{CameraIntrinsics, ContractError, DetectionRecord, TargetGeometry};

/// Calibration target detector
///
/// Implementations decode the image themselves. A returned record with
/// `detected == false` means "target not found" and is still persisted;
/// `Err` means the detector itself failed and aborts the camera pass.
pub trait FeatureDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Detect the target in one image
    ///
    /// The caller overwrites `timestamp` with the value parsed from the
    /// image file name.
    fn detect(
        &self,
        image: &Path,
        intrinsics: &CameraIntrinsics,
        target: &Arc<TargetGeometry>,
    ) -> Result<DetectionRecord, ContractError>;
}

impl<D: FeatureDetector + ?Sized> FeatureDetector for Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(
        &self,
        image: &Path,
        intrinsics: &CameraIntrinsics,
        target: &Arc<TargetGeometry>,
    ) -> Result<DetectionRecord, ContractError> {
        (**self).detect(image, intrinsics, target)
    }
}
