//! CameraPreprocessor - per-camera detection pass
//!
//! Walks an image directory, runs the detector on every image that has no
//! cached record yet and persists the result as `<timestamp>.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{
    CameraConfig, CameraId, CameraIntrinsics, ContractError, DatasetBlueprint, FeatureDetector,
    TargetGeometry,
};
use ingestion::RecordStore;
use tracing::{debug, info, instrument, warn};

use crate::error::{PreprocessError, Result};

/// Progress is reported every this many images
pub const PROGRESS_INTERVAL: usize = 10;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "pgm", "tif", "tiff"];

/// One camera's preprocessing work
#[derive(Debug, Clone)]
pub struct CameraJob {
    pub camera: CameraId,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    pub intrinsics: CameraIntrinsics,
    pub show_progress: bool,
}

impl CameraJob {
    /// Job for camera `index` of a blueprint: reads `image_dir`, writes the
    /// records into `data_dir`, where synchronization later loads them.
    ///
    /// # Errors
    /// `ConfigValidation` when the camera has no `image_dir` or `intrinsics`.
    pub fn from_config(
        index: usize,
        camera: &CameraConfig,
    ) -> std::result::Result<Self, ContractError> {
        let missing = |field: &str| {
            ContractError::config_validation(
                format!("cameras[{index}].{field}"),
                format!("camera '{}' needs {field} to be preprocessed", camera.id),
            )
        };
        let image_dir = camera.image_dir.clone().ok_or_else(|| missing("image_dir"))?;
        let intrinsics = camera.intrinsics.ok_or_else(|| missing("intrinsics"))?.resolve();

        Ok(Self {
            camera: camera.id.clone(),
            image_dir,
            output_dir: camera.data_dir.clone(),
            intrinsics,
            show_progress: index == 0,
        })
    }

    /// One job per blueprint camera, in blueprint order.
    pub fn from_blueprint(
        blueprint: &DatasetBlueprint,
    ) -> std::result::Result<Vec<Self>, ContractError> {
        blueprint
            .cameras
            .iter()
            .enumerate()
            .map(|(index, camera)| Self::from_config(index, camera))
            .collect()
    }
}

/// Counts of one camera pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessSummary {
    /// Images found
    pub total: usize,
    /// Images run through the detector
    pub detected: usize,
    /// Images skipped because a record was already on disk
    pub cached: usize,
    /// Detector ran but did not find the target
    pub failed: usize,
}

/// Runs a `FeatureDetector` over camera image directories.
pub struct CameraPreprocessor<D> {
    target: Arc<TargetGeometry>,
    detector: D,
}

impl<D: FeatureDetector> CameraPreprocessor<D> {
    pub fn new(target: Arc<TargetGeometry>, detector: D) -> Self {
        Self { target, detector }
    }

    pub fn target(&self) -> &Arc<TargetGeometry> {
        &self.target
    }

    /// Process every image of `job.image_dir`.
    ///
    /// Re-running over the same directories only detects images whose
    /// record is missing or unreadable.
    ///
    /// # Errors
    /// - `InputNotFound` when the image directory is missing
    /// - `ParseFailure` when an image name is not a timestamp
    /// - detector and `WriteFailure` errors abort the pass
    #[instrument(
        name = "camera_preprocess",
        skip(self, job),
        fields(camera = %job.camera, detector = self.detector.name())
    )]
    pub fn preprocess(&self, job: &CameraJob) -> Result<PreprocessSummary> {
        let images = list_images(&job.image_dir)?;
        let mut summary = PreprocessSummary {
            total: images.len(),
            ..Default::default()
        };

        if job.show_progress {
            info!(images = images.len(), "processing images");
        }

        for (index, image) in images.iter().enumerate() {
            if job.show_progress && index % PROGRESS_INTERVAL == 0 {
                info!(done = index, total = images.len(), "preprocess progress");
            }

            let ts = RecordStore::timestamp_from_path(image).ok_or_else(|| {
                ContractError::parse_failure(image, "image name is not a nanosecond timestamp")
            })?;
            let output = RecordStore::path_for(&job.output_dir, ts);

            if output.is_file() {
                match RecordStore::load(&output) {
                    Ok(_) => {
                        summary.cached += 1;
                        continue;
                    }
                    Err(err) => warn!(path = %output.display(), %err, "cached record unreadable, detecting again"),
                }
            }

            let mut record = self.detector.detect(image, &job.intrinsics, &self.target)?;
            record.timestamp = ts;
            record.target = Arc::clone(&self.target);
            RecordStore::persist(&record, &output)?;

            summary.detected += 1;
            if !record.detected {
                summary.failed += 1;
            }
            debug!(ts, features = record.num_features(), "image processed");
        }

        metrics::counter!("calib_sync_images_detected_total").increment(summary.detected as u64);
        metrics::counter!("calib_sync_images_cached_total").increment(summary.cached as u64);
        info!(
            total = summary.total,
            detected = summary.detected,
            cached = summary.cached,
            failed = summary.failed,
            "camera preprocessing finished"
        );

        Ok(summary)
    }
}

/// Image files of `dir`, sorted by name.
fn list_images(dir: &Path) -> std::result::Result<Vec<PathBuf>, ContractError> {
    if !dir.is_dir() {
        return Err(ContractError::input_not_found(dir));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Preprocess both cameras of a stereo rig concurrently.
///
/// Each camera runs on its own blocking task; both must finish before the
/// summaries are returned. Progress is only reported for the first camera.
#[instrument(name = "stereo_preprocess", skip_all, fields(cam0 = %jobs[0].camera, cam1 = %jobs[1].camera))]
pub async fn preprocess_stereo<D>(
    preprocessor: Arc<CameraPreprocessor<D>>,
    jobs: [CameraJob; 2],
) -> Result<[PreprocessSummary; 2]>
where
    D: FeatureDetector + 'static,
{
    let [job0, mut job1] = jobs;
    job1.show_progress = false;
    let cam0 = job0.camera.clone();
    let cam1 = job1.camera.clone();

    let spawn = |job: CameraJob| {
        let preprocessor = Arc::clone(&preprocessor);
        tokio::task::spawn_blocking(move || preprocessor.preprocess(&job))
    };
    let task0 = spawn(job0);
    let task1 = spawn(job1);

    let join = |camera: CameraId| {
        move |err: tokio::task::JoinError| PreprocessError::task_failed(camera, err.to_string())
    };
    let (summary0, summary1) = tokio::try_join!(
        async { task0.await.map_err(join(cam0)) },
        async { task1.await.map_err(join(cam1)) },
    )?;

    Ok([summary0?, summary1?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{SyntheticDetector, SyntheticDetectorConfig};
    use contracts::IntrinsicsSpec;
    use ingestion::load_stream;
    use tempfile::tempdir;

    fn target() -> Arc<TargetGeometry> {
        Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3))
    }

    fn write_images(dir: &Path, timestamps: &[u64]) {
        fs::create_dir_all(dir).unwrap();
        for ts in timestamps {
            fs::write(dir.join(format!("{ts}.png")), b"").unwrap();
        }
    }

    fn job(camera: &str, image_dir: &Path, output_dir: &Path) -> CameraJob {
        CameraJob {
            camera: camera.into(),
            image_dir: image_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            intrinsics: CameraIntrinsics::from_fov(752.0, 480.0, 90.0, 90.0),
            show_progress: true,
        }
    }

    #[test]
    fn test_preprocess_writes_records() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("cam0");
        let output = dir.path().join("grid0/cam0");
        write_images(&images, &[30, 10, 20]);
        fs::write(images.join("README"), "not an image").unwrap();

        let pre = CameraPreprocessor::new(target(), SyntheticDetector::default());
        let summary = pre.preprocess(&job("cam0", &images, &output)).unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.detected, 3);
        assert_eq!(summary.cached, 0);

        let stream = load_stream(&output, true).unwrap();
        assert_eq!(stream.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![10, 20, 30]);
        assert!(stream.iter().all(|r| r.has_observations()));
    }

    #[test]
    fn test_rerun_uses_cache() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("cam0");
        let output = dir.path().join("out");
        write_images(&images, &[1, 2]);

        let pre = CameraPreprocessor::new(target(), SyntheticDetector::default());
        pre.preprocess(&job("cam0", &images, &output)).unwrap();

        write_images(&images, &[3]);
        fs::write(output.join("2.json"), "corrupt").unwrap();
        let summary = pre.preprocess(&job("cam0", &images, &output)).unwrap();

        assert_eq!(summary.cached, 1);
        assert_eq!(summary.detected, 2);
        assert_eq!(load_stream(&output, true).unwrap().len(), 3);
    }

    #[test]
    fn test_failed_detection_is_persisted() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("cam0");
        let output = dir.path().join("out");
        write_images(&images, &[1, 2, 3]);

        let detector = SyntheticDetector::new(SyntheticDetectorConfig {
            undetected: [2].into_iter().collect(),
            ..Default::default()
        });
        let pre = CameraPreprocessor::new(target(), detector);
        let summary = pre.preprocess(&job("cam0", &images, &output)).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(load_stream(&output, true).unwrap().len(), 2);
        assert_eq!(load_stream(&output, false).unwrap().len(), 3);
    }

    fn camera_config(id: &str, image_dir: Option<&str>, intrinsics: bool) -> CameraConfig {
        CameraConfig {
            id: id.into(),
            data_dir: PathBuf::from("/data").join(id),
            image_dir: image_dir.map(PathBuf::from),
            intrinsics: intrinsics.then_some(IntrinsicsSpec::FieldOfView {
                image_size: [752.0, 480.0],
                lens_hfov: 90.0,
                lens_vfov: 90.0,
            }),
        }
    }

    #[test]
    fn test_job_from_camera_config() {
        let job =
            CameraJob::from_config(0, &camera_config("cam0", Some("/raw/cam0"), true)).unwrap();
        assert_eq!(job.camera.to_string(), "cam0");
        assert_eq!(job.image_dir, PathBuf::from("/raw/cam0"));
        assert_eq!(job.output_dir, PathBuf::from("/data/cam0"));
        assert_eq!(job.intrinsics, CameraIntrinsics::from_fov(752.0, 480.0, 90.0, 90.0));
        assert!(job.show_progress);

        let second =
            CameraJob::from_config(1, &camera_config("cam1", Some("/raw/cam1"), true)).unwrap();
        assert!(!second.show_progress);
    }

    #[test]
    fn test_job_needs_images_and_intrinsics() {
        let err = CameraJob::from_config(2, &camera_config("cam2", None, true)).unwrap_err();
        assert!(err.to_string().contains("cameras[2].image_dir"), "got: {err}");

        let err =
            CameraJob::from_config(1, &camera_config("cam1", Some("/raw"), false)).unwrap_err();
        assert!(matches!(
            err,
            ContractError::ConfigValidation { ref field, .. } if field == "cameras[1].intrinsics"
        ));
    }

    #[test]
    fn test_missing_image_dir() {
        let dir = tempdir().unwrap();
        let pre = CameraPreprocessor::new(target(), SyntheticDetector::default());
        let err = pre
            .preprocess(&job("cam0", &dir.path().join("missing"), dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::Contract(ContractError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_bad_image_name() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("cam0");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("left.png"), b"").unwrap();

        let pre = CameraPreprocessor::new(target(), SyntheticDetector::default());
        let err = pre
            .preprocess(&job("cam0", &images, &dir.path().join("out")))
            .unwrap_err();
        assert!(err.to_string().contains("left.png"), "got: {err}");
    }

    #[tokio::test]
    async fn test_stereo_fork_join() {
        let dir = tempdir().unwrap();
        let img0 = dir.path().join("cam0");
        let img1 = dir.path().join("cam1");
        write_images(&img0, &[1, 2, 3]);
        write_images(&img1, &[2, 3, 4, 5]);

        let pre = Arc::new(CameraPreprocessor::new(target(), SyntheticDetector::default()));
        let [s0, s1] = preprocess_stereo(
            pre,
            [
                job("cam0", &img0, &dir.path().join("grid0/cam0")),
                job("cam1", &img1, &dir.path().join("grid0/cam1")),
            ],
        )
        .await
        .unwrap();

        assert_eq!(s0.total, 3);
        assert_eq!(s1.total, 4);
        assert_eq!(load_stream(&dir.path().join("grid0/cam1"), true).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_stereo_fails_if_either_fails() {
        let dir = tempdir().unwrap();
        let img0 = dir.path().join("cam0");
        write_images(&img0, &[1]);

        let pre = Arc::new(CameraPreprocessor::new(target(), SyntheticDetector::default()));
        let result = preprocess_stereo(
            pre,
            [
                job("cam0", &img0, &dir.path().join("out0")),
                job("cam1", &dir.path().join("missing"), &dir.path().join("out1")),
            ],
        )
        .await;

        assert!(result.is_err());
    }
}
