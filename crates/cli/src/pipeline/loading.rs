//! Load per-camera detection directories and synchronize them.
//!
//! Every stream is loaded before any synchronizer runs, so a missing or
//! malformed directory aborts the whole call.

use std::path::{Path, PathBuf};

use contracts::{CameraId, ContractError, DetectionRecord, StereoSyncConfig, SyncedDataset};
use ingestion::StreamLoader;
use sync_engine::{MultiStreamSynchronizer, StereoSynchronizer};
use tracing::{info, instrument};

/// Loads camera streams and hands them to the matching synchronizer
#[derive(Debug, Clone, Default)]
pub struct CalibDataLoader {
    loader: StreamLoader,
    cameras: Option<Vec<CameraId>>,
}

impl CalibDataLoader {
    pub fn new(loader: StreamLoader) -> Self {
        Self {
            loader,
            cameras: None,
        }
    }

    /// Label the output streams; ignored when the count does not match.
    pub fn with_cameras(mut self, cameras: Vec<CameraId>) -> Self {
        self.cameras = Some(cameras);
        self
    }

    fn labels(&self, n: usize) -> Option<&[CameraId]> {
        self.cameras.as_deref().filter(|c| c.len() == n)
    }

    fn load_all<P: AsRef<Path>>(&self, dirs: &[P]) -> Result<Vec<Vec<DetectionRecord>>, ContractError> {
        let mut streams = Vec::with_capacity(dirs.len());
        for (index, dir) in dirs.iter().enumerate() {
            let stream = self.loader.load_stream(dir.as_ref())?;
            let camera = match self.labels(dirs.len()) {
                Some(cameras) => cameras[index].clone(),
                None => CameraId::indexed(index),
            };
            observability::record_stream_loaded(camera.as_str(), stream.len());
            streams.push(stream);
        }
        Ok(streams)
    }

    /// Load two camera directories and run the stereo synchronizer.
    #[instrument(
        name = "load_stereo_calib_data",
        skip(self),
        fields(drop_empty = config.drop_empty)
    )]
    pub fn load_stereo(
        &self,
        dir0: &Path,
        dir1: &Path,
        config: StereoSyncConfig,
    ) -> Result<SyncedDataset, ContractError> {
        let mut streams = self.load_all(&[dir0, dir1])?;
        let b = streams.pop().unwrap_or_default();
        let a = streams.pop().unwrap_or_default();

        let mut synchronizer = StereoSynchronizer::new(config);
        if let Some([cam0, cam1]) = self.labels(2) {
            synchronizer = synchronizer.with_cameras(cam0.clone(), cam1.clone());
        }

        let dataset = synchronizer.synchronize(&a, &b);
        info!(
            cam0 = a.len(),
            cam1 = b.len(),
            bundles = dataset.len(),
            "stereo calibration data loaded"
        );
        Ok(dataset)
    }

    /// Load `nb_cams` camera directories and keep timestamps seen by all.
    ///
    /// # Errors
    /// `CountMismatch` when `nb_cams != dirs.len()`; loader errors otherwise.
    #[instrument(name = "load_multicam_calib_data", skip(self, dirs), fields(dirs = dirs.len()))]
    pub fn load_multicam(
        &self,
        nb_cams: usize,
        dirs: &[PathBuf],
    ) -> Result<SyncedDataset, ContractError> {
        if nb_cams != dirs.len() {
            return Err(ContractError::count_mismatch(nb_cams, dirs.len()));
        }

        let streams = self.load_all(dirs)?;
        let synchronizer = match self.labels(nb_cams) {
            Some(cameras) => MultiStreamSynchronizer::with_cameras(cameras.to_vec()),
            None => MultiStreamSynchronizer::new(),
        };

        let dataset = synchronizer.synchronize(&streams);
        info!(
            cameras = nb_cams,
            bundles = dataset.len(),
            truncated = dataset.report.stopped_on_exhausted_stream,
            "multi-camera calibration data loaded"
        );
        Ok(dataset)
    }
}

/// Load and synchronize a stereo pair (detected records only).
pub fn load_stereo_calib_data(
    dir0: &Path,
    dir1: &Path,
    config: StereoSyncConfig,
) -> Result<SyncedDataset, ContractError> {
    CalibDataLoader::default().load_stereo(dir0, dir1, config)
}

/// Pair two already-loaded streams, keeping matches with no common feature.
pub fn extract_common_calib_data(a: &[DetectionRecord], b: &[DetectionRecord]) -> SyncedDataset {
    StereoSynchronizer::new(StereoSyncConfig::extract_common()).synchronize(a, b)
}

/// Load and synchronize `nb_cams` cameras (detected records only).
pub fn load_multicam_calib_data(
    nb_cams: usize,
    dirs: &[PathBuf],
) -> Result<SyncedDataset, ContractError> {
    CalibDataLoader::default().load_multicam(nb_cams, dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FeatureId, FeatureObservation, Point2, TargetGeometry, Timestamp};
    use ingestion::RecordStore;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_stream(dir: &Path, records: &[(Timestamp, &[FeatureId])]) {
        let target = Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3));
        for &(ts, ids) in records {
            let mut record = DetectionRecord::new(ts, Arc::clone(&target));
            record.detected = true;
            for &id in ids {
                record.insert_observation(id, FeatureObservation::new([Point2::new(1.0, 2.0); 4]));
            }
            RecordStore::persist(&record, &RecordStore::path_for(dir, ts)).unwrap();
        }
    }

    fn ids(record: &DetectionRecord) -> Vec<FeatureId> {
        record.feature_ids().collect()
    }

    #[test]
    fn test_load_stereo_paired() {
        let dir = tempdir().unwrap();
        let (cam0, cam1) = (dir.path().join("cam0"), dir.path().join("cam1"));
        write_stream(&cam0, &[(10, &[1, 2, 3]), (20, &[4]), (30, &[7])]);
        write_stream(&cam1, &[(10, &[2, 3, 5]), (30, &[8]), (40, &[1])]);

        let out = load_stereo_calib_data(&cam0, &cam1, StereoSyncConfig::paired_dataset()).unwrap();

        assert_eq!(out.timestamps(), vec![10]);
        assert_eq!(ids(&out.streams[0][0]), vec![2, 3]);
        assert_eq!(ids(&out.streams[1][0]), vec![2, 3]);
        assert_eq!(out.report.dropped_empty, 1);
    }

    #[test]
    fn test_load_stereo_missing_dir_fails_before_sync() {
        let dir = tempdir().unwrap();
        let cam0 = dir.path().join("cam0");
        write_stream(&cam0, &[(1, &[1])]);

        let err = load_stereo_calib_data(&cam0, &dir.path().join("cam1"), StereoSyncConfig::default())
            .unwrap_err();
        assert!(matches!(err, ContractError::InputNotFound { .. }));
    }

    #[test]
    fn test_extract_common_keeps_disjoint() {
        let target = Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3));
        let mut a = DetectionRecord::new(5, Arc::clone(&target));
        a.insert_observation(1, FeatureObservation::new([Point2::new(0.0, 0.0); 4]));
        let mut b = DetectionRecord::new(5, target);
        b.insert_observation(2, FeatureObservation::new([Point2::new(0.0, 0.0); 4]));

        let out = extract_common_calib_data(&[a], &[b]);
        assert_eq!(out.len(), 1);
        assert!(!out.streams[0][0].has_observations());
        assert!(!out.streams[1][0].has_observations());
    }

    #[test]
    fn test_load_multicam() {
        let dir = tempdir().unwrap();
        let dirs: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("cam{i}"))).collect();
        write_stream(&dirs[0], &[(1, &[1, 2, 3]), (2, &[1])]);
        write_stream(&dirs[1], &[(1, &[2, 3, 4]), (2, &[1])]);
        write_stream(&dirs[2], &[(1, &[2, 3])]);

        let out = load_multicam_calib_data(3, &dirs).unwrap();

        assert_eq!(out.streams.len(), 3);
        assert_eq!(out.timestamps(), vec![1]);
        assert!(out.streams.iter().all(|s| ids(&s[0]) == vec![2, 3]));
        assert_eq!(out.report.skipped_partial, 1);
    }

    #[test]
    fn test_load_multicam_count_mismatch() {
        let dirs = vec![PathBuf::from("a"), PathBuf::from("b")];
        let err = load_multicam_calib_data(3, &dirs).unwrap_err();
        assert!(matches!(
            err,
            ContractError::CountMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_detected_only_flag() {
        let dir = tempdir().unwrap();
        let (cam0, cam1) = (dir.path().join("cam0"), dir.path().join("cam1"));
        write_stream(&cam0, &[(1, &[1])]);
        write_stream(&cam1, &[(1, &[1])]);
        let target = Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3));
        for cam in [&cam0, &cam1] {
            RecordStore::persist(&DetectionRecord::new(2, Arc::clone(&target)), &cam.join("2.json"))
                .unwrap();
        }

        let config = StereoSyncConfig::extract_common();
        let detected = CalibDataLoader::default().load_stereo(&cam0, &cam1, config).unwrap();
        assert_eq!(detected.timestamps(), vec![1]);

        let all = CalibDataLoader::new(StreamLoader::detected_only(false))
            .load_stereo(&cam0, &cam1, config)
            .unwrap();
        assert_eq!(all.timestamps(), vec![1, 2]);
    }

    #[test]
    fn test_camera_labels() {
        let dir = tempdir().unwrap();
        let (cam0, cam1) = (dir.path().join("a"), dir.path().join("b"));
        write_stream(&cam0, &[(1, &[1])]);
        write_stream(&cam1, &[(1, &[1])]);

        let out = CalibDataLoader::default()
            .with_cameras(vec!["left".into(), "right".into()])
            .load_stereo(&cam0, &cam1, StereoSyncConfig::default())
            .unwrap();
        assert!(out.stream("left").is_some());

        // wrong label count falls back to indexed names
        let out = CalibDataLoader::default()
            .with_cameras(vec!["only".into()])
            .load_multicam(2, &[cam0, cam1])
            .unwrap();
        assert_eq!(out.cameras, vec![CameraId::indexed(0), CameraId::indexed(1)]);
    }
}
