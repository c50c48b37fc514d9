//! # Sync Engine
//!
//! 多相机标定数据同步引擎。
//!
//! 负责：
//! - 同一时刻多条检测记录的特征交集（`PairIntersector`）
//! - 双目数据流按时间戳合并（`StereoSynchronizer`）
//! - N 路数据流同步，仅保留所有相机均观测到的时间戳（`MultiStreamSynchronizer`）
//! - 输出按索引对齐的 `SyncedDataset`
//!
//! 同步算法均为纯函数：不修改输入，不做 I/O，不会失败。
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{MultiStreamSynchronizer, StereoSyncConfig, StereoSynchronizer};
//!
//! let stereo = StereoSynchronizer::new(StereoSyncConfig::paired_dataset());
//! let dataset = stereo.synchronize(&cam0, &cam1);
//!
//! let multi = MultiStreamSynchronizer::new();
//! let dataset = multi.synchronize(&[cam0, cam1, cam2]);
//! for bundle in dataset.bundles() {
//!     // Handle synchronized bundle
//! }
//! ```

mod intersect;
mod multi;
mod stereo;

// Re-exports
pub use intersect::PairIntersector;
pub use multi::MultiStreamSynchronizer;
pub use stereo::StereoSynchronizer;

// Re-export contracts types
pub use contracts::{StereoSyncConfig, SyncReport, SyncedDataset, SynchronizedBundle};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use contracts::{
        DetectionRecord, FeatureId, FeatureObservation, Point2, SyncedDataset, TargetGeometry,
        Timestamp,
    };
    use rand::Rng;

    pub fn record(ts: Timestamp, ids: &[FeatureId]) -> DetectionRecord {
        let mut r = DetectionRecord::new(ts, Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3)));
        r.detected = true;
        for &id in ids {
            r.insert_observation(id, FeatureObservation::new([Point2::new(id as f64, 0.0); 4]));
        }
        r
    }

    pub fn ids(r: &DetectionRecord) -> Vec<FeatureId> {
        r.feature_ids().collect()
    }

    /// Sorted stream with unique timestamps in `0..2*max_len` and random
    /// feature subsets of a 6-tag grid.
    pub fn random_stream(rng: &mut impl Rng, max_len: usize) -> Vec<DetectionRecord> {
        let mut stream = Vec::new();
        for ts in 0..2 * max_len as Timestamp {
            if !rng.random_bool(0.5) {
                continue;
            }
            let features: Vec<FeatureId> = (0..6).filter(|_| rng.random_bool(0.6)).collect();
            stream.push(record(ts * 100, &features));
        }
        stream
    }

    /// Length, alignment and monotonicity of a synchronizer output.
    pub fn assert_aligned(dataset: &SyncedDataset) {
        let len = dataset.len();
        assert!(dataset.streams.iter().all(|s| s.len() == len), "unequal lengths");

        for i in 0..len {
            let first = &dataset.streams[0][i];
            for stream in &dataset.streams[1..] {
                assert_eq!(stream[i].timestamp, first.timestamp);
                assert_eq!(stream[i].feature_id_set(), first.feature_id_set());
            }
        }

        for stream in &dataset.streams {
            assert!(stream.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }
    }
}
