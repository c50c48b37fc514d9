//! N-stream join: keep only timestamps every camera observed.

use std::collections::BTreeMap;

use contracts::{CameraId, DetectionRecord, SyncedDataset, Timestamp};
use tracing::{debug, instrument};

use crate::intersect::PairIntersector;

/// Outcome of aligning all cursors on one timestamp
enum CatchUp {
    Aligned,
    Exhausted,
}

/// Synchronizes any number of sorted camera streams.
#[derive(Debug, Clone, Default)]
pub struct MultiStreamSynchronizer {
    cameras: Option<Vec<CameraId>>,
}

impl MultiStreamSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the output streams; defaults to `cam0..camN`.
    pub fn with_cameras(cameras: Vec<CameraId>) -> Self {
        Self {
            cameras: Some(cameras),
        }
    }

    /// Join `streams` (each ascending, unique timestamps).
    ///
    /// A timestamp is emitted only when all N streams hold it. If a stream
    /// runs out while the others are being aligned, the run stops and the
    /// bundles gathered so far are returned with
    /// `report.stopped_on_exhausted_stream` set.
    #[instrument(name = "multi_synchronize", skip_all, fields(streams = streams.len()))]
    pub fn synchronize(&self, streams: &[Vec<DetectionRecord>]) -> SyncedDataset {
        let n = streams.len();
        let cameras = match &self.cameras {
            Some(cameras) if cameras.len() == n => cameras.clone(),
            _ => (0..n).map(CameraId::indexed).collect(),
        };
        let mut dataset = SyncedDataset::with_cameras(cameras);
        if n == 0 {
            return dataset;
        }

        let mut ts_count: BTreeMap<Timestamp, usize> = BTreeMap::new();
        for record in streams.iter().flatten() {
            *ts_count.entry(record.timestamp).or_default() += 1;
        }
        dataset.report.timestamps_seen = ts_count.len();

        let mut cursors = vec![0usize; n];

        for (&ts, &count) in &ts_count {
            if count != n {
                // step past ts on the streams that do have it
                for (cursor, stream) in cursors.iter_mut().zip(streams) {
                    if stream.get(*cursor).is_some_and(|r| r.timestamp == ts) {
                        *cursor += 1;
                    }
                }
                dataset.report.skipped_partial += 1;
                continue;
            }

            dataset.report.timestamps_matched += 1;
            if let CatchUp::Exhausted = catch_up(streams, &mut cursors, ts) {
                dataset.report.stopped_on_exhausted_stream = true;
                debug!(ts, "stream exhausted while aligning, stopping");
                break;
            }

            let records: Vec<&DetectionRecord> =
                cursors.iter().zip(streams).map(|(&c, s)| &s[c]).collect();
            for (out, record) in dataset.streams.iter_mut().zip(PairIntersector::intersect(&records)) {
                out.push(record);
            }
            cursors.iter_mut().for_each(|c| *c += 1);
        }

        let report = &mut dataset.report;
        report.bundles = dataset.streams[0].len();
        metrics::counter!("calib_sync_bundles_total", "mode" => "multi")
            .increment(report.bundles as u64);
        if report.stopped_on_exhausted_stream {
            metrics::counter!("calib_sync_truncated_runs_total").increment(1);
        }
        debug!(
            bundles = report.bundles,
            skipped = report.skipped_partial,
            truncated = report.stopped_on_exhausted_stream,
            "multi-camera streams synchronized"
        );

        dataset
    }
}

/// Advance lagging cursors until every stream sits on `ts`.
///
/// Each round moves every not-ready cursor one step; the loop ends once all
/// are ready or any cursor walks off the end of its stream.
fn catch_up(streams: &[Vec<DetectionRecord>], cursors: &mut [usize], ts: Timestamp) -> CatchUp {
    loop {
        let ready: Vec<bool> = cursors
            .iter()
            .zip(streams)
            .map(|(&c, s)| s.get(c).is_some_and(|r| r.timestamp == ts))
            .collect();

        if ready.iter().all(|&r| r) {
            return CatchUp::Aligned;
        }

        for ((cursor, stream), ready) in cursors.iter_mut().zip(streams).zip(ready) {
            if !ready {
                *cursor += 1;
            }
            if *cursor >= stream.len() {
                return CatchUp::Exhausted;
            }
        }
    }
}
