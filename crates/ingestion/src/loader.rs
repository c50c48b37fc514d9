//! StreamLoader - per-camera detection stream
//!
//! Lists a directory of persisted records, loads them and returns the
//! stream sorted by timestamp.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ContractError, DetectionRecord, TargetGeometry};
use tracing::{debug, info, instrument, warn};

use crate::store::RecordStore;

/// Loader options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip records whose detection failed
    pub detected_only: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            detected_only: true,
        }
    }
}

/// Loads a camera's detection stream from disk
#[derive(Debug, Clone, Default)]
pub struct StreamLoader {
    options: LoadOptions,
}

impl StreamLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn detected_only(detected_only: bool) -> Self {
        Self::new(LoadOptions { detected_only })
    }

    /// Record files in `dir`, ordered by the timestamp in their names.
    ///
    /// # Errors
    /// - `InputNotFound` when `dir` is not a directory
    /// - `ParseFailure` when a record file name is not a timestamp
    pub fn list_records(dir: &Path) -> Result<Vec<PathBuf>, ContractError> {
        if !dir.is_dir() {
            return Err(ContractError::input_not_found(dir));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !RecordStore::is_record_file(&path) {
                continue;
            }
            let ts = RecordStore::timestamp_from_path(&path).ok_or_else(|| {
                ContractError::parse_failure(&path, "file name is not a nanosecond timestamp")
            })?;
            entries.push((ts, path));
        }

        entries.sort_by_key(|(ts, _)| *ts);
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }

    /// Load the stream stored in `dir`.
    ///
    /// Records with equal target geometry share one `Arc`. Duplicate
    /// timestamps are rejected since streams must be strictly increasing.
    ///
    /// # Errors
    /// `InputNotFound` / `ParseFailure`; nothing is returned on failure.
    #[instrument(name = "stream_loader_load", skip(self), fields(dir = %dir.display(), detected_only = self.options.detected_only))]
    pub fn load_stream(&self, dir: &Path) -> Result<Vec<DetectionRecord>, ContractError> {
        let paths = Self::list_records(dir)?;
        let mut shared_target: Option<Arc<TargetGeometry>> = None;
        let mut records = Vec::with_capacity(paths.len());
        let mut skipped = 0usize;

        for path in &paths {
            let mut record = RecordStore::load(path)?;

            if RecordStore::timestamp_from_path(path) != Some(record.timestamp) {
                warn!(
                    path = %path.display(),
                    timestamp = record.timestamp,
                    "record timestamp differs from file name, using record timestamp"
                );
            }

            if !record.detected && self.options.detected_only {
                skipped += 1;
                continue;
            }

            match &shared_target {
                Some(shared) if **shared == *record.target => {
                    record.target = Arc::clone(shared);
                }
                Some(_) => {
                    warn!(path = %path.display(), "record target geometry differs from stream");
                }
                None => shared_target = Some(Arc::clone(&record.target)),
            }

            records.push(record);
        }

        records.sort_by_key(|r| r.timestamp);
        if let Some(pair) = records.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(ContractError::parse_failure(
                dir,
                format!("duplicate timestamp {} in stream", pair[0].timestamp),
            ));
        }

        metrics::counter!("calib_sync_records_loaded_total").increment(records.len() as u64);
        metrics::counter!("calib_sync_records_skipped_total").increment(skipped as u64);
        debug!(files = paths.len(), skipped, "stream files processed");
        info!(records = records.len(), "stream loaded");

        Ok(records)
    }
}

/// Load one camera stream with the given detection filter.
pub fn load_stream(dir: &Path, detected_only: bool) -> Result<Vec<DetectionRecord>, ContractError> {
    StreamLoader::detected_only(detected_only).load_stream(dir)
}
