//! RecordStore - detection record persistence
//!
//! One record per file, named `<timestamp>.json`, pretty-printed JSON.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, DetectionRecord, Timestamp};
use tracing::{instrument, trace};

/// File extension of persisted detection records
pub const RECORD_EXTENSION: &str = "json";

/// Reads and writes single detection records
pub struct RecordStore;

impl RecordStore {
    /// File name of the record captured at `timestamp`
    pub fn file_name(timestamp: Timestamp) -> String {
        format!("{timestamp}.{RECORD_EXTENSION}")
    }

    /// Path of the record captured at `timestamp` inside `dir`
    pub fn path_for(dir: &Path, timestamp: Timestamp) -> PathBuf {
        dir.join(Self::file_name(timestamp))
    }

    /// Timestamp encoded in a record or image file name (`<ns>.<ext>`)
    pub fn timestamp_from_path(path: &Path) -> Option<Timestamp> {
        path.file_stem()?.to_str()?.parse().ok()
    }

    /// Whether `path` looks like a persisted record
    pub fn is_record_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(RECORD_EXTENSION))
    }

    /// Persist `record` to `path`, creating parent directories.
    ///
    /// # Errors
    /// `WriteFailure` on any I/O or encoding error
    #[instrument(name = "record_store_persist", skip(record), fields(path = %path.display(), ts = record.timestamp))]
    pub fn persist(record: &DetectionRecord, path: &Path) -> Result<(), ContractError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.flush()
        };

        write().map_err(|e| ContractError::write_failure(path, e.to_string()))?;
        trace!(features = record.num_features(), "record persisted");
        Ok(())
    }

    /// Load one record
    ///
    /// # Errors
    /// - `InputNotFound` when the file does not exist
    /// - `ParseFailure` when the content is not a valid record
    pub fn load(path: &Path) -> Result<DetectionRecord, ContractError> {
        if !path.is_file() {
            return Err(ContractError::input_not_found(path));
        }
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| ContractError::parse_failure(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FeatureObservation, Point2, TargetGeometry};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample_record(ts: Timestamp) -> DetectionRecord {
        let target = Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3));
        let mut record = DetectionRecord::new(ts, target);
        record.insert_observation(
            5,
            FeatureObservation::new([
                Point2::new(10.0, 10.0),
                Point2::new(20.0, 10.0),
                Point2::new(20.0, 20.0),
                Point2::new(10.0, 20.0),
            ]),
        );
        record
    }

    #[test]
    fn test_persist_then_load() {
        let dir = tempdir().unwrap();
        let record = sample_record(1_403_715_273_262_142_976);
        let path = RecordStore::path_for(&dir.path().join("nested"), record.timestamp);

        RecordStore::persist(&record, &path).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "1403715273262142976.json"
        );
        assert_eq!(RecordStore::load(&path).unwrap(), record);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = RecordStore::load(&dir.path().join("1.json")).unwrap_err();
        assert!(matches!(err, ContractError::InputNotFound { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1.json");
        fs::write(&path, "{ \"timestamp\": ").unwrap();
        let err = RecordStore::load(&path).unwrap_err();
        assert!(matches!(err, ContractError::ParseFailure { .. }));
    }

    #[test]
    fn test_persist_into_unwritable_location() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let err = RecordStore::persist(&sample_record(1), &blocker.join("1.json")).unwrap_err();
        assert!(matches!(err, ContractError::WriteFailure { .. }));
    }

    #[test]
    fn test_timestamp_from_path() {
        assert_eq!(RecordStore::timestamp_from_path(Path::new("/x/42.json")), Some(42));
        assert_eq!(RecordStore::timestamp_from_path(Path::new("/x/42.png")), Some(42));
        assert_eq!(RecordStore::timestamp_from_path(Path::new("/x/left.png")), None);
    }
}
