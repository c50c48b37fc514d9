//! FileSink - writes synchronized records to disk, one directory per camera
//!
//! Layout: `<base_path>/<camera>/<timestamp>.json`, readable again with
//! `ingestion::StreamLoader`.
//!
//! A camera directory that already holds records from an earlier run is
//! refused, so one output directory never mixes two datasets.

use contracts::{CameraId, ContractError, DataSink, SynchronizedBundle};
use ingestion::RecordStore;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Sink that writes each camera's synchronized stream to disk
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    created_dirs: HashSet<PathBuf>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            created_dirs: HashSet::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Output directory of one camera
    pub fn camera_dir(&self, camera: &CameraId) -> PathBuf {
        self.config.base_path.join(camera)
    }

    /// Create `dir`, failing if it already contains record files.
    fn prepare_camera_dir(dir: &Path) -> Result<(), ContractError> {
        if dir.is_dir() {
            let existing = fs::read_dir(dir)
                .map_err(|e| ContractError::write_failure(dir, e.to_string()))?
                .filter_map(|entry| entry.ok())
                .filter(|entry| RecordStore::is_record_file(&entry.path()))
                .count();
            if existing > 0 {
                return Err(ContractError::write_failure(
                    dir,
                    format!("output directory already holds {existing} records"),
                ));
            }
        }
        fs::create_dir_all(dir).map_err(|e| ContractError::write_failure(dir, e.to_string()))
    }

    fn write_bundle_to_disk(&mut self, bundle: &SynchronizedBundle) -> Result<(), ContractError> {
        for (camera, record) in bundle.records_by_camera() {
            let dir = self.camera_dir(camera);
            if !self.created_dirs.contains(&dir) {
                Self::prepare_camera_dir(&dir)?;
                self.created_dirs.insert(dir.clone());
            }
            RecordStore::persist(record, &RecordStore::path_for(&dir, record.timestamp))?;
        }
        Ok(())
    }

    fn persist_bundle(&mut self, bundle: &SynchronizedBundle) -> Result<(), ContractError> {
        self.write_bundle_to_disk(bundle).map_err(|e| {
            error!(sink = %self.name, bundle_id = bundle.bundle_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, bundle_id = bundle.bundle_id)
    )]
    async fn write(&mut self, bundle: &SynchronizedBundle) -> Result<(), ContractError> {
        self.persist_bundle(bundle)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, dirs = self.created_dirs.len(), "FileSink closed");
        Ok(())
    }
}
