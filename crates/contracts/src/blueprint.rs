//! DatasetBlueprint - Config Loader output
//!
//! Describes one calibration dataset run: target, cameras, synchronization
//! mode and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{CameraId, IntrinsicsSpec, SyncMode, TargetGeometry};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Calibration target shared by all cameras
    pub target: TargetGeometry,

    /// Cameras in rig order
    pub cameras: Vec<CameraConfig>,

    /// Synchronization settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl DatasetBlueprint {
    pub fn camera_ids(&self) -> Vec<CameraId> {
        self.cameras.iter().map(|c| c.id.clone()).collect()
    }

    pub fn data_dirs(&self) -> Vec<PathBuf> {
        self.cameras.iter().map(|c| c.data_dir.clone()).collect()
    }
}

/// Per-camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique camera id
    pub id: CameraId,

    /// Directory of persisted detections (`<timestamp>.json`)
    pub data_dir: PathBuf,

    /// Raw image directory, when detections still need to be produced
    #[serde(default)]
    pub image_dir: Option<PathBuf>,

    /// Intrinsics handed to the detector
    #[serde(default)]
    pub intrinsics: Option<IntrinsicsSpec>,
}

/// Synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Which synchronizer to run
    #[serde(default)]
    pub mode: SyncMode,

    /// Load only records whose detection succeeded
    #[serde(default = "default_detected_only")]
    pub detected_only: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            detected_only: default_detected_only(),
        }
    }
}

fn default_detected_only() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    64
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Bundles buffered ahead of the sink worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters (e.g. `base_path` for file sinks)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log one line per bundle
    Log,
    /// Write per-camera detection files
    File,
}
