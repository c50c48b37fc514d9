//! # Preprocessor
//!
//! Camera image preprocessing module.
//!
//! Responsibilities:
//! - Run a `FeatureDetector` over each camera's image directory
//! - Cache detection results as `<timestamp>.json` (idempotent re-runs)
//! - Preprocess the two cameras of a stereo rig concurrently
//! - Provide a synthetic detector for tests and demo datasets
//!
//! ## Usage Example
//!
//! ```ignore
//! use preprocessor::{preprocess_stereo, CameraJob, CameraPreprocessor};
//! use preprocessor::mock::SyntheticDetector;
//!
//! let pre = Arc::new(CameraPreprocessor::new(target, SyntheticDetector::default()));
//! let [cam0, cam1] = preprocess_stereo(pre, [job0, job1]).await?;
//! ```

mod camera;
mod error;
mod intrinsics;
pub mod mock;

pub use camera::{
    preprocess_stereo, CameraJob, CameraPreprocessor, PreprocessSummary, PROGRESS_INTERVAL,
};
pub use error::{PreprocessError, Result};
pub use intrinsics::{camera_matrix, distort_radtan, project};
