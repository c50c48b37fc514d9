//! # Ingestion
//!
//! Detection data ingestion module.
//!
//! Responsibilities:
//! - Persist / load single `DetectionRecord` files
//! - List and sort a camera's detection directory
//! - Produce the per-camera stream consumed by the synchronizers
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::StreamLoader;
//!
//! let loader = StreamLoader::detected_only(true);
//! let cam0 = loader.load_stream(Path::new("data/cam0"))?;
//! let cam1 = loader.load_stream(Path::new("data/cam1"))?;
//! ```

mod loader;
mod store;

// Re-exports
pub use contracts::DetectionRecord;
pub use loader::{load_stream, LoadOptions, StreamLoader};
pub use store::{RecordStore, RECORD_EXTENSION};
