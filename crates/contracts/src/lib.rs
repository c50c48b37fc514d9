//! # Contracts
//!
//! Shared interface contracts, defining inter-module data structures and traits.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Capture timestamps are integer nanoseconds (`Timestamp = u64`)
//! - Timestamps are unique and strictly increasing within one camera stream

mod blueprint;
mod camera;
mod camera_id;
mod detection;
mod detector;
mod error;
mod sink;
mod sync;
mod target;

pub use blueprint::*;
pub use camera::*;
pub use camera_id::CameraId;
pub use detection::*;
pub use detector::FeatureDetector;
pub use error::*;
pub use sink::*;
pub use sync::*;
pub use target::*;
