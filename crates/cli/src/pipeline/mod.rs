//! Pipeline orchestration module.

mod loading;
mod orchestrator;
mod stats;

pub use loading::{
    extract_common_calib_data, load_multicam_calib_data, load_stereo_calib_data, CalibDataLoader,
};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
