//! # calib-sync
//!
//! 标定数据集同步的编排层。
//!
//! 提供：
//! - 按相机目录加载检测流并同步 (`load_stereo_calib_data` 等)
//! - 按 `DatasetBlueprint` 运行完整流程：加载 → 同步 → 分发到 sinks

pub mod pipeline;

pub use pipeline::{
    extract_common_calib_data, load_multicam_calib_data, load_stereo_calib_data, CalibDataLoader,
    Pipeline, PipelineConfig, PipelineStats,
};
