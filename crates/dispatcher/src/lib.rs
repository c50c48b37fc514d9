//! # Dispatcher
//!
//! 同步结果分发模块。
//!
//! 负责：
//! - 消费 `SyncedDataset` / `SynchronizedBundle`
//! - Fan-out 到多个 sinks（日志、按相机落盘）
//! - 每个 sink 独立队列与 worker，单个 sink 失败不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, SynchronizedBundle};
pub use dispatcher::{create_dispatcher, DispatchReport, Dispatcher};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
