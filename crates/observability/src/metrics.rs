//! 同步结果指标收集模块
//!
//! 基于 `SyncReport` 与 `SynchronizedBundle` 收集和统计同步运行指标。

use std::collections::HashMap;

use contracts::{SyncReport, SynchronizedBundle, Timestamp};
use metrics::{counter, gauge, histogram};

/// 从 SyncReport 记录指标
///
/// 每次同步运行结束时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sync_report;
///
/// let dataset = synchronizer.synchronize(&cam0, &cam1);
/// record_sync_report(&dataset.report, "paired");
/// ```
pub fn record_sync_report(report: &SyncReport, mode: &str) {
    let mode = mode.to_string();

    counter!("calib_sync_runs_total", "mode" => mode.clone()).increment(1);
    gauge!("calib_sync_streams", "mode" => mode.clone()).set(report.streams as f64);
    gauge!("calib_sync_timestamps_seen", "mode" => mode.clone()).set(report.timestamps_seen as f64);
    gauge!("calib_sync_timestamps_matched", "mode" => mode.clone())
        .set(report.timestamps_matched as f64);
    gauge!("calib_sync_last_run_bundles", "mode" => mode.clone()).set(report.bundles as f64);

    // 匹配率
    if report.timestamps_seen > 0 {
        histogram!("calib_sync_match_ratio", "mode" => mode.clone())
            .record(report.timestamps_matched as f64 / report.timestamps_seen as f64);
    }

    if report.skipped_partial > 0 {
        counter!("calib_sync_timestamps_skipped_total", "mode" => mode.clone())
            .increment(report.skipped_partial as u64);
    }

    if report.stopped_on_exhausted_stream {
        counter!("calib_sync_exhausted_stream_total", "mode" => mode).increment(1);
    }
}

/// 记录单个同步包
pub fn record_bundle(bundle: &SynchronizedBundle) {
    histogram!("calib_sync_common_features").record(bundle.num_common_features() as f64);
    if bundle.num_common_features() == 0 {
        counter!("calib_sync_empty_bundles_total").increment(1);
    }
}

/// 记录单相机数据流加载
pub fn record_stream_loaded(camera: &str, records: usize) {
    gauge!("calib_sync_stream_records", "camera" => camera.to_string()).set(records as f64);
}

/// 同步指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// 同步包总数
    pub total_bundles: u64,

    /// 无共同特征的同步包数
    pub empty_bundles: u64,

    /// 同步运行中被丢弃的空交集时间戳
    pub dropped_empty: u64,

    /// 仅部分相机观测到而被跳过的时间戳
    pub skipped_partial: u64,

    /// 因数据流耗尽而提前结束的运行次数
    pub truncated_runs: u64,

    /// 每包共同特征数统计
    pub common_feature_stats: RunningStats,

    /// 相邻同步包时间间隔统计 (ms)
    pub gap_stats: RunningStats,

    /// 各相机输出记录数
    pub camera_records: HashMap<String, u64>,

    last_timestamp: Option<Timestamp>,
}

impl SyncMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一次同步运行的计数
    pub fn record_report(&mut self, report: &SyncReport) {
        self.dropped_empty += report.dropped_empty as u64;
        self.skipped_partial += report.skipped_partial as u64;
        if report.stopped_on_exhausted_stream {
            self.truncated_runs += 1;
        }
    }

    /// 更新聚合统计
    pub fn update(&mut self, bundle: &SynchronizedBundle) {
        self.total_bundles += 1;

        let common = bundle.num_common_features();
        if common == 0 {
            self.empty_bundles += 1;
        }
        self.common_feature_stats.push(common as f64);

        if let Some(last) = self.last_timestamp {
            self.gap_stats
                .push(bundle.timestamp.saturating_sub(last) as f64 / 1e6);
        }
        self.last_timestamp = Some(bundle.timestamp);

        for camera in &bundle.cameras {
            *self.camera_records.entry(camera.to_string()).or_insert(0) += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_bundles: self.total_bundles,
            empty_bundles: self.empty_bundles,
            dropped_empty: self.dropped_empty,
            skipped_partial: self.skipped_partial,
            truncated_runs: self.truncated_runs,
            empty_rate: if self.total_bundles > 0 {
                self.empty_bundles as f64 / self.total_bundles as f64 * 100.0
            } else {
                0.0
            },
            common_features: StatsSummary::from(&self.common_feature_stats),
            bundle_gap_ms: StatsSummary::from(&self.gap_stats),
            camera_records: self.camera_records.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_bundles: u64,
    pub empty_bundles: u64,
    pub dropped_empty: u64,
    pub skipped_partial: u64,
    pub truncated_runs: u64,
    pub empty_rate: f64,
    pub common_features: StatsSummary,
    pub bundle_gap_ms: StatsSummary,
    pub camera_records: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Metrics Summary ===")?;
        writeln!(f, "Total bundles: {}", self.total_bundles)?;
        writeln!(
            f,
            "Empty bundles: {} ({:.2}%)",
            self.empty_bundles, self.empty_rate
        )?;
        writeln!(f, "Dropped (empty intersection): {}", self.dropped_empty)?;
        writeln!(f, "Skipped (partial timestamps): {}", self.skipped_partial)?;
        if self.truncated_runs > 0 {
            writeln!(f, "Runs stopped on exhausted stream: {}", self.truncated_runs)?;
        }
        writeln!(f, "Common features: {}", self.common_features)?;
        writeln!(f, "Bundle gap (ms): {}", self.bundle_gap_ms)?;

        if !self.camera_records.is_empty() {
            writeln!(f, "Records per camera:")?;
            let mut cameras: Vec<_> = self.camera_records.iter().collect();
            cameras.sort();
            for (camera, count) in cameras {
                writeln!(f, "  {}: {}", camera, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
