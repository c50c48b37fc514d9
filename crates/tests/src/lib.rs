//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（持久化格式）
//! - 模拟 e2e 测试：合成检测 → 加载 → 同步 → 分发 → 重新加载

#[cfg(test)]
mod contract_tests {
    use std::sync::Arc;

    use contracts::{DetectionRecord, FeatureObservation, Point2, TargetGeometry};

    #[test]
    fn test_record_wire_format() {
        let target = Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3));
        let mut record = DetectionRecord::new(1_403_715_273_262_142_976, target);
        record.insert_observation(7, FeatureObservation::new([Point2::new(1.0, 2.0); 4]));

        let json = serde_json::to_value(&record).unwrap();
        for key in ["timestamp", "target", "detected", "observations"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["timestamp"], 1_403_715_273_262_142_976u64);
        assert_eq!(json["target"]["tag_cols"], 6);

        let back: DetectionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use calib_sync_cli::{
        extract_common_calib_data, load_multicam_calib_data, load_stereo_calib_data, Pipeline,
        PipelineConfig,
    };
    use config_loader::ConfigLoader;
    use contracts::{
        CameraIntrinsics, SinkConfig, SinkType, StereoSyncConfig, TargetGeometry, Timestamp,
    };
    use dispatcher::create_dispatcher;
    use ingestion::load_stream;
    use preprocessor::mock::{SyntheticDetector, SyntheticDetectorConfig};
    use preprocessor::{preprocess_stereo, CameraJob, CameraPreprocessor};
    use tempfile::tempdir;

    fn target() -> Arc<TargetGeometry> {
        Arc::new(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3))
    }

    fn write_images(dir: &Path, timestamps: impl IntoIterator<Item = Timestamp>) {
        fs::create_dir_all(dir).unwrap();
        for ts in timestamps {
            fs::write(dir.join(format!("{ts}.png")), b"").unwrap();
        }
    }

    fn job(camera: &str, image_dir: PathBuf, output_dir: PathBuf) -> CameraJob {
        CameraJob {
            camera: camera.into(),
            image_dir,
            output_dir,
            intrinsics: CameraIntrinsics::from_fov(752.0, 480.0, 90.0, 90.0),
            show_progress: true,
        }
    }

    /// End-to-end test: DatasetBlueprint -> SyntheticDetector -> StreamLoader -> StereoSynchronizer -> FileSink
    ///
    /// 验证完整的数据流：
    /// 1. 按配置文件中的 image_dir / intrinsics 生成预处理任务
    /// 2. 双相机并行预处理，检测结果写入 data_dir
    /// 3. 加载两路检测流并同步
    /// 4. FileSink 写出同步结果，重新加载后两路对齐
    #[tokio::test]
    async fn test_e2e_stereo_pipeline() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_images(&root.join("images/cam0"), 1..=6);
        write_images(&root.join("images/cam1"), 2..=7);

        let config_path = root.join("dataset.toml");
        fs::write(
            &config_path,
            format!(
                r#"
[target]
tag_rows = 6
tag_cols = 6
tag_size = 0.088
tag_spacing = 0.3

[sync]
mode = "paired"

[[cameras]]
id = "cam0"
data_dir = "{root}/grid0/cam0"
image_dir = "{root}/images/cam0"
intrinsics = {{ image_size = [752.0, 480.0], lens_hfov = 90.0, lens_vfov = 90.0 }}

[[cameras]]
id = "cam1"
data_dir = "{root}/grid0/cam1"
image_dir = "{root}/images/cam1"
intrinsics = {{ fx = 376.0, fy = 240.0, cx = 376.0, cy = 240.0, distortion = [0.0, 0.0, 0.0, 0.0] }}

[[sinks]]
name = "files"
sink_type = "file"
params = {{ base_path = "{root}/synced" }}

[[sinks]]
name = "log"
sink_type = "log"
"#,
                root = root.display()
            ),
        )
        .unwrap();
        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();

        let jobs: [CameraJob; 2] = CameraJob::from_blueprint(&blueprint)
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(jobs[0].output_dir, root.join("grid0/cam0"));
        let (k0, k1) = (jobs[0].intrinsics, jobs[1].intrinsics);
        assert!((k0.fx - k1.fx).abs() < 1e-9 && (k0.fy - k1.fy).abs() < 1e-9);

        let detector = SyntheticDetector::new(SyntheticDetectorConfig {
            undetected: [3].into_iter().collect(),
            ..Default::default()
        });
        let pre = Arc::new(CameraPreprocessor::new(target(), detector));
        let [s0, s1] = preprocess_stereo(pre, jobs).await.unwrap();
        assert_eq!((s0.total, s1.total), (6, 6));
        assert_eq!((s0.failed, s1.failed), (1, 1));

        let stats = Pipeline::new(PipelineConfig {
            blueprint,
            metrics_port: None,
        })
        .run()
        .await
        .unwrap();

        // common timestamps 2..=6 minus the failed detection at 3
        assert_eq!(stats.report.bundles, 4);
        assert_eq!(stats.dispatch.bundles, 4);
        assert_eq!(stats.dispatch.failures(), 0);
        assert_eq!(stats.sync_metrics.total_bundles, 4);

        let cam0 = load_stream(&root.join("synced/cam0"), true).unwrap();
        let cam1 = load_stream(&root.join("synced/cam1"), true).unwrap();
        let timestamps: Vec<Timestamp> = cam0.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![2, 4, 5, 6]);
        for (a, b) in cam0.iter().zip(&cam1) {
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.feature_id_set(), b.feature_id_set());
            assert_eq!(a.num_features(), 36);
        }

        // the written dataset is itself a valid input
        let again = load_stereo_calib_data(
            &root.join("synced/cam0"),
            &root.join("synced/cam1"),
            StereoSyncConfig::default(),
        )
        .unwrap();
        assert_eq!(again.timestamps(), timestamps);
    }

    /// 三相机：各自可见的标签不同，输出只保留共同部分
    #[test]
    fn test_e2e_multicam_intersection() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let visible: [&[u32]; 3] = [&[0, 1, 2, 3, 4], &[2, 3, 4, 5], &[1, 2, 3, 9]];
        let frames: [&[Timestamp]; 3] = [&[10, 20, 30], &[10, 30], &[10, 20, 30, 40]];

        let mut dirs = Vec::new();
        for (i, (tags, timestamps)) in visible.iter().zip(frames).enumerate() {
            let camera = format!("cam{i}");
            let images = root.join("images").join(&camera);
            let output = root.join("grid").join(&camera);
            write_images(&images, timestamps.iter().copied());

            let pre = CameraPreprocessor::new(
                target(),
                SyntheticDetector::with_visible_tags(tags.iter().copied()),
            );
            pre.preprocess(&job(&camera, images, output.clone())).unwrap();
            dirs.push(output);
        }

        let out = load_multicam_calib_data(3, &dirs).unwrap();

        assert_eq!(out.timestamps(), vec![10, 30]);
        assert_eq!(out.report.skipped_partial, 2);
        for stream in &out.streams {
            for record in stream {
                assert_eq!(record.feature_ids().collect::<Vec<_>>(), vec![2, 3]);
            }
        }
    }

    /// extract_common 结果分发到多个 sink
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_images(&root.join("a"), [1, 2]);
        write_images(&root.join("b"), [1, 2]);

        let left = CameraPreprocessor::new(target(), SyntheticDetector::with_visible_tags([0, 1]));
        let right = CameraPreprocessor::new(target(), SyntheticDetector::with_visible_tags([5]));
        left.preprocess(&job("a", root.join("a"), root.join("ga"))).unwrap();
        right.preprocess(&job("b", root.join("b"), root.join("gb"))).unwrap();

        let a = load_stream(&root.join("ga"), true).unwrap();
        let b = load_stream(&root.join("gb"), true).unwrap();
        let dataset = extract_common_calib_data(&a, &b);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.streams.iter().flatten().all(|r| !r.has_observations()));

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 1,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "out".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 1,
                params: HashMap::from([(
                    "base_path".to_string(),
                    root.join("out").display().to_string(),
                )]),
            },
        ];

        let dispatcher = create_dispatcher(&sink_configs).unwrap();
        assert_eq!(dispatcher.sink_names(), vec!["log1", "out"]);

        let report = dispatcher.run(&dataset).await.unwrap();
        assert_eq!(report.bundles, 2);
        assert!(report.sinks.iter().all(|(_, m)| m.write_count == 2));

        // empty intersections stay detected records
        let written = load_stream(&root.join("out/cam0"), true).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|r| r.detected && !r.has_observations()));
    }
}
