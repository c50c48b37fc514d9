//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::DatasetBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<TargetInfo>,
    cameras: Vec<CameraInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    sync_settings: SyncInfo,
}

#[derive(Serialize)]
struct TargetInfo {
    target_type: String,
    tag_rows: u32,
    tag_cols: u32,
    tag_size: f64,
    tag_spacing: f64,
    num_tags: usize,
    extent_m: (f64, f64),
}

#[derive(Serialize)]
struct CameraInfo {
    id: String,
    data_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    focal_px: Option<(f64, f64)>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct SyncInfo {
    mode: String,
    detected_only: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &DatasetBlueprint, args: &InfoArgs) -> ConfigInfo {
    let target = args.target.then(|| {
        let t = &blueprint.target;
        TargetInfo {
            target_type: format!("{:?}", t.target_type),
            tag_rows: t.tag_rows,
            tag_cols: t.tag_cols,
            tag_size: t.tag_size,
            tag_spacing: t.tag_spacing,
            num_tags: t.num_tags(),
            extent_m: t.extent(),
        }
    });

    let cameras = blueprint
        .cameras
        .iter()
        .map(|c| CameraInfo {
            id: c.id.to_string(),
            data_dir: c.data_dir.display().to_string(),
            image_dir: c.image_dir.as_ref().map(|p| p.display().to_string()),
            focal_px: c.intrinsics.map(|spec| {
                let k = spec.resolve();
                (k.fx, k.fy)
            }),
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        target,
        cameras,
        sinks,
        sync_settings: SyncInfo {
            mode: format!("{:?}", blueprint.sync.mode),
            detected_only: blueprint.sync.detected_only,
        },
    }
}

fn print_config_info(blueprint: &DatasetBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                calib-sync Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Target
    let target = &blueprint.target;
    println!("🎯 Target");
    println!("   ├─ Version: {:?}", blueprint.version);
    if args.target {
        let (width, height) = target.extent();
        println!("   ├─ Type: {:?}", target.target_type);
        println!("   ├─ Grid: {} x {} tags", target.tag_rows, target.tag_cols);
        println!("   ├─ Tag size: {} m (spacing {})", target.tag_size, target.tag_spacing);
        println!("   └─ Extent: {:.3} x {:.3} m", width, height);
    } else {
        println!("   └─ {} tags", target.num_tags());
    }

    // Cameras
    println!("\n📷 Cameras ({})", blueprint.cameras.len());
    for (i, camera) in blueprint.cameras.iter().enumerate() {
        let is_last = i == blueprint.cameras.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {}", prefix, camera.id);
        println!("   {}  ├─ data: {}", child_prefix, camera.data_dir.display());
        match &camera.image_dir {
            Some(images) => println!("   {}  └─ images: {}", child_prefix, images.display()),
            None => println!("   {}  └─ images: (none)", child_prefix),
        }
    }

    // Sync Settings
    println!("\n⚙️  Sync Settings");
    println!("   ├─ Mode: {:?}", blueprint.sync.mode);
    println!("   └─ Detected only: {}", blueprint.sync.detected_only);

    // Sinks
    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn blueprint() -> DatasetBlueprint {
        config_loader::ConfigLoader::load_from_str(
            r#"
            [target]
            tag_rows = 6
            tag_cols = 6
            tag_size = 0.088
            tag_spacing = 0.3

            [[cameras]]
            id = "cam0"
            data_dir = "/data/cam0"
            intrinsics = { image_size = [752.0, 480.0], lens_hfov = 90.0, lens_vfov = 90.0 }

            [[cameras]]
            id = "cam1"
            data_dir = "/data/cam1"

            [[sinks]]
            name = "out"
            sink_type = "file"
            params = { base_path = "/tmp/out" }
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn args(target: bool, sinks: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("dataset.toml"),
            json: true,
            target,
            sinks,
        }
    }

    #[test]
    fn test_build_info_minimal() {
        let info = build_config_info(&blueprint(), &args(false, false));
        assert!(info.target.is_none());
        assert!(info.sinks.is_empty());
        assert_eq!(info.cameras.len(), 2);
        let (fx, fy) = info.cameras[0].focal_px.unwrap();
        assert!((fx - 376.0).abs() < 1e-6 && (fy - 240.0).abs() < 1e-6);
        assert!(info.cameras[1].focal_px.is_none());
        assert_eq!(info.sync_settings.mode, "Paired");
    }

    #[test]
    fn test_build_info_detailed() {
        let info = build_config_info(&blueprint(), &args(true, true));
        assert_eq!(info.target.as_ref().map(|t| t.num_tags), Some(36));
        assert_eq!(info.sinks.len(), 1);
        assert_eq!(info.sinks[0].queue_capacity, 64);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["sinks"][0]["sink_type"], "File");
    }
}
