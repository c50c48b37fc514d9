//! 配置校验模块
//!
//! 校验规则：
//! - 标定板几何参数合法 (rows/cols >= 1, tag_size > 0, spacing >= 0)
//! - 至少一个相机，camera id 唯一
//! - 双目模式恰好两个相机
//! - sink 名称非空，file sink 必须提供 base_path

use std::collections::HashSet;

use contracts::{ContractError, DatasetBlueprint, SinkType, TargetGeometry};
use ::validator::Validate;

/// 校验 DatasetBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    validate_target("target", &blueprint.target)?;
    validate_cameras(blueprint)?;
    validate_camera_count(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 校验标定板几何参数
pub fn validate_target(field: &str, target: &TargetGeometry) -> Result<(), ContractError> {
    target.validate().map_err(|errors| {
        let mut fields: Vec<_> = errors
            .field_errors()
            .keys()
            .map(|name| format!("{field}.{name}"))
            .collect();
        fields.sort();
        ContractError::config_validation(fields.join(", "), errors.to_string())
    })
}

/// 校验相机列表：非空且 id 唯一
fn validate_cameras(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    if blueprint.cameras.is_empty() {
        return Err(ContractError::config_validation(
            "cameras",
            "at least one camera is required",
        ));
    }

    let mut seen = HashSet::new();
    for camera in &blueprint.cameras {
        if !seen.insert(camera.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("cameras[id={}]", camera.id),
                "duplicate camera id",
            ));
        }
    }
    Ok(())
}

/// 校验同步模式要求的相机数量
fn validate_camera_count(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    match blueprint.sync.mode.required_cameras() {
        Some(expected) if expected != blueprint.cameras.len() => Err(
            ContractError::count_mismatch(expected, blueprint.cameras.len()),
        ),
        _ => Ok(()),
    }
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", idx),
                "queue capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::File && !sink.params.contains_key("base_path") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.base_path", idx),
                "file sink requires base_path",
            ));
        }
    }
    Ok(())
}
