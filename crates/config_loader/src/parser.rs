//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, DatasetBlueprint};
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 按格式反序列化任意配置结构
pub fn parse_as<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ContractError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("TOML parse error: {e}"),
            source: Some(Box::new(e)),
        }),
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            })
        }
    }
}

/// 解析为格式无关的树，供按前缀查找使用
pub fn parse_tree(content: &str, format: ConfigFormat) -> Result<serde_json::Value, ContractError> {
    parse_as(content, format)
}

/// 解析数据集配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<DatasetBlueprint, ContractError> {
    parse_as(content, format)
}

/// 沿点分前缀 (`"calib.target"`) 查找子表；空前缀返回根
pub fn lookup<'a>(tree: &'a serde_json::Value, prefix: &str) -> Option<&'a serde_json::Value> {
    if prefix.is_empty() {
        return Some(tree);
    }
    prefix
        .split('.')
        .try_fold(tree, |node, key| node.as_object()?.get(key))
}
