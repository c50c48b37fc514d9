//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Look up the calibration target under an optional key prefix
//! - Validate configuration legality
//! - Generate `DatasetBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, TargetLoader};
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("dataset.toml")).unwrap();
//! println!("Cameras: {}", blueprint.cameras.len());
//!
//! let target = TargetLoader::load_from_path(Path::new("calib.toml"), "calib_target").unwrap();
//! println!("Tags: {}", target.num_tags());
//! ```

mod parser;
mod validator;

pub use contracts::{DatasetBlueprint, TargetGeometry};
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Dataset configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File missing
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DatasetBlueprint, ContractError> {
        let content = read_file(path)?;
        let format = detect_format(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DatasetBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        debug!(cameras = blueprint.cameras.len(), mode = ?blueprint.sync.mode, "dataset config loaded");
        Ok(blueprint)
    }

    /// Serialize DatasetBlueprint to TOML string
    pub fn to_toml(blueprint: &DatasetBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize DatasetBlueprint to JSON string
    pub fn to_json(blueprint: &DatasetBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

/// Calibration target loader
///
/// Targets usually live inside a larger calibration config, so the table is
/// addressed by a dotted key prefix (`""` for the document root).
pub struct TargetLoader;

impl TargetLoader {
    /// # Errors
    /// - File or prefix table missing (`InputNotFound`)
    /// - Malformed or mistyped target table (`ParseFailure`)
    /// - Validation failure
    pub fn load_from_path(path: &Path, prefix: &str) -> Result<TargetGeometry, ContractError> {
        let content = read_file(path)?;
        let format = detect_format(path)?;
        Self::load_from_str(&content, format, prefix).map_err(|err| match err {
            ContractError::InputNotFound { path: key } => {
                ContractError::input_not_found(format!("{}#{}", path.display(), key.display()))
            }
            ContractError::ParseFailure { message, .. } => {
                ContractError::parse_failure(path, message)
            }
            other => other,
        })
    }

    /// Malformed syntax and mistyped fields are both `ParseFailure`, keyed
    /// by the prefix (`<root>` for the document root).
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
        prefix: &str,
    ) -> Result<TargetGeometry, ContractError> {
        let origin = if prefix.is_empty() { "<root>" } else { prefix };
        let tree = parser::parse_tree(content, format)
            .map_err(|e| ContractError::parse_failure(origin, e.to_string()))?;
        let table = parser::lookup(&tree, prefix)
            .ok_or_else(|| ContractError::input_not_found(prefix))?;

        let target: TargetGeometry = serde_json::from_value(table.clone()).map_err(|e| {
            ContractError::parse_failure(origin, format!("invalid target under '{prefix}': {e}"))
        })?;

        let field = if prefix.is_empty() { "target" } else { prefix };
        validator::validate_target(field, &target)?;
        Ok(target)
    }
}

/// Infer configuration format from file extension
fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
    let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
        ContractError::config_parse("cannot determine file format from extension")
    })?;

    ConfigFormat::from_extension(ext)
        .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
}

/// Read configuration file content
fn read_file(path: &Path) -> Result<String, ContractError> {
    if !path.is_file() {
        return Err(ContractError::input_not_found(path));
    }
    Ok(std::fs::read_to_string(path)?)
}
