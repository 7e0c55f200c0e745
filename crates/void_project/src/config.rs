//! Project configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VOID_PROJECT_REQUEST_MATERIALS`,
//!    `VOID_PROJECT_ENABLE_PHYSICS`
//! 2. Config file passed to [`ProjectConfig::load_from_file`]
//! 3. Defaults
//!
//! # Example Config File
//!
//! ```toml
//! [export]
//! request_material_kinds = true
//! indent = "\t"
//!
//! [import]
//! honor_physics_flag = true
//! strip_data_uri_prefix = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Add `requestedMaterialKinds` to the document
    pub request_material_kinds: bool,
    /// Indentation of the pretty-printed document
    pub indent: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            request_material_kinds: false,
            indent: "\t".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Enable physics on the scene when the document asks for it
    pub honor_physics_flag: bool,
    /// Drop a leading `data:` from embedded resource names
    pub strip_data_uri_prefix: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            honor_physics_flag: true,
            strip_data_uri_prefix: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub export: ExportOptions,
    pub import: ImportOptions,
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl ProjectConfig {
    /// Defaults with environment overrides applied
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a TOML file, then apply environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|source| ProjectError::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded project config from {}", path.display());
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_env(&mut self) {
        if let Some(flag) = env_flag("VOID_PROJECT_REQUEST_MATERIALS") {
            self.export.request_material_kinds = flag;
            log::info!("Material kind requests from env: {}", flag);
        }
        if let Some(flag) = env_flag("VOID_PROJECT_ENABLE_PHYSICS") {
            self.import.honor_physics_flag = flag;
            log::info!("Physics flag from env: {}", flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.export.indent, "\t");
        assert!(!config.export.request_material_kinds);
        assert!(config.import.honor_physics_flag);
        assert!(config.import.strip_data_uri_prefix);
    }

    #[test]
    fn test_partial_toml() {
        let config = ProjectConfig::from_toml(
            r#"
            [export]
            request_material_kinds = true
            "#,
        )
        .unwrap();
        assert!(config.export.request_material_kinds);
        assert_eq!(config.export.indent, "\t");
        assert!(config.import.strip_data_uri_prefix);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ProjectConfig::from_toml("[export]\nindent = 4").is_err());
    }
}
