use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_CANDIDATES: &[(&str, ConfigFormat)] = &[
    ("setup.yml", ConfigFormat::Yaml),
    ("setup.yaml", ConfigFormat::Yaml),
    ("setup.toml", ConfigFormat::Toml),
];

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

#[derive(Debug, Clone)]
pub struct LoadedSetupConfig {
    pub path: PathBuf,
    pub data: SetupConfig,
}

/// Project-level overrides; every field is optional and falls back to built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    pub project: Option<String>,
    pub generator: GeneratorConfig,
    pub submodules: SubmoduleConfig,
    pub python: PythonConfig,
    pub vulkan: VulkanConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub target: Option<String>,
    pub binary: Option<PathBuf>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SubmoduleConfig {
    pub sync: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PythonConfig {
    pub enabled: bool,
    pub min_version: Option<String>,
    pub packages: Vec<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_version: None,
            packages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct VulkanConfig {
    pub required_version: Option<String>,
    pub debug_libs: Vec<PathBuf>,
}

pub fn load_setup_config(root: &Path) -> Result<Option<LoadedSetupConfig>> {
    for (file, format) in CONFIG_CANDIDATES {
        let path = root.join(file);
        if !path.exists() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading setup config at {}", path.display()))?;
        let data = match format {
            ConfigFormat::Yaml => parse_yaml_str(&content)
                .with_context(|| format!("parsing YAML config at {}", path.display()))?,
            ConfigFormat::Toml => parse_toml_str(&content)
                .with_context(|| format!("parsing TOML config at {}", path.display()))?,
        };
        log::debug!("loaded setup config from {}", path.display());
        return Ok(Some(LoadedSetupConfig { path, data }));
    }
    Ok(None)
}

pub(crate) fn parse_yaml_str(content: &str) -> Result<SetupConfig> {
    // An empty YAML document deserializes to unit, not to an empty map.
    if content.trim().is_empty() {
        return Ok(SetupConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub(crate) fn parse_toml_str(content: &str) -> Result<SetupConfig> {
    Ok(toml::from_str(content)?)
}
