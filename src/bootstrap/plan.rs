use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::SetupConfig;
use crate::validators::premake;

pub const SUPPORTED_OS: &str = "windows";

/// The two historical flavors of the setup procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Visual Studio 2022 projects, submodules synced first
    Current,
    /// Visual Studio 2019 projects, submodules left alone
    Legacy,
}

impl Variant {
    pub fn target(self) -> &'static str {
        match self {
            Variant::Current => "vs2022",
            Variant::Legacy => "vs2019",
        }
    }

    pub fn sync_submodules(self) -> bool {
        matches!(self, Variant::Current)
    }
}

/// Command-line choices that override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub variant: Option<Variant>,
    pub target: Option<String>,
    pub no_submodules: bool,
}

/// Everything the orchestrator needs, resolved once before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlan {
    pub root: PathBuf,
    pub project_name: String,
    pub target: String,
    pub sync_submodules: bool,
    /// Relative to `root`.
    pub generator_binary: PathBuf,
    pub supported_os: String,
}

impl SetupPlan {
    pub fn resolve(root: PathBuf, config: &SetupConfig, overrides: &Overrides) -> Self {
        let default = overrides.variant.unwrap_or(Variant::Current);

        let target = overrides
            .target
            .clone()
            .or_else(|| overrides.variant.map(|v| v.target().to_string()))
            .or_else(|| config.generator.target.clone())
            .unwrap_or_else(|| default.target().to_string());

        let sync_submodules = !overrides.no_submodules
            && overrides
                .variant
                .map(Variant::sync_submodules)
                .or(config.submodules.sync)
                .unwrap_or(default.sync_submodules());

        let project_name = config
            .project
            .clone()
            .or_else(|| {
                root.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "This project".to_string());

        Self {
            project_name,
            target,
            sync_submodules,
            generator_binary: config
                .generator
                .binary
                .clone()
                .unwrap_or_else(premake::default_binary),
            supported_os: SUPPORTED_OS.to_string(),
            root,
        }
    }

    pub fn generator_path(&self) -> PathBuf {
        self.root.join(&self.generator_binary)
    }
}

/// Pick the project root: explicit path first, otherwise one level above `cwd`,
/// where the setup tooling directory is expected to live.
pub fn resolve_root(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.join(".."),
    };
    candidate
        .canonicalize()
        .with_context(|| format!("resolving project root {}", candidate.display()))
}
