//! Prerequisite checks run by the bootstrap procedure.
//!
//! The orchestrator only talks to the traits below; the default
//! implementations check Python, Premake and the Vulkan SDK.

pub mod premake;
pub mod python;
pub mod vulkan;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a prerequisite check did not pass.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{tool} was not found. {hint}")]
    Missing { tool: String, hint: String },

    #[error("{tool} {found} is too old; version {required} or newer is required")]
    Outdated {
        tool: String,
        found: String,
        required: String,
    },

    #[error("{tool} {found} does not match the required version {required}")]
    WrongVersion {
        tool: String,
        found: String,
        required: String,
    },

    #[error("{tool} installation is incomplete: {detail}")]
    Incomplete { tool: String, detail: String },

    #[error("failed to inspect {tool}: {source}")]
    Inspect {
        tool: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeReport {
    pub interpreter: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkReport {
    pub path: PathBuf,
    pub version: String,
}

/// Confirms the language runtime and its packages. An error halts setup.
pub trait RuntimeValidator {
    fn validate(&self) -> Result<RuntimeReport, ValidationError>;
}

/// Confirms the build-file generator exists under `root`, installing it if allowed.
pub trait GeneratorValidator {
    fn ensure_available(&self, root: &Path) -> bool;
}

/// Confirms the graphics SDK. Callers only report the result.
pub trait GraphicsSdkValidator {
    fn validate(&self, root: &Path) -> Result<SdkReport, ValidationError>;
}

/// Stand-in runtime validator for projects that opt out of the Python check.
pub struct SkipRuntime;

impl RuntimeValidator for SkipRuntime {
    fn validate(&self) -> Result<RuntimeReport, ValidationError> {
        log::info!("runtime check disabled by configuration");
        Ok(RuntimeReport {
            interpreter: "<skipped>".to_string(),
            version: "<skipped>".to_string(),
        })
    }
}
