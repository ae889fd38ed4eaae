use std::path::{Path, PathBuf};

use semver::Version;

use super::{RuntimeReport, RuntimeValidator, ValidationError};
use crate::utils::process::{Invocation, ProcessRunner, capture, split_first};
use crate::utils::prompt::Confirm;

/// Candidate interpreters to try (ordered).
#[cfg(windows)]
const CANDIDATES: &[&str] = &["py -3", "py", "python", "python3"];

#[cfg(not(windows))]
const CANDIDATES: &[&str] = &["python3", "python"];

pub const DEFAULT_MIN_VERSION: Version = Version::new(3, 3, 0);

const TOOL: &str = "Python";

pub struct PythonValidator<'a> {
    /// Interpreter command tried before the built-in candidates.
    pub explicit: Option<String>,
    pub min_version: Version,
    pub packages: Vec<String>,
    pub workdir: PathBuf,
    pub confirm: &'a dyn Confirm,
    pub runner: &'a dyn ProcessRunner,
}

impl RuntimeValidator for PythonValidator<'_> {
    fn validate(&self) -> Result<RuntimeReport, ValidationError> {
        let Some((interpreter, version)) = find_python(self.explicit.as_deref(), &self.workdir) else {
            return Err(ValidationError::Missing {
                tool: TOOL.to_string(),
                hint: format!(
                    "Install Python {} or newer and make sure it is on PATH (or set DEVSETUP_PYTHON).",
                    self.min_version
                ),
            });
        };
        log::info!("using Python {version} via `{interpreter}`");

        if version < self.min_version {
            return Err(ValidationError::Outdated {
                tool: TOOL.to_string(),
                found: version.to_string(),
                required: self.min_version.to_string(),
            });
        }

        for package in &self.packages {
            self.ensure_package(&interpreter, package)?;
        }

        Ok(RuntimeReport {
            interpreter,
            version: version.to_string(),
        })
    }
}

impl PythonValidator<'_> {
    fn ensure_package(&self, interpreter: &str, package: &str) -> Result<(), ValidationError> {
        if package_installed(interpreter, package, &self.workdir) {
            log::debug!("python package `{package}` is installed");
            return Ok(());
        }

        let missing = || ValidationError::Missing {
            tool: format!("Python package `{package}`"),
            hint: format!("Install it with `{interpreter} -m pip install {package}`."),
        };

        if !self
            .confirm
            .confirm(&format!("Python package `{package}` is required. Install it?"))
        {
            return Err(missing());
        }

        let (bin, rest) = split_first(interpreter);
        let mut args: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
        args.extend(["-m", "pip", "install", package].map(String::from));
        let invocation = Invocation::new(bin, args, &self.workdir);

        match self.runner.run(&invocation) {
            Ok(outcome) if outcome.is_success() => Ok(()),
            Ok(outcome) => {
                log::error!("`{}` failed with {}", invocation.render(), outcome.describe());
                Err(missing())
            }
            Err(e) => {
                log::error!("{e:#}");
                Err(missing())
            }
        }
    }
}

/// Resolve an interpreter that answers `--version`, returning the command and its version.
/// Version queries run in `workdir`, the same directory later pip installs use.
pub fn find_python(explicit: Option<&str>, workdir: &Path) -> Option<(String, Version)> {
    // Respect an explicit override if provided.
    if let Some(cmd) = explicit {
        match query_version(cmd, workdir) {
            Some(version) => return Some((cmd.to_string(), version)),
            None => log::warn!("DEVSETUP_PYTHON=`{cmd}` did not answer `--version`; trying defaults"),
        }
    }
    CANDIDATES
        .iter()
        .find_map(|cand| query_version(cand, workdir).map(|v| (cand.to_string(), v)))
}

fn query_version(cmd: &str, workdir: &Path) -> Option<Version> {
    let (bin, mut args) = split_first(cmd);
    args.push("--version");
    let output = capture(bin, &args, workdir).ok()?;
    if !output.status.success() {
        return None;
    }
    // Python 2 prints its version to stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    parse_python_version(&text)
}

fn package_installed(interpreter: &str, package: &str, workdir: &Path) -> bool {
    let (bin, mut args) = split_first(interpreter);
    args.extend(["-m", "pip", "show", package]);
    capture(bin, &args, workdir)
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Parse `Python 3.11.4`, tolerating two-part versions and suffixes like `rc1` or `+`.
pub fn parse_python_version(text: &str) -> Option<Version> {
    let raw = text.trim().strip_prefix("Python")?.trim();
    let mut numbers = raw.split('.').map(|part| {
        let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u64>().ok()
    });
    let major = numbers.next()??;
    let minor = numbers.next()??;
    let patch = numbers.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Accepts `3.8` as well as `3.8.0`.
pub fn parse_min_version(raw: &str) -> Option<Version> {
    parse_python_version(&format!("Python {raw}"))
}
