use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{GraphicsSdkValidator, SdkReport, ValidationError};

pub const DEFAULT_REQUIRED_VERSION: &str = "1.3";

const TOOL: &str = "Vulkan SDK";

pub struct VulkanValidator {
    /// Value of `VULKAN_SDK`, if set.
    pub sdk_path: Option<PathBuf>,
    pub required_version: String,
    /// Libraries, relative to the project root, that must ship with the SDK.
    pub debug_libs: Vec<PathBuf>,
}

impl GraphicsSdkValidator for VulkanValidator {
    fn validate(&self, root: &Path) -> Result<SdkReport, ValidationError> {
        let Some(sdk) = self.sdk_path.as_deref().filter(|p| !p.as_os_str().is_empty()) else {
            return Err(ValidationError::Missing {
                tool: TOOL.to_string(),
                hint: install_hint(&self.required_version),
            });
        };

        match fs::metadata(sdk) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ValidationError::Incomplete {
                    tool: TOOL.to_string(),
                    detail: format!("VULKAN_SDK points to {}, which is not a directory", sdk.display()),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ValidationError::Incomplete {
                    tool: TOOL.to_string(),
                    detail: format!("VULKAN_SDK points to {}, which does not exist", sdk.display()),
                });
            }
            Err(source) => {
                return Err(ValidationError::Inspect {
                    tool: TOOL.to_string(),
                    source,
                });
            }
        }

        let version = sdk_version(sdk).unwrap_or_default();
        if !version_satisfies(&version, &self.required_version) {
            return Err(ValidationError::WrongVersion {
                tool: TOOL.to_string(),
                found: if version.is_empty() {
                    format!("at {}", sdk.display())
                } else {
                    version
                },
                required: self.required_version.clone(),
            });
        }

        for lib in &self.debug_libs {
            let path = root.join(lib);
            if !path.is_file() {
                return Err(ValidationError::Incomplete {
                    tool: TOOL.to_string(),
                    detail: format!("debug library {} is missing", path.display()),
                });
            }
        }

        log::info!("found Vulkan SDK {version} at {}", sdk.display());
        Ok(SdkReport {
            path: sdk.to_path_buf(),
            version,
        })
    }
}

/// SDK installs are laid out as `<prefix>/<version>[/<platform>]`.
fn sdk_version(sdk: &Path) -> Option<String> {
    sdk.ancestors()
        .filter_map(|p| p.file_name()?.to_str())
        .find(|name| name.starts_with(|c: char| c.is_ascii_digit()) && name.contains('.'))
        .map(str::to_string)
}

/// `1.3.216.0` satisfies `1.3` and `1.3.216`, but not `1.30`.
fn version_satisfies(found: &str, required: &str) -> bool {
    let found: Vec<&str> = found.split('.').collect();
    let required: Vec<&str> = required.split('.').collect();
    required.len() <= found.len() && required.iter().zip(&found).all(|(r, f)| r == f)
}

fn install_hint(required: &str) -> String {
    format!(
        "Install Vulkan SDK {required} from https://vulkan.lunarg.com/sdk/home and make sure VULKAN_SDK is set."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn validator(sdk_path: Option<PathBuf>) -> VulkanValidator {
        VulkanValidator {
            sdk_path,
            required_version: DEFAULT_REQUIRED_VERSION.to_string(),
            debug_libs: Vec::new(),
        }
    }

    #[test]
    fn unset_sdk_is_missing() {
        let err = validator(None).validate(Path::new(".")).expect_err("must fail");
        assert!(matches!(err, ValidationError::Missing { .. }));
        assert!(err.to_string().contains("vulkan.lunarg.com"));
    }

    #[test]
    fn version_prefix_must_match_whole_components() {
        assert!(version_satisfies("1.3.216.0", "1.3"));
        assert!(version_satisfies("1.3.216.0", "1.3.216"));
        assert!(!version_satisfies("1.30.1", "1.3"));
        assert!(!version_satisfies("1.2.198.1", "1.3"));
        assert!(!version_satisfies("", "1.3"));
    }

    #[test]
    fn version_is_read_from_platform_subdirectory() {
        assert_eq!(
            sdk_version(Path::new("/opt/vulkan/1.3.250.1/x86_64")).as_deref(),
            Some("1.3.250.1")
        );
        assert_eq!(sdk_version(Path::new("/usr")), None);
    }

    #[test]
    fn accepts_matching_sdk_and_checks_debug_libs() {
        let tmp = tempdir().expect("tempdir");
        let sdk = tmp.path().join("VulkanSDK").join("1.3.216.0");
        fs::create_dir_all(&sdk).expect("mkdir sdk");

        let mut v = validator(Some(sdk.clone()));
        let report = v.validate(tmp.path()).expect("valid sdk");
        assert_eq!(report.version, "1.3.216.0");
        assert_eq!(report.path, sdk);

        v.debug_libs = vec![PathBuf::from("vendor/VulkanSDK/Lib/shaderc_sharedd.lib")];
        let err = v.validate(tmp.path()).expect_err("lib missing");
        assert!(matches!(err, ValidationError::Incomplete { .. }));

        let lib = tmp.path().join("vendor/VulkanSDK/Lib");
        fs::create_dir_all(&lib).expect("mkdir lib");
        fs::write(lib.join("shaderc_sharedd.lib"), b"").expect("write lib");
        assert!(v.validate(tmp.path()).is_ok());
    }

    #[test]
    fn sdk_pointing_nowhere_is_incomplete() {
        let tmp = tempdir().expect("tempdir");
        let err = validator(Some(tmp.path().join("1.3.216.0")))
            .validate(tmp.path())
            .expect_err("must fail");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn older_sdk_is_wrong_version() {
        let tmp = tempdir().expect("tempdir");
        let sdk = tmp.path().join("1.2.198.1");
        fs::create_dir_all(&sdk).expect("mkdir sdk");

        let err = validator(Some(sdk)).validate(tmp.path()).expect_err("must fail");
        assert!(matches!(err, ValidationError::WrongVersion { .. }));
        assert!(err.to_string().contains("1.2.198.1"));
    }

    #[test]
    fn newer_sdk_is_rejected_without_suggesting_newer() {
        let tmp = tempdir().expect("tempdir");
        let sdk = tmp.path().join("1.4.304.0");
        fs::create_dir_all(&sdk).expect("mkdir sdk");

        let err = validator(Some(sdk)).validate(tmp.path()).expect_err("must fail");
        assert!(matches!(err, ValidationError::WrongVersion { .. }));
        let message = err.to_string();
        assert_eq!(
            message,
            "Vulkan SDK 1.4.304.0 does not match the required version 1.3"
        );
        assert!(!message.contains("too old"));
        assert!(!message.contains("or newer"));

        let hint = validator(None).validate(tmp.path()).expect_err("unset").to_string();
        assert!(!hint.contains("or newer"));
    }
}
