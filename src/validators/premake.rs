use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::GeneratorValidator;
use crate::utils::download::{Downloader, extract_archive};
use crate::utils::prompt::Confirm;

pub const DEFAULT_VERSION: &str = "5.0.0-beta2";

const RELEASES_URL: &str = "https://github.com/premake/premake-core/releases/download";
const LICENSE_URL: &str = "https://raw.githubusercontent.com/premake/premake-core/master/LICENSE.txt";

/// Default generator location relative to the project root.
pub fn default_binary() -> PathBuf {
    Path::new("vendor")
        .join("premake")
        .join("bin")
        .join(format!("premake5{}", std::env::consts::EXE_SUFFIX))
}

pub struct PremakeValidator<'a> {
    /// Binary path relative to the project root.
    pub binary: PathBuf,
    pub version: String,
    pub dry_run: bool,
    pub confirm: &'a dyn Confirm,
    pub downloader: &'a dyn Downloader,
}

impl GeneratorValidator for PremakeValidator<'_> {
    fn ensure_available(&self, root: &Path) -> bool {
        let binary = root.join(&self.binary);
        if binary.is_file() {
            log::info!("found Premake at {}", binary.display());
            return true;
        }

        if !self.confirm.confirm(&format!(
            "Premake not found at {}. Would you like to download Premake {}?",
            binary.display(),
            self.version
        )) {
            return false;
        }

        let url = archive_url(&self.version, std::env::consts::OS);
        if self.dry_run {
            println!("[dry-run] would download {url}");
            return false;
        }

        let installed = self.install(&binary, &url);
        if let Err(e) = &installed {
            eprintln!("Failed to download Premake: {e:#}");
        }
        if binary.is_file() {
            println!("Premake has been downloaded to {}", binary.display());
            return true;
        }
        if installed.is_ok() {
            log::error!("Premake archive did not contain {}", self.binary.display());
        }
        false
    }
}

impl PremakeValidator<'_> {
    fn install(&self, binary: &Path, url: &str) -> Result<()> {
        let bin_dir = binary
            .parent()
            .with_context(|| format!("{} has no parent directory", binary.display()))?;
        fs::create_dir_all(bin_dir)
            .with_context(|| format!("creating {}", bin_dir.display()))?;

        let archive_name = url.rsplit('/').next().unwrap_or("premake-archive");
        let archive_path = bin_dir.join(archive_name);

        println!("Downloading {url}");
        let unpacked = self.downloader.fetch(url, &archive_path).and_then(|()| {
            println!("Extracting {}", archive_path.display());
            extract_archive(&archive_path, bin_dir)
        });
        if archive_path.exists() {
            if let Err(e) = fs::remove_file(&archive_path) {
                log::warn!("could not remove {}: {e}", archive_path.display());
            }
        }
        unpacked?;

        // The license only accompanies the binary; failing to fetch it leaves Premake usable.
        let license_path = bin_dir.join("LICENSE.txt");
        if let Err(e) = self.downloader.fetch(LICENSE_URL, &license_path) {
            log::warn!("could not fetch the Premake license: {e:#}");
        }
        Ok(())
    }
}

/// Release archive for `os` (as named by `std::env::consts::OS`).
pub fn archive_url(version: &str, os: &str) -> String {
    let asset = match os {
        "windows" => format!("premake-{version}-windows.zip"),
        "macos" => format!("premake-{version}-macosx.tar.gz"),
        _ => format!("premake-{version}-linux.tar.gz"),
    };
    format!("{RELEASES_URL}/v{version}/{asset}")
}
