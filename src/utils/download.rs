use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tar::Archive;
use zip::ZipArchive;

const USER_AGENT: &str = "devsetup";

/// Fetches a remote file onto disk.
pub trait Downloader {
    fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Blocking HTTPS download through reqwest.
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        download_to_file(url, destination)
    }
}

pub fn download_to_file(url: &str, destination: &Path) -> Result<()> {
    let client = Client::builder()
        .build()
        .context("building HTTP client for download")?;

    let mut response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .with_context(|| format!("downloading {url}"))?
        .error_for_status()
        .with_context(|| format!("server rejected download of {url}"))?;

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let mut file = File::create(destination)
        .with_context(|| format!("creating file {}", destination.display()))?;

    io::copy(&mut response, &mut file)
        .with_context(|| format!("writing download to {}", destination.display()))?;
    file.flush()
        .with_context(|| format!("flushing {}", destination.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else {
            None
        }
    }
}

/// Unpack a release archive into `destination`, picking the format from the file name.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    let Some(kind) = ArchiveKind::of(archive_path) else {
        bail!(
            "Unsupported archive format: {} (expected .zip or .tar.gz)",
            archive_path.display()
        );
    };
    let file = File::open(archive_path)
        .with_context(|| format!("opening release archive {}", archive_path.display()))?;

    match kind {
        ArchiveKind::TarGz => Archive::new(GzDecoder::new(file))
            .unpack(destination)
            .with_context(|| {
                format!(
                    "unpacking {} into {}",
                    archive_path.display(),
                    destination.display()
                )
            }),
        ArchiveKind::Zip => unpack_zip(file, destination)
            .with_context(|| format!("unpacking {}", archive_path.display())),
    }
}

fn unpack_zip(file: File, destination: &Path) -> Result<()> {
    let mut zip = ZipArchive::new(file).context("not a readable zip archive")?;

    for idx in 0..zip.len() {
        let mut entry = zip.by_index(idx).with_context(|| format!("zip entry #{idx}"))?;
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("skipping zip entry outside the archive root: {}", entry.name());
            continue;
        };

        let target = destination.join(relative);
        let dir = if entry.is_dir() {
            Some(target.as_path())
        } else {
            target.parent()
        };
        if let Some(dir) = dir {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        if entry.is_dir() {
            continue;
        }

        let mut out = File::create(&target)
            .with_context(|| format!("creating {}", target.display()))?;
        io::copy(&mut entry, &mut out).with_context(|| format!("writing {}", target.display()))?;
    }

    Ok(())
}
