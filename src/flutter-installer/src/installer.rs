use crate::config::{Backend, InstallOptions};
use crate::constants::{DOWNLOAD_DIR_PREFIX, SDK_BIN_DIR_NAME, SDK_DIR_NAME};
use crate::extract::{Extractor, NativeExtractor, SystemExtractor};
use crate::fetch::{CurlFetcher, Fetcher, HttpFetcher};
use crate::platform::{HostIdentity, Platform};
use crate::release::ReleaseArchive;
use crate::{info_message, success_message, warning_message, Colorize};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Installer {
    options: InstallOptions,
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
}

impl Installer {
    /// Builds an installer using the backend selected in the options.
    pub fn new(options: InstallOptions) -> Result<Self> {
        let (fetcher, extractor): (Box<dyn Fetcher>, Box<dyn Extractor>) = match options.backend {
            Backend::Native => (
                Box::new(HttpFetcher::new(options.retries)?),
                Box::new(NativeExtractor),
            ),
            Backend::System => (
                Box::new(CurlFetcher::locate(options.retries)?),
                Box::new(SystemExtractor),
            ),
        };
        Ok(Self::with_backends(options, fetcher, extractor))
    }

    pub fn with_backends(
        options: InstallOptions,
        fetcher: Box<dyn Fetcher>,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        Self {
            options,
            fetcher,
            extractor,
        }
    }

    /// Installs the requested SDK and returns the absolute path of its `bin` directory:
    /// - Creates the install location if needed
    /// - Returns early when a `flutter` directory is already there (the version is not compared)
    /// - Otherwise downloads the release archive for this host, unpacks it, and deletes it
    pub async fn run(&self) -> Result<PathBuf> {
        let install_dir = self.prepare_install_dir()?;
        let sdk_dir = install_dir.join(SDK_DIR_NAME);
        let bin_dir = sdk_dir.join(SDK_BIN_DIR_NAME);

        if sdk_dir.is_dir() {
            warning_message!(
                "Flutter SDK already present at {}, skipping download (installed version is not checked)",
                sdk_dir.display()
            );
            return Ok(bin_dir);
        }

        let platform = self.detect_platform()?;
        let archive =
            ReleaseArchive::new(&self.options.base_url, platform, &self.options.version)?;

        info_message!(
            "Installing Flutter {} for {} into {}",
            self.options.version,
            platform,
            install_dir.display()
        );
        debug!(url = %archive, "resolved release archive");

        // removed on drop, so a failed download leaves nothing behind
        let download_dir = tempfile::Builder::new()
            .prefix(DOWNLOAD_DIR_PREFIX)
            .tempdir_in(&install_dir)
            .with_context(|| {
                format!("failed to create download directory in {}", install_dir.display())
            })?;
        let archive_path = download_dir.path().join(archive.file_name());

        self.fetcher
            .fetch(archive.url(), &archive_path)
            .await
            .with_context(|| format!("failed to download {archive}"))?;

        let extracted = self
            .extractor
            .extract(&archive_path, &install_dir, archive.format());
        remove_archive(&archive_path);
        extracted?;

        if !sdk_dir.is_dir() {
            bail!(
                "{} did not contain a '{}' directory",
                archive.file_name(),
                SDK_DIR_NAME
            );
        }

        success_message!("Flutter {} installed to {}", self.options.version, sdk_dir.display());
        Ok(bin_dir)
    }

    fn prepare_install_dir(&self) -> Result<PathBuf> {
        let dir = &self.options.install_dir;
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create install location {}", dir.display()))?;
        dir.canonicalize()
            .with_context(|| format!("failed to resolve install location {}", dir.display()))
    }

    fn detect_platform(&self) -> Result<Platform> {
        let host = HostIdentity::current()
            .with_overrides(self.options.host_os.clone(), self.options.host_arch.clone());
        Platform::detect(&host)
    }
}

/// Best effort: a missing or undeletable archive is not an error.
fn remove_archive(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed downloaded archive"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => debug!(path = %path.display(), "could not remove archive: {err}"),
    }
}
