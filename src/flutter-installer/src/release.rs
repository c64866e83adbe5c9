use crate::cli::SdkVersion;
use crate::constants::RELEASE_CHANNEL;
use crate::platform::Platform;
use anyhow::{Context, Result};
use std::fmt::{self, Display, Formatter};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarXz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarXz => "tar.xz",
        }
    }
}

/// A published stable SDK archive for one platform and version.
#[derive(Debug, Clone)]
pub struct ReleaseArchive {
    url: Url,
    file_name: String,
    format: ArchiveFormat,
}

impl ReleaseArchive {
    pub fn new(base_url: &str, platform: Platform, version: &SdkVersion) -> Result<Self> {
        let format = platform.archive_format();
        let target = match platform.arch_suffix() {
            Some(arch) => format!("{}_{}", platform.release_dir(), arch),
            None => platform.release_dir().to_string(),
        };
        let file_name = format!(
            "flutter_{}_{}-{}.{}",
            target,
            version,
            RELEASE_CHANNEL,
            format.extension()
        );

        let url = format!(
            "{}/releases/{}/{}/{}",
            base_url.trim_end_matches('/'),
            RELEASE_CHANNEL,
            platform.release_dir(),
            file_name
        );
        let url = url
            .parse()
            .with_context(|| format!("invalid release url: {url}"))?;

        Ok(Self {
            url,
            file_name,
            format,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }
}

impl Display for ReleaseArchive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
