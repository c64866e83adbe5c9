use crate::cli::{InstallFlutterCli, SdkVersion};
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_INSTALL_DIR_NAME,
    DEFAULT_LOG_LEVEL, ENV_PREFIX,
};
use anyhow::{Context, Result};
use config::{Config as RConfig, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which implementation performs downloads and unpacking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process HTTP client and archive readers.
    #[default]
    Native,
    /// `curl`, `unzip` and `tar` from the host.
    System,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub install_dir: Option<PathBuf>,
    pub backend: Backend,
    pub retries: usize,
    pub host_os: Option<String>,
    pub host_arch: Option<String>,
    pub log_level: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the TOML file (the explicit one must exist, the default one may not),
    /// then `FLUTTER_INSTALLER_*` environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Config> {
        let mut builder = RConfig::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("backend", "native")?
            .set_default("retries", 0)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        match config_file {
            Some(path) => {
                builder =
                    builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    let file = File::from(path).format(FileFormat::Toml).required(false);
                    builder = builder.add_source(file);
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("failed to parse installer configuration")
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

/// Everything one install run needs, resolved once from arguments and configuration.
#[derive(Clone, Debug)]
pub struct InstallOptions {
    pub version: SdkVersion,
    pub install_dir: PathBuf,
    pub base_url: String,
    pub backend: Backend,
    pub retries: usize,
    pub host_os: Option<String>,
    pub host_arch: Option<String>,
}

impl InstallOptions {
    pub fn resolve(cli: InstallFlutterCli, config: Config) -> Result<Self> {
        let version = cli.validated_version()?;
        let install_dir = match cli.install_dir.or(config.install_dir) {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("failed to get home directory; pass an install location with -o")?
                .join(DEFAULT_INSTALL_DIR_NAME),
        };

        Ok(Self {
            version,
            install_dir,
            base_url: config.base_url,
            backend: config.backend,
            retries: config.retries,
            host_os: config.host_os,
            host_arch: config.host_arch,
        })
    }
}

/// The filter directive for the logger: `-d` wins over the configured level.
pub fn log_level(cli: &InstallFlutterCli, config: &Config) -> String {
    if cli.debug {
        "debug".to_string()
    } else {
        config.log_level.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use std::io::Write;

    fn cli(args: &[&str]) -> InstallFlutterCli {
        let argv = std::iter::once("flutter-installer").chain(args.iter().copied());
        InstallFlutterCli::try_parse_from(argv).unwrap()
    }

    #[test]
    #[serial]
    fn test_default_config() {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.backend, Backend::Native);
        assert_eq!(config.retries, 0);
    }

    #[test]
    #[serial]
    fn file_values_are_read() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"https://mirror.example.com/flutter\"\nbackend = \"system\"\nretries = 2\ninstall_dir = \"/opt/flutter-sdk\""
        )
        .unwrap();

        let config = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "https://mirror.example.com/flutter");
        assert_eq!(config.backend, Backend::System);
        assert_eq!(config.retries, 2);
        assert_eq!(config.install_dir, Some(PathBuf::from("/opt/flutter-sdk")));
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        std::env::set_var("FLUTTER_INSTALLER_HOST_OS", "FreeBSD");
        let config = ConfigLoader::load(None);
        std::env::remove_var("FLUTTER_INSTALLER_HOST_OS");

        assert_eq!(config.unwrap().host_os.as_deref(), Some("FreeBSD"));
    }

    #[test]
    #[serial]
    fn command_line_install_dir_wins() {
        let mut config = ConfigLoader::load(None).unwrap();
        config.install_dir = Some(PathBuf::from("/from/config"));

        let options =
            InstallOptions::resolve(cli(&["-o", "/from/cli", "3.22.1"]), config.clone()).unwrap();
        assert_eq!(options.install_dir, PathBuf::from("/from/cli"));

        let options = InstallOptions::resolve(cli(&["3.22.1"]), config).unwrap();
        assert_eq!(options.install_dir, PathBuf::from("/from/config"));
    }

    #[test]
    #[serial]
    fn debug_flag_raises_log_level() {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(log_level(&cli(&["-d", "3.22.1"]), &config), "debug");
        assert_eq!(log_level(&cli(&["3.22.1"]), &config), DEFAULT_LOG_LEVEL);
    }
}
