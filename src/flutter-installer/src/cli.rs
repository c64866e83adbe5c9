use anyhow::{bail, Result};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A stable Flutter SDK release number in `N.N.N` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdkVersion(String);

impl SdkVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SdkVersion {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        // a version with spaces means the caller passed several words as one argument
        if input.chars().any(char::is_whitespace) {
            bail!("version must be a single argument without whitespace: '{input}'");
        }

        let parts: Vec<&str> = input.split('.').collect();
        let well_formed = parts.len() == 3
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

        if !well_formed {
            bail!("invalid version '{input}': expected N.N.N (for example 3.22.1)");
        }

        Ok(Self(input.to_string()))
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "flutter-installer",
    version = concat!(env!("CARGO_PKG_VERSION"), " (2025-05-01)"),
    about = "Downloads and unpacks a stable Flutter SDK release, then prints its bin directory",
    disable_version_flag = true
)]
pub struct InstallFlutterCli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub print_version: Option<bool>,

    /// Directory the SDK is unpacked into [default: ~/flutter-sdk]
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub install_dir: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// The SDK release to install, e.g. 3.22.1
    #[arg(value_name = "VERSION")]
    pub sdk_version: String,
}

impl InstallFlutterCli {
    /// Validated after parsing, so `-h` and `-v` win over a malformed version.
    pub fn validated_version(&self) -> Result<SdkVersion> {
        self.sdk_version.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("3.22.1")]
    #[case("0.0.0")]
    #[case("10.200.3000")]
    #[case("01.02.03")]
    fn accepts_three_numeric_components(#[case] input: &str) {
        let version: SdkVersion = input.parse().unwrap();
        assert_eq!(version.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("3.22")]
    #[case("3.22.1.4")]
    #[case("v3.22.1")]
    #[case("3.22.x")]
    #[case("3..1")]
    #[case("3.22.1-beta")]
    fn rejects_malformed_versions(#[case] input: &str) {
        let err = input.parse::<SdkVersion>().unwrap_err();
        assert!(err.to_string().contains("expected N.N.N"), "{err}");
    }

    #[rstest]
    #[case("3.22.1 3.22.2")]
    #[case(" 3.22.1")]
    #[case("3.22.1\t")]
    fn whitespace_has_its_own_message(#[case] input: &str) {
        let err = input.parse::<SdkVersion>().unwrap_err();
        assert!(err.to_string().contains("without whitespace"), "{err}");
    }

    #[test]
    fn parses_output_and_version() {
        let cli =
            InstallFlutterCli::try_parse_from(["flutter-installer", "-o", "/opt/sdk", "3.22.1"])
                .unwrap();
        assert_eq!(cli.install_dir, Some(PathBuf::from("/opt/sdk")));
        assert_eq!(cli.validated_version().unwrap().as_str(), "3.22.1");
        assert!(!cli.debug);
    }

    #[test]
    fn help_and_version_short_circuit() {
        let help = InstallFlutterCli::try_parse_from(["flutter-installer", "-h"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);

        let version = InstallFlutterCli::try_parse_from(["flutter-installer", "-v"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }

    #[rstest]
    #[case(&["flutter-installer", "3.22", "-h"], ErrorKind::DisplayHelp)]
    #[case(&["flutter-installer", "a b", "-h"], ErrorKind::DisplayHelp)]
    #[case(&["flutter-installer", "3.22", "-v"], ErrorKind::DisplayVersion)]
    #[case(&["flutter-installer", "a b", "-v"], ErrorKind::DisplayVersion)]
    fn help_and_version_win_over_bad_versions(#[case] args: &[&str], #[case] kind: ErrorKind) {
        let err = InstallFlutterCli::try_parse_from(args.iter().copied()).unwrap_err();
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn malformed_version_is_caught_after_parsing() {
        let cli = InstallFlutterCli::try_parse_from(["flutter-installer", "3.22"]).unwrap();
        let err = cli.validated_version().unwrap_err();
        assert!(err.to_string().contains("expected N.N.N"), "{err}");
    }

    #[test]
    fn missing_version_is_an_error() {
        let err = InstallFlutterCli::try_parse_from(["flutter-installer"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn option_without_value_is_an_error() {
        let err = InstallFlutterCli::try_parse_from(["flutter-installer", "3.22.1", "-o"])
            .unwrap_err();
        assert!(err.use_stderr());
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);
    }
}
