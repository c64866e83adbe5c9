pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/flutter_infra_release";
pub const RELEASE_CHANNEL: &str = "stable";

/// Directory name of the SDK inside the install location.
pub const SDK_DIR_NAME: &str = "flutter";
pub const SDK_BIN_DIR_NAME: &str = "bin";

pub const DEFAULT_INSTALL_DIR_NAME: &str = "flutter-sdk";

pub const CONFIG_DIR_NAME: &str = "flutter-installer";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "FLUTTER_INSTALLER";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

pub const DOWNLOAD_DIR_PREFIX: &str = ".flutter-download-";
