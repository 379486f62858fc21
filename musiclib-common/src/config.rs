//! Configuration loading and root folder resolution
//!
//! Bootstrap settings only: where the data lives, which address to bind and
//! how much to log. Everything else is catalog data in the database.
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "MUSICLIB_ROOT_FOLDER";
pub const PORT_ENV: &str = "MUSICLIB_PORT";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "musiclib.db";
/// Uploaded files, served under `/media`
pub const MEDIA_DIR: &str = "media";
/// Album covers, relative to the media folder
pub const COVERS_DIR: &str = "album_covers";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error);
    /// `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

/// Platform config file location, if one exists
///
/// On Linux `~/.config/musiclib/config.toml` wins over
/// `/etc/musiclib/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("musiclib").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/musiclib/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML config, falling back to defaults
///
/// `explicit` is a path given on the command line; without it the platform
/// location is tried. Missing or broken files are logged and never abort
/// startup.
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            debug!("No config file found, using defaults");
            return TomlConfig::default();
        }
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read config file {}: {}; using defaults", path.display(), e);
            return TomlConfig::default();
        }
    };

    match parse_toml_config(&content) {
        Ok(config) => {
            info!("Loaded config file: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} ({}); using defaults", e, path.display());
            TomlConfig::default()
        }
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/musiclib
        dirs::data_local_dir()
            .map(|d| d.join("musiclib"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/musiclib"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/musiclib
        dirs::data_dir()
            .map(|d| d.join("musiclib"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/musiclib"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\musiclib
        dirs::data_local_dir()
            .map(|d| d.join("musiclib"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\musiclib"))
    } else {
        PathBuf::from("./musiclib_data")
    }
}

/// Resolves the root folder from CLI, environment, TOML and default
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    toml: &'a TomlConfig,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new(cli_arg: Option<PathBuf>, toml: &'a TomlConfig) -> Self {
        Self { cli_arg, toml }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            debug!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Some(path) = std::env::var_os(ROOT_FOLDER_ENV).filter(|v| !v.is_empty()) {
            debug!("Root folder from {}", ROOT_FOLDER_ENV);
            return PathBuf::from(path);
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml.root_folder {
            debug!("Root folder from config file: {}", path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_root_folder()
    }
}

/// HTTP port: CLI, then environment, then TOML, then [`DEFAULT_PORT`]
///
/// An unparsable environment value is ignored with a warning.
pub fn resolve_port(cli_arg: Option<u16>, toml: &TomlConfig) -> u16 {
    if let Some(port) = cli_arg {
        return port;
    }

    if let Ok(raw) = std::env::var(PORT_ENV) {
        match raw.trim().parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid {}='{}'", PORT_ENV, raw),
        }
    }

    toml.port.unwrap_or(DEFAULT_PORT)
}

/// Bind address: CLI, then TOML, then [`DEFAULT_BIND_ADDRESS`]
pub fn resolve_bind_address(cli_arg: Option<&str>, toml: &TomlConfig) -> String {
    cli_arg
        .map(str::to_string)
        .or_else(|| toml.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
}

/// Creates the root folder layout and knows where things live in it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root, media and cover folders when missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            info!("Creating root folder: {}", self.root.display());
        }
        std::fs::create_dir_all(self.covers_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn media_path(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    pub fn covers_path(&self) -> PathBuf {
        self.media_path().join(COVERS_DIR)
    }
}
