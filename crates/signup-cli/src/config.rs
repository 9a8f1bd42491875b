//! Configuration file management for signup.
//!
//! Provides a TOML-based config file at `~/.config/signup/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default bind address for `signup serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default port for `signup serve`.
pub const DEFAULT_PORT: u16 = 8000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: ServerSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Path to a catalog TOML file that replaces the built-in activities.
    pub path: PathBuf,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the signup config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/signup` or `~/.config/signup`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("signup");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("signup")
}

/// Return the path to the signup config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file, or `None` if it does not exist.
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved server configuration, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupConfig {
    pub bind: String,
    pub port: u16,
    /// Catalog file to load; `None` means the built-in seed catalog.
    pub catalog: Option<PathBuf>,
}

impl SignupConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Bind: `cli_bind` > `SIGNUP_BIND` > `server.bind` > [`DEFAULT_BIND`]
    /// - Port: `cli_port` > `SIGNUP_PORT` > `server.port` > [`DEFAULT_PORT`]
    /// - Catalog: `cli_catalog` > `SIGNUP_CATALOG` > `catalog.path` > seed
    pub fn resolve(
        cli_bind: Option<&str>,
        cli_port: Option<u16>,
        cli_catalog: Option<PathBuf>,
    ) -> Result<Self> {
        let file_config = load_config()?;

        let bind = if let Some(bind) = cli_bind {
            bind.to_string()
        } else if let Ok(bind) = std::env::var("SIGNUP_BIND") {
            bind
        } else if let Some(ref cfg) = file_config {
            cfg.server.bind.clone()
        } else {
            DEFAULT_BIND.to_string()
        };

        let port = if let Some(port) = cli_port {
            port
        } else if let Ok(raw) = std::env::var("SIGNUP_PORT") {
            raw.parse()
                .with_context(|| format!("SIGNUP_PORT is not a valid port: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.server.port
        } else {
            DEFAULT_PORT
        };

        let catalog = if let Some(path) = cli_catalog {
            Some(path)
        } else if let Ok(path) = std::env::var("SIGNUP_CATALOG") {
            Some(PathBuf::from(path))
        } else {
            file_config.and_then(|cfg| cfg.catalog).map(|c| c.path)
        };

        Ok(Self {
            bind,
            port,
            catalog,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
