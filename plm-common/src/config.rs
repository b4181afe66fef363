//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting that can come from more than one place:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PLM_CONFIG";

/// Environment variable naming the library root folder
pub const ROOT_ENV_VAR: &str = "PLM_ROOT";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// On-disk TOML configuration
///
/// Every field is optional so a partial file is always valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root of the music library (target of `tags_organize`)
    pub library_root: Option<PathBuf>,
    /// SQLite catalog path
    pub database_path: Option<PathBuf>,
    /// Where pre-correction backups are stored
    pub backup_dir: Option<PathBuf>,
    /// Where downloaded cover art is cached
    pub cover_cache_dir: Option<PathBuf>,
    /// AcoustID application key
    pub acoustid_api_key: Option<String>,
    /// Explicit path to the Chromaprint `fpcalc` binary
    pub fpcalc_path: Option<PathBuf>,
    /// Default minimum confidence for accepting a catalog match
    pub min_confidence: Option<f64>,
    /// Enabled catalog adapters, in query order
    pub catalogs: Option<Vec<String>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resolve which config file to read
///
/// CLI argument → `PLM_CONFIG` → `<config dir>/plm/<module>.toml`.
/// Returns `None` when nothing exists on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let default_path = dirs::config_dir()?
        .join("plm")
        .join(format!("{}.toml", module_name));
    if default_path.exists() {
        Some(default_path)
    } else {
        None
    }
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if one resolves, otherwise defaults
pub fn load_or_default(cli_arg: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg, module_name) {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "Loading configuration");
            load_toml_config(&path)
        }
        Some(path) => {
            // An explicitly named file that does not exist is a user error
            Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write config atomically (temp file in the same directory, then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Root folder resolution
///
/// 1. Command-line argument
/// 2. `PLM_ROOT`
/// 3. TOML `library_root`
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.library_root {
        return path.clone();
    }

    get_default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("plm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/plm"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("plm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/plm"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("plm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\plm"))
    } else {
        PathBuf::from("./plm_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str("acoustid_api_key = \"abc\"").unwrap();
        assert_eq!(config.acoustid_api_key.as_deref(), Some("abc"));
        assert_eq!(config.logging.level, "info");
        assert!(config.library_root.is_none());
    }

    #[test]
    fn test_write_then_load_keeps_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("plm-mr.toml");

        let config = TomlConfig {
            library_root: Some(PathBuf::from("/music")),
            min_confidence: Some(80.0),
            catalogs: Some(vec!["deezer".to_string()]),
            ..Default::default()
        };

        write_toml_config(&config, &path).unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join("nested").join("plm-mr.toml.tmp").exists());

        let loaded = load_toml_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "min_confidence = [").unwrap();

        let err = load_toml_config(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cli_root_wins() {
        let config = TomlConfig {
            library_root: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let root = resolve_root_folder(Some(Path::new("/from/cli")), &config);
        assert_eq!(root, PathBuf::from("/from/cli"));
    }
}
