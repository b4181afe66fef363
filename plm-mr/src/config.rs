//! Configuration resolution for plm-mr
//!
//! Folds the TOML file, environment and root folder into [`MrSettings`].

use crate::models::{CandidateSource, DEFAULT_MIN_CONFIDENCE};
use plm_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the AcoustID API key
pub const ACOUSTID_KEY_ENV_VAR: &str = "PLM_ACOUSTID_API_KEY";

/// Catalogs queried when the config does not list any
pub const DEFAULT_CATALOGS: [CandidateSource; 3] = [
    CandidateSource::MusicBrainz,
    CandidateSource::ITunes,
    CandidateSource::Deezer,
];

/// Resolve the AcoustID API key
///
/// **Priority:** ENV → TOML. `None` means the fingerprint fallback is
/// unavailable; that is a capability gap, not an error.
pub fn resolve_acoustid_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(ACOUSTID_KEY_ENV_VAR)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .acoustid_api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("AcoustID API key found in multiple sources: environment, TOML. Using environment (highest priority).");
    }

    if let Some(key) = env_key {
        info!("AcoustID API key loaded from environment variable");
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("AcoustID API key loaded from TOML config");
        return Some(key.trim().to_string());
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Parse the configured catalog list, dropping unknown names
pub fn resolve_catalogs(toml_config: &TomlConfig) -> Vec<CandidateSource> {
    let Some(names) = &toml_config.catalogs else {
        return DEFAULT_CATALOGS.to_vec();
    };

    let mut catalogs = Vec::new();
    for name in names {
        match CandidateSource::from_name(name) {
            Some(CandidateSource::FallbackFingerprint) | None => {
                warn!(catalog = %name, "Ignoring unknown catalog in config");
            }
            Some(source) => {
                if !catalogs.contains(&source) {
                    catalogs.push(source);
                }
            }
        }
    }
    catalogs
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct MrSettings {
    pub library_root: PathBuf,
    pub database_path: PathBuf,
    pub backup_dir: PathBuf,
    pub cover_cache_dir: PathBuf,
    pub acoustid_api_key: Option<String>,
    pub fpcalc_path: Option<PathBuf>,
    pub min_confidence: f64,
    pub catalogs: Vec<CandidateSource>,
}

impl MrSettings {
    /// Resolve settings relative to the library root
    ///
    /// Paths missing from the TOML default to `root/library.db`,
    /// `root/backups` and `root/covers`.
    pub fn resolve(toml_config: &TomlConfig, library_root: &Path) -> Self {
        let under_root = |configured: &Option<PathBuf>, default: &str| {
            configured
                .clone()
                .unwrap_or_else(|| library_root.join(default))
        };

        let min_confidence = match toml_config.min_confidence {
            Some(value) if (0.0..=100.0).contains(&value) => value,
            Some(value) => {
                warn!(
                    min_confidence = value,
                    "min_confidence outside 0-100, using default {}", DEFAULT_MIN_CONFIDENCE
                );
                DEFAULT_MIN_CONFIDENCE
            }
            None => DEFAULT_MIN_CONFIDENCE,
        };

        Self {
            library_root: library_root.to_path_buf(),
            database_path: under_root(&toml_config.database_path, "library.db"),
            backup_dir: under_root(&toml_config.backup_dir, "backups"),
            cover_cache_dir: under_root(&toml_config.cover_cache_dir, "covers"),
            acoustid_api_key: resolve_acoustid_api_key(toml_config),
            fpcalc_path: toml_config.fpcalc_path.clone(),
            min_confidence,
            catalogs: resolve_catalogs(toml_config),
        }
    }
}
