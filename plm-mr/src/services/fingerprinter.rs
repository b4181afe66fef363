//! Audio fingerprinting via the Chromaprint `fpcalc` binary
//!
//! The binary is taken from configuration when given, otherwise searched
//! on `PATH`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[cfg(windows)]
const FPCALC_BINARY: &str = "fpcalc.exe";
#[cfg(not(windows))]
const FPCALC_BINARY: &str = "fpcalc";

/// Fingerprinting errors
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("fpcalc binary not found")]
    BinaryNotFound,

    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    #[error("fpcalc failed: {0}")]
    ExecutionError(String),

    #[error("Failed to parse fpcalc output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// `fpcalc -json` output
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fingerprint {
    /// Seconds
    pub duration: f64,
    pub fingerprint: String,
}

/// Locate fpcalc: configured path if it exists, else `PATH`
pub fn locate_fpcalc(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured fpcalc path does not exist, searching PATH");
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(FPCALC_BINARY))
        .find(|candidate| candidate.is_file())
}

/// Parse `fpcalc -json` stdout
pub fn parse_fpcalc_output(stdout: &str) -> Result<Fingerprint, FingerprintError> {
    let fingerprint: Fingerprint = serde_json::from_str(stdout.trim())
        .map_err(|e| FingerprintError::ParseError(e.to_string()))?;

    if fingerprint.fingerprint.is_empty() {
        return Err(FingerprintError::ParseError("empty fingerprint".to_string()));
    }

    Ok(fingerprint)
}

/// Chromaprint fingerprinter
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    binary_path: PathBuf,
}

impl Fingerprinter {
    /// Create a fingerprinter; `BinaryNotFound` when fpcalc cannot be located
    pub fn new(configured: Option<&Path>) -> Result<Self, FingerprintError> {
        let binary_path = locate_fpcalc(configured).ok_or(FingerprintError::BinaryNotFound)?;
        Ok(Self { binary_path })
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Fingerprint an audio file
    pub async fn fingerprint_file(&self, audio_path: &Path) -> Result<Fingerprint, FingerprintError> {
        if !audio_path.exists() {
            return Err(FingerprintError::FileNotFound(
                audio_path.display().to_string(),
            ));
        }

        tracing::debug!(audio_file = %audio_path.display(), "Running fpcalc");

        let output = Command::new(&self.binary_path)
            .arg("-json")
            .arg(audio_path)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FingerprintError::BinaryNotFound,
                _ => FingerprintError::ExecutionError(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FingerprintError::ExecutionError(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let fingerprint = parse_fpcalc_output(&String::from_utf8_lossy(&output.stdout))?;

        tracing::debug!(
            audio_file = %audio_path.display(),
            duration = fingerprint.duration,
            "Fingerprint generated"
        );

        Ok(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output() {
        let stdout = r#"{"duration": 301.47, "fingerprint": "AQADtEmUaEkSRZEGAAAAAA"}"#;
        let fp = parse_fpcalc_output(stdout).unwrap();
        assert_eq!(fp.duration, 301.47);
        assert_eq!(fp.fingerprint, "AQADtEmUaEkSRZEGAAAAAA");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_fpcalc_output("ERROR: could not open file"),
            Err(FingerprintError::ParseError(_))
        ));
        assert!(matches!(
            parse_fpcalc_output(r#"{"duration": 1.0, "fingerprint": ""}"#),
            Err(FingerprintError::ParseError(_))
        ));
    }

    #[test]
    fn test_configured_path_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-fpcalc");
        std::fs::write(&fake, b"").unwrap();
        assert_eq!(locate_fpcalc(Some(&fake)), Some(fake.clone()));
        assert_eq!(Fingerprinter::new(Some(&fake)).unwrap().binary_path(), fake.as_path());
    }

    #[tokio::test]
    async fn test_missing_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fpcalc");
        std::fs::write(&fake, b"").unwrap();
        let fingerprinter = Fingerprinter::new(Some(&fake)).unwrap();
        let result = fingerprinter
            .fingerprint_file(&dir.path().join("missing.mp3"))
            .await;
        assert!(matches!(result, Err(FingerprintError::FileNotFound(_))));
    }
}
