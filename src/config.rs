use crate::utils::ScanError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scanner settings. Every field has a default, so a config file may be partial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Tesseract data directory; `None` lets Tesseract use `TESSDATA_PREFIX`.
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
    pub recognition_timeout_secs: u64,
    /// Where captures are staged before processing; defaults to the system temp dir.
    pub capture_dir: Option<PathBuf>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            tessdata_dir: None,
            language: "eng".to_string(),
            recognition_timeout_secs: 20,
            capture_dir: None,
        }
    }
}

impl ScannerConfig {
    /// Load a JSON config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ScanError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| ScanError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
                serde_json::from_str(&raw)
                    .map_err(|e| ScanError::ConfigError(format!("Invalid config {}: {}", path.display(), e)))?
            }
            None => ScannerConfig::default(),
        };
        config.validate()?;
        debug!("Loaded scanner config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.language.trim().is_empty() {
            return Err(ScanError::ConfigError("language must not be empty".to_string()));
        }
        if self.recognition_timeout_secs == 0 {
            return Err(ScanError::ConfigError("recognition_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }

    pub fn capture_dir(&self) -> PathBuf {
        self.capture_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::load(None).unwrap();
        assert_eq!(config.language, "eng");
        assert_eq!(config.recognition_timeout(), Duration::from_secs(20));
        assert_eq!(config.capture_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.json");
        std::fs::write(&path, r#"{ "language": "eng+hin", "tessdata_dir": "/opt/tessdata" }"#).unwrap();

        let config = ScannerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.language, "eng+hin");
        assert_eq!(config.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
        assert_eq!(config.recognition_timeout_secs, 20);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.json");
        std::fs::write(&path, r#"{ "recognition_timeout_secs": 0 }"#).unwrap();
        assert!(matches!(ScannerConfig::load(Some(&path)), Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.json");
        std::fs::write(&path, "{ language = eng }").unwrap();
        assert!(matches!(ScannerConfig::load(Some(&path)), Err(ScanError::ConfigError(_))));
    }
}
