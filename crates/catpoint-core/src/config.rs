//! Configuration types for Catpoint.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CatpointError;
use crate::image::{FakeImageService, ImageService, StaticImageService};
use crate::Result;

/// Top-level configuration, usually read from `catpoint.toml`.
///
/// Every section has defaults, so an empty file (or no file) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatpointConfig {
    /// Where sensors and statuses are stored.
    pub storage: StorageConfig,

    /// Which cat detector analyses camera images.
    pub detector: DetectorConfig,
}

impl CatpointConfig {
    /// Reads a TOML configuration file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `CatpointError::Config` if the file exists but cannot be read
    /// or is not valid TOML for this schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| CatpointError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CatpointError::Config(e.to_string()))
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the Sled database directory.
    pub db_path: PathBuf,

    /// Keep state in memory only; nothing survives the process.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./catpoint.db"),
            in_memory: false,
        }
    }
}

/// Cat detector selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Coin flip per image.
    #[default]
    Random,
    /// Every image contains a cat.
    Always,
    /// No image contains a cat.
    Never,
}

/// Cat detector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detector implementation.
    pub kind: DetectorKind,

    /// Seed for the random detector, for reproducible sessions.
    pub seed: Option<u64>,
}

impl DetectorConfig {
    /// Builds the configured image service.
    pub fn build(&self) -> Box<dyn ImageService> {
        match self.kind {
            DetectorKind::Random => match self.seed {
                Some(seed) => Box::new(FakeImageService::with_seed(seed)),
                None => Box::new(FakeImageService::new()),
            },
            DetectorKind::Always => Box::new(StaticImageService::new(true)),
            DetectorKind::Never => Box::new(StaticImageService::new(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CameraImage;

    #[test]
    fn test_default_config() {
        let config = CatpointConfig::default();
        assert_eq!(config.storage.db_path, PathBuf::from("./catpoint.db"));
        assert!(!config.storage.in_memory);
        assert_eq!(config.detector.kind, DetectorKind::Random);
        assert!(config.detector.seed.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CatpointConfig::from_toml(
            r#"
            [detector]
            kind = "always"
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.kind, DetectorKind::Always);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let config = CatpointConfig::from_toml(
            r#"
            [storage]
            db_path = "/var/lib/catpoint"
            in_memory = true

            [detector]
            kind = "random"
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.db_path, PathBuf::from("/var/lib/catpoint"));
        assert!(config.storage.in_memory);
        assert_eq!(config.detector.seed, Some(42));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = CatpointConfig::from_toml("[detector]\nkind = \"sometimes\"");
        assert!(matches!(result, Err(CatpointError::Config(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CatpointConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CatpointConfig::default());
    }

    #[test]
    fn test_static_detectors_from_config() {
        let image = CameraImage::new(vec![0xFF, 0xD8]);

        let always = DetectorConfig {
            kind: DetectorKind::Always,
            seed: None,
        };
        assert!(always.build().image_contains_cat(&image, 70.0).unwrap());

        let never = DetectorConfig {
            kind: DetectorKind::Never,
            seed: None,
        };
        assert!(!never.build().image_contains_cat(&image, 70.0).unwrap());
    }

    #[test]
    fn test_config_serialization() {
        let config = CatpointConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CatpointConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
