use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Feature switches resolved once at process start.
///
/// Copies of this struct are handed to the device registry and the extension
/// router when they are built; later edits to a config file never reach an
/// already constructed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Haptics speaker protection (feedback path) available
    pub haptics_protection: bool,
    /// Haptics actuator is driven through a WSA smart amplifier
    pub haptics_through_wsa: bool,
    pub hfp: bool,
    pub fm: bool,
    pub a2dp_source: bool,
    pub battery_listener: bool,
    pub compress_capture: bool,
}

impl FeatureFlags {
    /// Every optional feature switched on.
    pub fn all() -> Self {
        Self {
            haptics_protection: true,
            haptics_through_wsa: true,
            hfp: true,
            fm: true,
            a2dp_source: true,
            battery_listener: true,
            compress_capture: true,
        }
    }

    /// The protected haptics variant needs both switches.
    pub fn haptics_protected(&self) -> bool {
        self.haptics_protection && self.haptics_through_wsa
    }

    /// Map an extension feature name onto its flag. Unknown names are disabled.
    pub fn feature_enabled(&self, name: &str) -> bool {
        match name {
            "hfp" => self.hfp,
            "fm" => self.fm,
            "a2dp" => self.a2dp_source,
            "battery_listener" => self.battery_listener,
            "compress_capture" => self.compress_capture,
            _ => false,
        }
    }
}

/// On-disk configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalConfig {
    pub version: String,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Default for PalConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            features: FeatureFlags::default(),
        }
    }
}

impl PalConfig {
    /// Load the configuration, writing a default file first if none exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            Self::default().save(path)?;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: PalConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        log::info!("loaded config {} from {:?}: {:?}", config.version, path, config.features);
        Ok(config)
    }

    /// Write the configuration through a temporary file and an atomic rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).context("Failed to write temporary config file")?;

        fs::rename(&temp_path, path).context("Failed to atomically update config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_fields_default_to_disabled() {
        let config: PalConfig =
            serde_json::from_str(r#"{"version":"1.0","features":{"fm":true}}"#).unwrap();

        assert!(config.features.fm);
        assert!(!config.features.hfp);
        assert!(!config.features.haptics_protected());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pal.json");

        let config = PalConfig::load(&path).unwrap();
        assert_eq!(config, PalConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pal.json");

        let config = PalConfig {
            version: "2.0".to_string(),
            features: FeatureFlags::all(),
        };
        config.save(&path).unwrap();

        let loaded = PalConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_feature_name_lookup() {
        let flags = FeatureFlags {
            hfp: true,
            ..FeatureFlags::default()
        };

        assert!(flags.feature_enabled("hfp"));
        assert!(!flags.feature_enabled("fm"));
        assert!(!flags.feature_enabled("karaoke"));
    }
}
