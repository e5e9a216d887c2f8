use std::fs;

use audiopal::{FeatureFlags, PalConfig};
use tempfile::TempDir;

#[test]
fn test_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pal.json");
    let config = PalConfig {
        version: "1.0".to_string(),
        features: FeatureFlags {
            hfp: true,
            battery_listener: true,
            ..FeatureFlags::default()
        },
    };

    config.save(&path).unwrap();
    let loaded = PalConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn test_malformed_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pal.json");
    fs::write(&path, "{ not json").unwrap();

    let err = PalConfig::load(&path).unwrap_err();

    assert!(err.to_string().contains("parse"));
}

#[test]
fn test_feature_names_map_to_flags() {
    let flags = FeatureFlags {
        fm: true,
        a2dp_source: true,
        ..FeatureFlags::default()
    };

    assert!(flags.feature_enabled("fm"));
    assert!(flags.feature_enabled("a2dp"));
    assert!(!flags.feature_enabled("hfp"));
    assert!(!flags.feature_enabled("unknown"));
}
