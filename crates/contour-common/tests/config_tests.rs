//! Tests for loading `MarchingConfig` from disk.

use std::io::Write;
use std::path::PathBuf;

use contour_common::{ContourError, MarchingConfig};

#[test]
fn test_from_yaml_file_full() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "step_x: 16\nstep_y: 4\nsigma: 90\nmax_width: 1024\nmax_height: 512\ntemplate_dir: /opt/contours"
    )
    .unwrap();

    let config = MarchingConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.step_x, 16);
    assert_eq!(config.step_y, 4);
    assert_eq!(config.sigma, 90);
    assert_eq!(config.max_width, 1024);
    assert_eq!(config.max_height, 512);
    assert_eq!(config.template_dir, PathBuf::from("/opt/contours"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_yaml_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = MarchingConfig::from_yaml_file(dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, ContourError::Config(_)));
}

#[test]
fn test_config_serializes_to_json() {
    let json = serde_json::to_value(MarchingConfig::default()).unwrap();
    assert_eq!(json["sigma"], 200);
    assert_eq!(json["step_x"], 8);
}
