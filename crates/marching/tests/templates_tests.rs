//! Tests for loading and saving contour template assets.

use contour_common::{ContourError, Image, Rgb};
use marching::codec::save_image;
use marching::{ContourCode, ContourTemplateSet};
use test_utils::Workspace;

#[test]
fn test_builtin_set_survives_disk() {
    let ws = Workspace::new();
    let builtin = ContourTemplateSet::builtin(8, 8).unwrap();
    builtin.save_to_dir(ws.templates()).unwrap();

    for code in 0..16 {
        assert!(ws.templates().join(format!("{}.ppm", code)).exists());
    }

    let loaded = ContourTemplateSet::load(ws.templates(), 8, 8).unwrap();
    for code in ContourCode::all() {
        assert_eq!(loaded.lookup(code), builtin.lookup(code), "code {}", code.value());
    }
}

#[test]
fn test_missing_template_fails_closed() {
    let ws = Workspace::new();
    ContourTemplateSet::builtin(8, 8)
        .unwrap()
        .save_to_dir(ws.templates())
        .unwrap();
    std::fs::remove_file(ws.templates().join("11.ppm")).unwrap();

    let err = ContourTemplateSet::load(ws.templates(), 8, 8).unwrap_err();
    assert!(matches!(err, ContourError::TemplateLoad { code: 11, .. }));
}

#[test]
fn test_corrupt_template_fails_closed() {
    let ws = Workspace::new();
    ContourTemplateSet::builtin(8, 8)
        .unwrap()
        .save_to_dir(ws.templates())
        .unwrap();
    std::fs::write(ws.templates().join("0.ppm"), b"P6\n8 8\n255\nshort").unwrap();

    let err = ContourTemplateSet::load(ws.templates(), 8, 8).unwrap_err();
    assert!(matches!(err, ContourError::TemplateLoad { code: 0, .. }));
}

#[test]
fn test_wrong_sized_template_rejected() {
    let ws = Workspace::new();
    ContourTemplateSet::builtin(8, 8)
        .unwrap()
        .save_to_dir(ws.templates())
        .unwrap();
    let big = Image::new(16, 8, Rgb::WHITE).unwrap();
    save_image(&big, ws.templates().join("4.ppm")).unwrap();

    let err = ContourTemplateSet::load(ws.templates(), 8, 8).unwrap_err();
    assert!(matches!(
        err,
        ContourError::TemplateSize {
            code: 4,
            actual_width: 16,
            ..
        }
    ));
}

#[test]
fn test_missing_directory() {
    let ws = Workspace::new();
    let err = ContourTemplateSet::load(ws.root().join("absent"), 8, 8).unwrap_err();
    assert!(matches!(err, ContourError::TemplateLoad { code: 0, .. }));
}
