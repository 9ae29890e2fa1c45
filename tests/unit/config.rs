use std::io::Write as _;

use super::*;

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    f
}

#[test]
fn defaults_are_valid() {
    let cfg = ComparatorConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.engine, EngineChoice::Auto);
    assert_eq!(cfg.default_step_count, 5);
    assert_eq!(cfg.ffmpeg_path, PathBuf::from("ffmpeg"));
}

#[test]
fn partial_file_fills_in_defaults() {
    let f = write_config(r#"{ "engine": "libwebp", "default_step_count": 3 }"#);
    let cfg = ComparatorConfig::from_path(f.path()).unwrap();
    assert_eq!(cfg.engine, EngineChoice::Libwebp);
    assert_eq!(cfg.default_step_count, 3);
    assert_eq!(cfg.workdir, None);
}

#[test]
fn unknown_fields_are_rejected() {
    let f = write_config(r#"{ "engnie": "ffmpeg" }"#);
    assert!(matches!(
        ComparatorConfig::from_path(f.path()),
        Err(ImgcmpError::Other(_))
    ));
}

#[test]
fn out_of_range_step_count_fails_validation() {
    let f = write_config(r#"{ "default_step_count": 12 }"#);
    assert!(matches!(
        ComparatorConfig::from_path(f.path()),
        Err(ImgcmpError::Validation(_))
    ));
}

#[test]
fn workdir_pointing_at_a_file_is_invalid() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let cfg = ComparatorConfig {
        workdir: Some(file.path().to_path_buf()),
        ..ComparatorConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(ImgcmpError::Validation(_))));
}

#[test]
fn missing_file_is_reported_with_path() {
    let err = ComparatorConfig::from_path("/nonexistent/imgcmp.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/imgcmp.json"));
}

#[test]
fn serializes_back_to_json() {
    let cfg = ComparatorConfig {
        engine: EngineChoice::Ffmpeg,
        ..ComparatorConfig::default()
    };
    let v = serde_json::to_value(&cfg).unwrap();
    assert_eq!(v["engine"], "ffmpeg");
    assert!(v.get("workdir").is_none());
}
