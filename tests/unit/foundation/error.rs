use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ImgcmpError::unsupported_mime("text/plain")
            .to_string()
            .contains("unsupported mime type:")
    );
    assert!(
        ImgcmpError::engine_load(EngineVariant::Ffmpeg, "missing")
            .to_string()
            .contains("engine load failed: ffmpeg:")
    );
    assert!(ImgcmpError::read("x").to_string().contains("read error:"));
    assert!(
        ImgcmpError::transcode("x")
            .to_string()
            .contains("transcode failed:")
    );
    assert!(
        ImgcmpError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ImgcmpError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_engine_load_is_retryable() {
    assert!(ImgcmpError::engine_load(EngineVariant::Libwebp, "x").is_retryable());
    assert!(!ImgcmpError::read("x").is_retryable());
    assert!(!ImgcmpError::transcode("x").is_retryable());
    assert!(!ImgcmpError::unsupported_mime("x").is_retryable());
}
