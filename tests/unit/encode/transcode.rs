use std::{collections::HashSet, io::Cursor};

use async_trait::async_trait;

use super::*;
use crate::engine::{
    backend::EngineVariant,
    libwebp::LibwebpEngine,
    store::{MemoryStore, StagingStore},
};

fn params(q: f64, lossless: bool) -> TranscodeParameters {
    TranscodeParameters::new(Quality::new(q).unwrap(), lossless)
}

fn png_source(name: &str, w: u32, h: u32) -> (SourceImage, Vec<u8>) {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 13) as u8, (y * 7) as u8, 200, 255])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    let source = SourceImage::from_bytes(name, "image/png", buf.clone()).unwrap();
    (source, buf)
}

#[derive(Debug, Default)]
struct BrokenEngine {
    store: MemoryStore,
}

#[async_trait]
impl TranscodeEngine for BrokenEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Ffmpeg
    }

    fn supports_preset(&self) -> bool {
        false
    }

    fn store(&self) -> &dyn StagingStore {
        &self.store
    }

    async fn encode(&self, _: &str, _: &str, _: &TranscodeParameters) -> ImgcmpResult<()> {
        Err(ImgcmpError::Other(anyhow::anyhow!("codec crashed")))
    }
}

/// Claims success but never writes the output key.
#[derive(Debug, Default)]
struct SilentEngine {
    store: MemoryStore,
}

#[async_trait]
impl TranscodeEngine for SilentEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Libwebp
    }

    fn supports_preset(&self) -> bool {
        true
    }

    fn store(&self) -> &dyn StagingStore {
        &self.store
    }

    async fn encode(&self, _: &str, _: &str, _: &TranscodeParameters) -> ImgcmpResult<()> {
        Ok(())
    }
}

#[test]
fn output_name_follows_pattern() {
    assert_eq!(output_name("cat.png", &params(20.0, false)), "cat-q20-lossy.webp");
    assert_eq!(output_name("cat.png", &params(100.0, true)), "cat-q100-lossless.webp");
    assert_eq!(
        output_name("cat.png", &params(50.0, false).with_preset(Some(WebpPreset::Photo))),
        "cat-q50-lossy-pphoto.webp"
    );
    assert_eq!(
        output_name("a.b.jpeg", &params(100.0 / 3.0, false)),
        "a.b-q33.333333333333336-lossy.webp"
    );
}

#[test]
fn only_the_last_extension_is_stripped() {
    assert_eq!(strip_extension("photo.png"), "photo");
    assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
    assert_eq!(strip_extension("noext"), "noext");
    assert_eq!(strip_extension("trailing."), "trailing.");
    assert_eq!(strip_extension(".hidden"), "");
}

#[test]
fn output_names_are_unique_across_parameters() {
    let mut seen = HashSet::new();
    let presets = std::iter::once(None).chain(WebpPreset::ALL.into_iter().map(Some));
    for preset in presets {
        for lossless in [false, true] {
            for n in 1..=10u32 {
                for i in 1..=n {
                    let q = f64::from(100 * i) / f64::from(n);
                    let p = params(q, lossless).with_preset(preset);
                    seen.insert((q.to_bits(), lossless, preset, output_name("img.png", &p)));
                }
            }
        }
    }
    let names: HashSet<_> = seen.iter().map(|(_, _, _, name)| name.clone()).collect();
    let keys: HashSet<_> = seen.iter().map(|(q, l, p, _)| (*q, *l, *p)).collect();
    assert_eq!(names.len(), keys.len());
}

#[test]
fn staged_input_lives_under_images() {
    let (source, _) = png_source("dir/cat.png", 1, 1);
    assert_eq!(staged_input_name(&source), "images/cat.png");
}

#[tokio::test]
async fn transcode_returns_webp_with_matching_size() {
    let engine = LibwebpEngine::new();
    let (source, bytes) = png_source("grad.png", 32, 24);

    let result = transcode(&engine, &source, &bytes, &params(40.0, false))
        .await
        .unwrap();
    assert_eq!(result.name, "grad-q40-lossy.webp");
    assert_eq!(result.mime(), ImageMimeType::Webp);
    assert_eq!(result.size_bytes, result.output.len() as u64);
    assert!(result.size_bytes > 0);
    assert_eq!(&result.output[0..4], b"RIFF");
    assert_eq!(&result.output[8..12], b"WEBP");
    assert_eq!(result.quality.get(), 40.0);
    assert!(!result.lossless);
}

#[tokio::test]
async fn staging_happens_once_per_source() {
    let engine = LibwebpEngine::new();
    let (source, bytes) = png_source("once.png", 8, 8);

    transcode(&engine, &source, &bytes, &params(20.0, false))
        .await
        .unwrap();
    // One staging write plus one output write.
    assert_eq!(engine.store().write_count(), 2);

    transcode(&engine, &source, &bytes, &params(60.0, true))
        .await
        .unwrap();
    assert_eq!(engine.store().write_count(), 3);
    assert!(engine.store().contains("images/once.png").await.unwrap());
}

#[tokio::test]
async fn engine_errors_become_transcode_failures() {
    let engine = BrokenEngine::default();
    let (source, bytes) = png_source("x.png", 2, 2);
    let err = transcode(&engine, &source, &bytes, &params(50.0, false))
        .await
        .unwrap_err();
    assert!(matches!(err, ImgcmpError::TranscodeFailed(ref msg) if msg.contains("codec crashed")));
}

#[tokio::test]
async fn missing_output_is_a_transcode_failure() {
    let engine = SilentEngine::default();
    let (source, bytes) = png_source("y.png", 2, 2);
    let err = transcode(&engine, &source, &bytes, &params(50.0, false))
        .await
        .unwrap_err();
    assert!(matches!(err, ImgcmpError::TranscodeFailed(_)));
}
