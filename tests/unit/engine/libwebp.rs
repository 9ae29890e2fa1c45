use super::*;
use crate::encode::params::Quality;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 9) as u8, (y * 11) as u8, 128, 255])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

#[test]
fn options_object_mirrors_parameters() {
    let p = TranscodeParameters::new(Quality::new(60.0).unwrap(), true)
        .with_preset(Some(WebpPreset::Icon));
    let opts = WebpOptions::from(&p);
    assert_eq!(opts.q, 60.0);
    assert!(opts.lossless);
    assert_eq!(opts.preset, Some(WebpPreset::Icon));
}

#[test]
fn encode_webp_lossy_and_lossless() {
    let png = png_bytes(24, 24);
    for lossless in [false, true] {
        let out = encode_webp(
            &png,
            &WebpOptions {
                q: 50.0,
                lossless,
                preset: None,
            },
        )
        .unwrap();
        assert!(is_webp(&out));
    }
}

#[test]
fn every_preset_encodes() {
    let png = png_bytes(16, 16);
    for preset in WebpPreset::ALL {
        let out = encode_webp(
            &png,
            &WebpOptions {
                q: 80.0,
                lossless: false,
                preset: Some(preset),
            },
        )
        .unwrap();
        assert!(is_webp(&out), "{preset}");
    }
}

#[test]
fn encode_webp_rejects_garbage() {
    let err = encode_webp(
        b"definitely not an image",
        &WebpOptions {
            q: 50.0,
            lossless: false,
            preset: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ImgcmpError::TranscodeFailed(_)));
}

#[tokio::test]
async fn engine_encodes_between_store_keys() {
    let engine = LibwebpEngine::load().await.unwrap();
    assert_eq!(engine.variant(), EngineVariant::Libwebp);
    assert!(engine.supports_preset());
    assert!(engine.is_loaded());

    engine
        .store()
        .put_if_absent("images/p.png", &png_bytes(8, 8))
        .await
        .unwrap();
    let p = TranscodeParameters::new(Quality::new(30.0).unwrap(), false);
    engine.encode("images/p.png", "p-q30-lossy.webp", &p).await.unwrap();

    let out = engine.store().get("p-q30-lossy.webp").await.unwrap().unwrap();
    assert!(is_webp(&out));
}

#[tokio::test]
async fn engine_encode_without_staged_input_fails() {
    let engine = LibwebpEngine::new();
    let p = TranscodeParameters::new(Quality::MAX, false);
    let err = engine.encode("images/none.png", "none.webp", &p).await.unwrap_err();
    assert!(matches!(err, ImgcmpError::TranscodeFailed(_)));
}
