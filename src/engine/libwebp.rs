use std::io::Cursor;

use async_trait::async_trait;

use crate::{
    encode::params::{TranscodeParameters, WebpPreset},
    engine::{
        backend::{EngineVariant, TranscodeEngine},
        store::{MemoryStore, StagingStore},
    },
    foundation::error::{ImgcmpError, ImgcmpResult},
};

/// Options object handed to libwebp for one encode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WebpOptions {
    /// libwebp `quality` (`Q`). For lossless output this is the compression effort.
    pub q: f32,
    pub lossless: bool,
    pub preset: Option<WebpPreset>,
}

impl From<&TranscodeParameters> for WebpOptions {
    fn from(p: &TranscodeParameters) -> Self {
        Self {
            q: p.quality.get() as f32,
            lossless: p.lossless,
            preset: p.preset,
        }
    }
}

/// In-process engine: `image` decodes the source, libwebp (via the `webp` crate) encodes it.
///
/// Encodes run on the blocking thread pool, so concurrent sweep points use separate threads.
#[derive(Debug, Default)]
pub struct LibwebpEngine {
    store: MemoryStore,
}

impl LibwebpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a 1x1 probe image to prove the codec is linked and working.
    pub async fn load() -> ImgcmpResult<Self> {
        let probe = tokio::task::spawn_blocking(|| -> ImgcmpResult<usize> {
            let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
            let mut png = Vec::new();
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| ImgcmpError::transcode(format!("encode probe image: {e}")))?;
            let opts = WebpOptions {
                q: 75.0,
                lossless: false,
                preset: None,
            };
            Ok(encode_webp(&png, &opts)?.len())
        })
        .await
        .map_err(|e| ImgcmpError::engine_load(EngineVariant::Libwebp, format!("probe task: {e}")))?;

        match probe {
            Ok(len) => {
                tracing::info!(probe_bytes = len, "libwebp engine ready");
                Ok(Self::new())
            }
            Err(e) => Err(ImgcmpError::engine_load(
                EngineVariant::Libwebp,
                e.to_string(),
            )),
        }
    }
}

#[async_trait]
impl TranscodeEngine for LibwebpEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Libwebp
    }

    fn supports_preset(&self) -> bool {
        true
    }

    fn store(&self) -> &dyn StagingStore {
        &self.store
    }

    async fn encode(
        &self,
        input: &str,
        output: &str,
        params: &TranscodeParameters,
    ) -> ImgcmpResult<()> {
        let src = self
            .store
            .get(input)
            .await?
            .ok_or_else(|| ImgcmpError::transcode(format!("no staged input '{input}'")))?;
        let opts = WebpOptions::from(params);
        tracing::debug!(?opts, input, output, "running libwebp");

        let webp = tokio::task::spawn_blocking(move || encode_webp(&src, &opts))
            .await
            .map_err(|e| ImgcmpError::transcode(format!("libwebp task: {e}")))??;
        self.store.put(output, &webp).await
    }
}

/// Decode `bytes` (any format `image` understands) and encode them as WebP.
pub fn encode_webp(bytes: &[u8], opts: &WebpOptions) -> ImgcmpResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ImgcmpError::transcode(format!("decode source image: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
    let mut config = webp::WebPConfig::new()
        .map_err(|_| ImgcmpError::transcode("libwebp rejected its default encoder config"))?;
    config.lossless = i32::from(opts.lossless);
    config.quality = opts.q;
    if let Some(preset) = opts.preset {
        apply_preset(&mut config, preset);
    }

    let mem = encoder
        .encode_advanced(&config)
        .map_err(|e| ImgcmpError::transcode(format!("libwebp encode failed: {e:?}")))?;
    Ok(mem.to_vec())
}

// Same tuning as libwebp's `WebPConfigPreset`.
fn apply_preset(config: &mut webp::WebPConfig, preset: WebpPreset) {
    match preset {
        WebpPreset::Default => {}
        WebpPreset::Picture => {
            config.sns_strength = 80;
            config.filter_sharpness = 4;
            config.filter_strength = 35;
            config.preprocessing &= !2;
        }
        WebpPreset::Photo => {
            config.sns_strength = 80;
            config.filter_sharpness = 3;
            config.filter_strength = 30;
            config.preprocessing |= 2;
        }
        WebpPreset::Drawing => {
            config.sns_strength = 25;
            config.filter_sharpness = 6;
            config.filter_strength = 10;
        }
        WebpPreset::Icon => {
            config.sns_strength = 0;
            config.filter_strength = 0;
            config.preprocessing &= !2;
        }
        WebpPreset::Text => {
            config.sns_strength = 0;
            config.filter_strength = 0;
            config.preprocessing &= !2;
            config.segments = 2;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/libwebp.rs"]
mod tests;
