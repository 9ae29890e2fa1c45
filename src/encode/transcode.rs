use crate::{
    encode::params::{Quality, TranscodeParameters, WebpPreset},
    engine::backend::TranscodeEngine,
    foundation::{
        error::{ImgcmpError, ImgcmpResult},
        mime::ImageMimeType,
    },
    media::source::SourceImage,
};

/// Directory inside the engine namespace that holds staged sources.
pub const STAGING_DIR: &str = "images";

/// One WebP rendition of a source image.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TranscodeResult {
    /// Output file name, see [`output_name`].
    pub name: String,
    #[serde(skip)]
    pub output: Vec<u8>,
    pub size_bytes: u64,
    pub quality: Quality,
    pub lossless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<WebpPreset>,
}

impl TranscodeResult {
    pub fn mime(&self) -> ImageMimeType {
        ImageMimeType::Webp
    }

    /// Size in KiB, as shown in the comparison table.
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Staging key for a source: `images/<name>`.
pub fn staged_input_name(source: &SourceImage) -> String {
    format!("{STAGING_DIR}/{}", source.name())
}

/// Output file name for `name` encoded with `params`.
///
/// `cat.png` at quality 20, lossy, becomes `cat-q20-lossy.webp`; a preset appends `-p<preset>`.
pub fn output_name(name: &str, params: &TranscodeParameters) -> String {
    let mut out = format!(
        "{}-q{}-{}",
        strip_extension(name),
        params.quality,
        params.mode_label()
    );
    if let Some(preset) = params.preset {
        out.push_str("-p");
        out.push_str(preset.name());
    }
    out.push_str(".webp");
    out
}

// Drops a trailing `.ext` (one or more characters, no dot or slash).
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i + 1 < name.len() && !name[i + 1..].contains('/') => &name[..i],
        _ => name,
    }
}

/// Produce one WebP rendition of `source` through `engine`.
///
/// The source bytes are staged once per engine under [`staged_input_name`]; repeated calls for the
/// same source do not write them again. Engine failures surface as
/// [`ImgcmpError::TranscodeFailed`].
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(source = source.name(), engine = %engine.variant(), quality = %params.quality)
)]
pub async fn transcode(
    engine: &dyn TranscodeEngine,
    source: &SourceImage,
    bytes: &[u8],
    params: &TranscodeParameters,
) -> ImgcmpResult<TranscodeResult> {
    params.validate()?;

    let store = engine.store();
    let input = staged_input_name(source);
    if store.put_if_absent(&input, bytes).await? {
        tracing::debug!(%input, len = bytes.len(), "staged source");
    }

    let name = output_name(source.name(), params);
    engine
        .encode(&input, &name, params)
        .await
        .map_err(into_transcode_failure)?;

    let output = store
        .get(&name)
        .await?
        .ok_or_else(|| ImgcmpError::transcode(format!("engine produced no output '{name}'")))?;
    tracing::debug!(output = %name, size = output.len(), "transcoded");

    Ok(TranscodeResult {
        name,
        size_bytes: output.len() as u64,
        output,
        quality: params.quality,
        lossless: params.lossless,
        preset: params.preset,
    })
}

fn into_transcode_failure(err: ImgcmpError) -> ImgcmpError {
    match err {
        ImgcmpError::TranscodeFailed(_) => err,
        other => ImgcmpError::transcode(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/transcode.rs"]
mod tests;
