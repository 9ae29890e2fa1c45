use std::fmt;

use async_trait::async_trait;

use crate::{
    encode::params::TranscodeParameters,
    engine::store::StagingStore,
    foundation::{
        error::{ImgcmpError, ImgcmpResult},
        mime::ImageMimeType,
    },
};

/// Interchangeable transcoding runtimes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    /// System `ffmpeg` driven through a fixed argv.
    Ffmpeg,
    /// In-process libwebp driven through an options object.
    Libwebp,
}

impl EngineVariant {
    pub const ALL: [EngineVariant; 2] = [EngineVariant::Ffmpeg, EngineVariant::Libwebp];

    pub fn name(self) -> &'static str {
        match self {
            EngineVariant::Ffmpeg => "ffmpeg",
            EngineVariant::Libwebp => "libwebp",
        }
    }

    /// Pick the variant for a source of type `mime`.
    ///
    /// `Auto` routes GIF sources to ffmpeg, which keeps every frame of an animation; the
    /// in-process decoder only sees the first frame. Everything else stays in-process.
    pub fn select(choice: EngineChoice, mime: ImageMimeType) -> Self {
        match choice {
            EngineChoice::Ffmpeg => EngineVariant::Ffmpeg,
            EngineChoice::Libwebp => EngineVariant::Libwebp,
            EngineChoice::Auto => match mime {
                ImageMimeType::Gif => EngineVariant::Ffmpeg,
                _ => EngineVariant::Libwebp,
            },
        }
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-facing engine selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    #[default]
    Auto,
    Ffmpeg,
    Libwebp,
}

impl std::str::FromStr for EngineChoice {
    type Err = ImgcmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EngineChoice::Auto),
            "ffmpeg" => Ok(EngineChoice::Ffmpeg),
            "libwebp" => Ok(EngineChoice::Libwebp),
            other => Err(ImgcmpError::validation(format!(
                "unknown engine '{other}' (expected auto, ffmpeg or libwebp)"
            ))),
        }
    }
}

/// A loaded transcoding runtime.
///
/// Every engine owns a [`StagingStore`]: inputs are staged into it by name, `encode` reads the
/// input key and writes the output key, and the caller reads the output back. Multiple `encode`
/// calls may run concurrently against one engine.
#[async_trait]
pub trait TranscodeEngine: Send + Sync + fmt::Debug {
    fn variant(&self) -> EngineVariant;

    /// `false` once the runtime backing this handle is no longer usable.
    fn is_loaded(&self) -> bool {
        true
    }

    /// Whether [`TranscodeParameters::preset`] is honored.
    fn supports_preset(&self) -> bool;

    fn store(&self) -> &dyn StagingStore;

    /// Encode the staged `input` key to WebP under the `output` key.
    async fn encode(
        &self,
        input: &str,
        output: &str,
        params: &TranscodeParameters,
    ) -> ImgcmpResult<()>;
}

#[cfg(test)]
#[path = "../../tests/unit/engine/backend.rs"]
mod tests;
