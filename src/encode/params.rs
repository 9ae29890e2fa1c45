use std::{fmt, str::FromStr};

use crate::foundation::error::{ImgcmpError, ImgcmpResult};

/// Encoder quality in `(0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quality(f64);

impl Quality {
    pub const MAX: Quality = Quality(100.0);

    pub fn new(value: f64) -> ImgcmpResult<Self> {
        if !value.is_finite() || value <= 0.0 || value > 100.0 {
            return Err(ImgcmpError::validation(format!(
                "quality must be in (0, 100], got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Quality {
    type Error = ImgcmpError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for f64 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

// Shortest round-trip form: `20`, `33.333333333333336`, `100`. Output names and ffmpeg argv
// both rely on this exact text.
impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// libwebp encoder presets, numbered as in `WebPPreset`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WebpPreset {
    #[default]
    Default,
    Picture,
    Photo,
    Drawing,
    Icon,
    Text,
}

impl WebpPreset {
    pub const ALL: [WebpPreset; 6] = [
        WebpPreset::Default,
        WebpPreset::Picture,
        WebpPreset::Photo,
        WebpPreset::Drawing,
        WebpPreset::Icon,
        WebpPreset::Text,
    ];

    pub fn code(self) -> u8 {
        match self {
            WebpPreset::Default => 0,
            WebpPreset::Picture => 1,
            WebpPreset::Photo => 2,
            WebpPreset::Drawing => 3,
            WebpPreset::Icon => 4,
            WebpPreset::Text => 5,
        }
    }

    pub fn from_code(code: u8) -> ImgcmpResult<Self> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or_else(|| ImgcmpError::validation(format!("unknown webp preset code {code}")))
    }

    pub fn name(self) -> &'static str {
        match self {
            WebpPreset::Default => "default",
            WebpPreset::Picture => "picture",
            WebpPreset::Photo => "photo",
            WebpPreset::Drawing => "drawing",
            WebpPreset::Icon => "icon",
            WebpPreset::Text => "text",
        }
    }
}

impl fmt::Display for WebpPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either a preset name (`photo`) or its numeric code (`2`).
impl FromStr for WebpPreset {
    type Err = ImgcmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ImgcmpError::validation(format!("unknown webp preset '{s}'")))
    }
}

/// Parameters for one sweep point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscodeParameters {
    pub quality: Quality,
    pub lossless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<WebpPreset>,
}

impl TranscodeParameters {
    pub fn new(quality: Quality, lossless: bool) -> Self {
        Self {
            quality,
            lossless,
            preset: None,
        }
    }

    pub fn with_preset(mut self, preset: Option<WebpPreset>) -> Self {
        self.preset = preset;
        self
    }

    /// Re-check invariants for values built through struct literals or deserialization.
    pub fn validate(&self) -> ImgcmpResult<()> {
        Quality::new(self.quality.get()).map(|_| ())
    }

    pub fn mode_label(&self) -> &'static str {
        if self.lossless { "lossless" } else { "lossy" }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/params.rs"]
mod tests;
