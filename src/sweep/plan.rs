use crate::{
    encode::params::{Quality, TranscodeParameters, WebpPreset},
    foundation::error::{ImgcmpError, ImgcmpResult},
    media::source::SourceImage,
};

pub const MIN_STEPS: u8 = 1;
pub const MAX_STEPS: u8 = 10;

/// Evenly spaced quality levels for `step_count` sweep points.
///
/// Point `i` (1-based) gets `100 * i / step_count`, so the last point is exactly `100`.
pub fn quality_steps(step_count: u8) -> ImgcmpResult<Vec<Quality>> {
    if !(MIN_STEPS..=MAX_STEPS).contains(&step_count) {
        return Err(ImgcmpError::validation(format!(
            "step count must be in [{MIN_STEPS}, {MAX_STEPS}], got {step_count}"
        )));
    }
    let n = f64::from(step_count);
    (1..=step_count)
        .map(|i| Quality::new(100.0 * f64::from(i) / n))
        .collect()
}

/// One quality sweep over a source image.
#[derive(Clone, Debug)]
pub struct SweepRequest {
    pub source: SourceImage,
    pub step_count: u8,
    pub lossless: bool,
    pub preset: Option<WebpPreset>,
}

impl SweepRequest {
    pub fn new(source: SourceImage, step_count: u8) -> Self {
        Self {
            source,
            step_count,
            lossless: false,
            preset: None,
        }
    }

    pub fn lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn preset(mut self, preset: Option<WebpPreset>) -> Self {
        self.preset = preset;
        self
    }

    /// Parameters for every point, in ascending quality.
    pub fn parameters(&self) -> ImgcmpResult<Vec<TranscodeParameters>> {
        Ok(quality_steps(self.step_count)?
            .into_iter()
            .map(|q| TranscodeParameters::new(q, self.lossless).with_preset(self.preset))
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sweep/plan.rs"]
mod tests;
