use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    engine::backend::EngineChoice,
    foundation::error::{ImgcmpError, ImgcmpResult},
    sweep::plan::{MAX_STEPS, MIN_STEPS},
};

/// Comparator settings, usually read from a JSON file.
///
/// Every field is optional in the file; missing fields take their [`Default`] value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparatorConfig {
    /// Which engine handles which source type.
    pub engine: EngineChoice,
    /// `ffmpeg` executable for the ffmpeg engine.
    pub ffmpeg_path: PathBuf,
    /// Parent directory for the ffmpeg engine's staging. Each engine stages into its own fresh
    /// subdirectory, removed when the engine is dropped. The system temp dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    /// Step count used when a sweep does not specify one.
    pub default_step_count: u8,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            engine: EngineChoice::Auto,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            workdir: None,
            default_step_count: 5,
        }
    }
}

impl ComparatorConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ImgcmpResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ImgcmpResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(ImgcmpError::validation("ffmpeg_path must be non-empty"));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.default_step_count) {
            return Err(ImgcmpError::validation(format!(
                "default_step_count must be in [{MIN_STEPS}, {MAX_STEPS}], got {}",
                self.default_step_count
            )));
        }
        if let Some(dir) = &self.workdir
            && dir.is_file()
        {
            return Err(ImgcmpError::validation(format!(
                "workdir '{}' is a file",
                dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
