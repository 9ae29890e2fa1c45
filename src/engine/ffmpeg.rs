use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    encode::params::TranscodeParameters,
    engine::{
        backend::{EngineVariant, TranscodeEngine},
        store::{DirStore, StagingStore},
    },
    foundation::error::{ImgcmpError, ImgcmpResult},
};

/// Options for [`FfmpegEngine`].
#[derive(Clone, Debug)]
pub struct FfmpegEngineOpts {
    /// `ffmpeg` executable, resolved through `PATH` when not absolute.
    pub bin: PathBuf,
    /// Parent for the engine's per-session staging directory. The system temp dir when `None`.
    pub workdir: Option<PathBuf>,
}

impl Default for FfmpegEngineOpts {
    fn default() -> Self {
        Self {
            bin: PathBuf::from("ffmpeg"),
            workdir: None,
        }
    }
}

/// Engine that shells out to the system `ffmpeg` binary with the `libwebp` encoder.
///
/// The engine namespace is a directory; `ffmpeg` runs with it as the current directory so the
/// argv carries the bare staging keys.
#[derive(Debug)]
pub struct FfmpegEngine {
    bin: PathBuf,
    store: DirStore,
}

impl FfmpegEngine {
    /// Probe the binary for the `libwebp` encoder and prepare the working directory.
    pub async fn load(opts: FfmpegEngineOpts) -> ImgcmpResult<Self> {
        let variant = EngineVariant::Ffmpeg;
        let version = ffmpeg_version(&opts.bin).await?;

        let out = Command::new(&opts.bin)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ImgcmpError::engine_load(
                    variant,
                    format!("failed to spawn '{}': {e}", opts.bin.display()),
                )
            })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ImgcmpError::engine_load(
                variant,
                format!("encoder probe exited with status {}: {}", out.status, stderr.trim()),
            ));
        }
        if !lists_libwebp_encoder(&String::from_utf8_lossy(&out.stdout)) {
            return Err(ImgcmpError::engine_load(
                variant,
                format!("'{}' was built without the libwebp encoder", opts.bin.display()),
            ));
        }

        let store = session_store(opts.workdir.as_deref())
            .map_err(|e| ImgcmpError::engine_load(variant, e.to_string()))?;

        tracing::info!(
            bin = %opts.bin.display(),
            %version,
            workdir = %store.root().display(),
            "ffmpeg engine ready"
        );
        Ok(Self::with_store(opts.bin, store))
    }

    /// Build an engine over an existing store without probing the binary.
    pub fn with_store(bin: impl Into<PathBuf>, store: DirStore) -> Self {
        Self {
            bin: bin.into(),
            store,
        }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    pub fn workdir(&self) -> &Path {
        self.store.root()
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Ffmpeg
    }

    fn is_loaded(&self) -> bool {
        self.store.root().is_dir()
    }

    fn supports_preset(&self) -> bool {
        false
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
        if let Some(preset) = params.preset {
            tracing::debug!(%preset, "ffmpeg engine ignores webp presets");
        }

        // Without `-y` ffmpeg refuses to replace an existing file; a repeated request for the
        // same parameters must not fail on its own previous output.
        self.store.remove(output).await?;

        let argv = webp_argv(input, output, params);
        tracing::debug!(?argv, "running ffmpeg");

        let out = Command::new(&self.bin)
            .args(&argv)
            .current_dir(self.store.root())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ImgcmpError::transcode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ImgcmpError::transcode(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// The fixed ffmpeg argument list for one WebP transcode.
///
/// Order matters to ffmpeg: options before `-i` apply to the input, the rest to the output.
pub fn webp_argv(input: &str, output: &str, params: &TranscodeParameters) -> Vec<String> {
    vec![
        "-i".to_string(),
        path_arg(input),
        "-c:v".to_string(),
        "libwebp".to_string(),
        "-lossless".to_string(),
        if params.lossless { "1" } else { "0" }.to_string(),
        "-quality".to_string(),
        params.quality.to_string(),
        path_arg(output),
    ]
}

// ffmpeg reads a leading `-` as an option; `./-x.webp` names the same file.
fn path_arg(key: &str) -> String {
    if key.starts_with('-') {
        format!("./{key}")
    } else {
        key.to_string()
    }
}

/// Staging namespace for one engine instance.
///
/// With a configured `workdir` the namespace is a fresh subdirectory of it, removed when the
/// engine is dropped, so sources staged by an earlier session are never picked up again.
pub fn session_store(workdir: Option<&Path>) -> ImgcmpResult<DirStore> {
    match workdir {
        Some(dir) => DirStore::scratch_in(dir, "session-"),
        None => DirStore::scratch("imgcmp-ffmpeg-"),
    }
}

fn lists_libwebp_encoder(encoders: &str) -> bool {
    encoders
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some("libwebp"))
}

/// First line of `<bin> -version`, e.g. `ffmpeg version 6.1.1 Copyright (c) ...`.
pub async fn ffmpeg_version(bin: &Path) -> ImgcmpResult<String> {
    let variant = EngineVariant::Ffmpeg;
    let out = Command::new(bin)
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            ImgcmpError::engine_load(
                variant,
                format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    bin.display()
                ),
            )
        })?;
    if !out.status.success() {
        return Err(ImgcmpError::engine_load(
            variant,
            format!("'{} -version' exited with status {}", bin.display(), out.status),
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/engine/ffmpeg.rs"]
mod tests;
