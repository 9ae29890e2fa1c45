#![forbid(unsafe_code)]
//! `imgcmp` compares WebP renditions of one image across a sweep of quality levels.
//!
//! A [`SweepRequest`] names a source image, a step count in `[1, 10]`, a lossless toggle and an
//! optional libwebp preset. [`Comparator::run`] loads the matching engine (system `ffmpeg` or
//! in-process libwebp), reads the source once, and transcodes every quality point concurrently.
//! Points that fail are dropped from the [`SweepReport`]; engine-load and read failures abort
//! the run.

mod config;
mod encode;
mod engine;
mod foundation;
mod media;
mod session;
mod sweep;

pub use config::ComparatorConfig;
pub use encode::{
    params::{Quality, TranscodeParameters, WebpPreset},
    transcode::{STAGING_DIR, TranscodeResult, output_name, staged_input_name, transcode},
};
pub use engine::{
    backend::{EngineChoice, EngineVariant, TranscodeEngine},
    ffmpeg::{FfmpegEngine, FfmpegEngineOpts, ffmpeg_version, session_store, webp_argv},
    libwebp::{LibwebpEngine, WebpOptions, encode_webp},
    loader::{EngineFactory, EngineHandle, EngineLoader, SystemEngineFactory},
    store::{DirStore, MemoryStore, StagingStore, normalize_key},
};
pub use foundation::{
    error::{ImgcmpError, ImgcmpResult},
    mime::ImageMimeType,
};
pub use media::source::{SourceImage, normalize_file_name, read_as_bytes};
pub use session::comparator::{Comparator, SweepReport};
pub use sweep::{
    generation::SweepGenerations,
    plan::{MAX_STEPS, MIN_STEPS, SweepRequest, quality_steps},
    settle::{PointOutcome, settle_all, sweep, sweep_points},
};
