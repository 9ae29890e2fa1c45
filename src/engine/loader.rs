use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt as _, Shared};
use tokio::sync::Mutex;

use crate::{
    config::ComparatorConfig,
    engine::{
        backend::{EngineChoice, EngineVariant, TranscodeEngine},
        ffmpeg::{FfmpegEngine, FfmpegEngineOpts},
        libwebp::LibwebpEngine,
    },
    foundation::{
        error::{ImgcmpError, ImgcmpResult},
        mime::ImageMimeType,
    },
};

/// Shared handle to a loaded engine.
pub type EngineHandle = Arc<dyn TranscodeEngine>;

/// Builds engine instances for the loader.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn load(&self, variant: EngineVariant) -> ImgcmpResult<EngineHandle>;
}

/// Factory for the real engines: system `ffmpeg` and in-process libwebp.
#[derive(Clone, Debug, Default)]
pub struct SystemEngineFactory {
    pub ffmpeg: FfmpegEngineOpts,
}

impl SystemEngineFactory {
    pub fn from_config(cfg: &ComparatorConfig) -> Self {
        Self {
            ffmpeg: FfmpegEngineOpts {
                bin: cfg.ffmpeg_path.clone(),
                workdir: cfg.workdir.clone(),
            },
        }
    }
}

#[async_trait]
impl EngineFactory for SystemEngineFactory {
    async fn load(&self, variant: EngineVariant) -> ImgcmpResult<EngineHandle> {
        Ok(match variant {
            EngineVariant::Ffmpeg => Arc::new(FfmpegEngine::load(self.ffmpeg.clone()).await?),
            EngineVariant::Libwebp => Arc::new(LibwebpEngine::load().await?),
        })
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<EngineHandle, String>>>;

enum Slot {
    Loading(LoadFuture),
    Ready(EngineHandle),
}

enum Lookup {
    Join(LoadFuture),
    Settled(EngineHandle),
    Start,
}

/// Lazily loads and memoizes one engine per [`EngineVariant`].
///
/// Concurrent requests for a variant that is not ready yet all await a single in-flight load.
/// A failed load is reported to every waiter and then forgotten, so the next request starts a
/// fresh attempt.
pub struct EngineLoader {
    factory: Arc<dyn EngineFactory>,
    choice: EngineChoice,
    slots: Mutex<HashMap<EngineVariant, Slot>>,
    attempts: AtomicUsize,
}

impl std::fmt::Debug for EngineLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLoader")
            .field("choice", &self.choice)
            .field("attempts", &self.load_attempts())
            .finish()
    }
}

impl EngineLoader {
    pub fn new(factory: Arc<dyn EngineFactory>, choice: EngineChoice) -> Self {
        Self {
            factory,
            choice,
            slots: Mutex::new(HashMap::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Loader over the real engines, configured from `cfg`.
    pub fn system(cfg: &ComparatorConfig) -> Self {
        Self::new(Arc::new(SystemEngineFactory::from_config(cfg)), cfg.engine)
    }

    pub fn choice(&self) -> EngineChoice {
        self.choice
    }

    /// Number of load sequences started so far, across all variants.
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Engine for a source of type `mime`, per the configured [`EngineChoice`].
    pub async fn engine_for(&self, mime: ImageMimeType) -> ImgcmpResult<EngineHandle> {
        self.get_engine(EngineVariant::select(self.choice, mime)).await
    }

    /// `true` when `variant` is loaded and would be returned without loading.
    pub async fn is_ready(&self, variant: EngineVariant) -> bool {
        matches!(
            self.slots.lock().await.get(&variant),
            Some(Slot::Ready(engine)) if engine.is_loaded()
        )
    }

    pub async fn get_engine(&self, variant: EngineVariant) -> ImgcmpResult<EngineHandle> {
        let pending = {
            let mut slots = self.slots.lock().await;
            let lookup = match slots.get(&variant) {
                Some(Slot::Ready(engine)) if engine.is_loaded() => return Ok(Arc::clone(engine)),
                Some(Slot::Loading(fut)) => match fut.peek() {
                    None => Lookup::Join(fut.clone()),
                    Some(Ok(engine)) if engine.is_loaded() => Lookup::Settled(Arc::clone(engine)),
                    // Resolved, but every waiter went away before settling the slot.
                    Some(_) => Lookup::Start,
                },
                _ => Lookup::Start,
            };
            match lookup {
                Lookup::Join(fut) => fut,
                Lookup::Settled(engine) => {
                    slots.insert(variant, Slot::Ready(Arc::clone(&engine)));
                    return Ok(engine);
                }
                Lookup::Start => {
                    let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::info!(%variant, attempt, "loading engine");
                    let factory = Arc::clone(&self.factory);
                    let fut = async move {
                        factory.load(variant).await.map_err(|e| match e {
                            ImgcmpError::EngineLoadFailed { reason, .. } => reason,
                            other => other.to_string(),
                        })
                    }
                    .boxed()
                    .shared();
                    slots.insert(variant, Slot::Loading(fut.clone()));
                    fut
                }
            }
        };

        let outcome = pending.clone().await;

        let mut slots = self.slots.lock().await;
        // Only the load that currently occupies the slot may settle it; a later attempt may
        // already have replaced a failed one.
        let owns_slot = matches!(
            slots.get(&variant),
            Some(Slot::Loading(fut)) if fut.ptr_eq(&pending)
        );
        match outcome {
            Ok(engine) => {
                if owns_slot {
                    slots.insert(variant, Slot::Ready(Arc::clone(&engine)));
                }
                Ok(engine)
            }
            Err(reason) => {
                if owns_slot {
                    slots.remove(&variant);
                    tracing::warn!(%variant, %reason, "engine load failed");
                }
                Err(ImgcmpError::engine_load(variant, reason))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/loader.rs"]
mod tests;
