use std::sync::Arc;

use crate::{
    config::ComparatorConfig,
    encode::transcode::TranscodeResult,
    engine::{
        backend::EngineVariant,
        loader::{EngineFactory, EngineLoader},
    },
    foundation::error::ImgcmpResult,
    media::source::read_as_bytes,
    sweep::{generation::SweepGenerations, plan::SweepRequest, settle::sweep},
};

/// Outcome of one [`Comparator::run`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct SweepReport {
    pub generation: u64,
    /// Number of points the sweep launched.
    pub requested: usize,
    /// Successful renditions in settle order.
    pub results: Vec<TranscodeResult>,
}

impl SweepReport {
    /// Points that failed and were left out of `results`.
    pub fn failed(&self) -> usize {
        self.requested.saturating_sub(self.results.len())
    }

    pub fn sort_by_quality(&mut self) {
        self.results.sort_by(|a, b| a.quality.get().total_cmp(&b.quality.get()));
    }
}

/// Ties the engine loader, the materializer and the sweep together.
///
/// Engine-load and read failures abort a run; failed sweep points are only omitted.
#[derive(Debug)]
pub struct Comparator {
    config: ComparatorConfig,
    loader: EngineLoader,
    generations: SweepGenerations,
}

impl Comparator {
    /// Comparator over the real engines.
    pub fn new(config: ComparatorConfig) -> ImgcmpResult<Self> {
        config.validate()?;
        let loader = EngineLoader::system(&config);
        Ok(Self::with_loader(config, loader))
    }

    /// Comparator over engines built by `factory`.
    pub fn with_factory(config: ComparatorConfig, factory: Arc<dyn EngineFactory>) -> Self {
        let loader = EngineLoader::new(factory, config.engine);
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: ComparatorConfig, loader: EngineLoader) -> Self {
        Self {
            config,
            loader,
            generations: SweepGenerations::new(),
        }
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    pub fn loader(&self) -> &EngineLoader {
        &self.loader
    }

    pub async fn run(&self, request: SweepRequest) -> ImgcmpResult<SweepReport> {
        let generation = self.generations.begin();
        let requested = request.parameters()?.len();

        let engine = self.loader.engine_for(request.source.mime()).await?;
        if request.source.mime().may_be_animated() && engine.variant() == EngineVariant::Libwebp {
            tracing::debug!(
                source = request.source.name(),
                "libwebp engine encodes the first frame of animated sources"
            );
        }
        let bytes = read_as_bytes(&request.source).await?;
        tracing::info!(
            generation,
            source = request.source.name(),
            mime = %request.source.mime(),
            engine = %engine.variant(),
            steps = requested,
            lossless = request.lossless,
            "starting sweep"
        );

        let results = sweep(engine.as_ref(), &request.source, &bytes, &request).await?;
        Ok(SweepReport {
            generation,
            requested,
            results,
        })
    }

    /// Whether `report` belongs to the most recent sweep.
    pub fn is_current(&self, report: &SweepReport) -> bool {
        self.generations.is_current(report.generation)
    }

    /// Keep `report` only if no newer sweep has started since it began.
    pub fn accept(&self, report: SweepReport) -> Option<SweepReport> {
        if self.is_current(&report) {
            Some(report)
        } else {
            tracing::debug!(
                generation = report.generation,
                latest = self.generations.latest(),
                "discarding superseded sweep"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/comparator.rs"]
mod tests;
