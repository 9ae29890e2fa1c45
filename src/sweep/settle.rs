use std::future::Future;

use futures::{StreamExt as _, stream::FuturesUnordered};

use crate::{
    encode::{
        params::Quality,
        transcode::{TranscodeResult, transcode},
    },
    engine::backend::TranscodeEngine,
    foundation::error::{ImgcmpError, ImgcmpResult},
    media::source::SourceImage,
    sweep::plan::SweepRequest,
};

/// Settled state of one sweep point.
#[derive(Debug)]
pub struct PointOutcome {
    pub quality: Quality,
    pub result: Result<TranscodeResult, ImgcmpError>,
}

impl PointOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Drive every future to completion concurrently and collect outputs in settle order.
///
/// A failing future never stops its siblings; failures are just values here.
pub async fn settle_all<I>(futures: I) -> Vec<<I::Item as Future>::Output>
where
    I: IntoIterator,
    I::Item: Future,
{
    futures
        .into_iter()
        .collect::<FuturesUnordered<_>>()
        .collect()
        .await
}

/// Run every point of `request` through `engine` at once and report each outcome.
///
/// Outcomes come back in settle order, each tagged with its own quality.
pub async fn sweep_points(
    engine: &dyn TranscodeEngine,
    source: &SourceImage,
    bytes: &[u8],
    request: &SweepRequest,
) -> ImgcmpResult<Vec<PointOutcome>> {
    let params = request.parameters()?;
    tracing::debug!(
        source = source.name(),
        points = params.len(),
        engine = %engine.variant(),
        "launching sweep"
    );
    Ok(settle_all(params.into_iter().map(|p| async move {
        PointOutcome {
            quality: p.quality,
            result: transcode(engine, source, bytes, &p).await,
        }
    }))
    .await)
}

/// [`sweep_points`], keeping only the successful renditions.
pub async fn sweep(
    engine: &dyn TranscodeEngine,
    source: &SourceImage,
    bytes: &[u8],
    request: &SweepRequest,
) -> ImgcmpResult<Vec<TranscodeResult>> {
    let outcomes = sweep_points(engine, source, bytes, request).await?;
    let requested = outcomes.len();
    let results: Vec<TranscodeResult> = outcomes
        .into_iter()
        .filter_map(|o| match o.result {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(quality = %o.quality, error = %e, "dropping failed sweep point");
                None
            }
        })
        .collect();
    tracing::info!(
        source = source.name(),
        requested,
        succeeded = results.len(),
        "sweep settled"
    );
    Ok(results)
}

#[cfg(test)]
#[path = "../../tests/unit/sweep/settle.rs"]
mod tests;
