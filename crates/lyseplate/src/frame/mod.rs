//! Frame analysis: region extraction composed with outlier rejection.

pub mod extract;
pub mod outlier;

pub use extract::{extract_regions, RegionStats};
pub use outlier::{morphology_fences, percentile, Fence, MorphologyFences};

use crate::assets::FrameAssets;
use crate::config::AnalysisConfig;
use crate::error::Result;

/// Paired channel means for one accepted region.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasurementPair {
    /// Mean FITC intensity, background-subtracted.
    pub fitc: f64,
    /// Mean Cherry intensity, background-subtracted.
    pub cherry: f64,
}

/// Analyze one frame: load its assets, extract regions, reject morphology
/// outliers, and yield the accepted (FITC, Cherry) mean pairs.
///
/// The returned iterator is finite and computed fresh per invocation; the
/// only side effect is reading the three asset files.
pub fn analyze_frame(
    assets: &FrameAssets,
    config: &AnalysisConfig,
) -> Result<impl Iterator<Item = MeasurementPair>> {
    let images = assets.load()?;
    let regions = extract::extract_regions(&images, &config.mask)?;
    let fences = outlier::morphology_fences(&regions, config.outlier.iqr_multiplier);
    Ok(regions
        .into_iter()
        .filter(move |r| fences.map_or(true, |f| f.accepts(r)))
        .map(|r| MeasurementPair {
            fitc: r.mean_fitc,
            cherry: r.mean_cherry,
        }))
}
