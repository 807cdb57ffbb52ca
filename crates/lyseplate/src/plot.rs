//! Classified-measurement scatter rendering.
//!
//! One PNG per analyzed well: uninfected pairs in blue, lysis in green,
//! lysogeny in red, FITC on the x axis and Cherry on the y axis. Uses the
//! bitmap backend at a fixed 1200x800 resolution.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::frame::MeasurementPair;
use crate::ratio::Partition;

/// Output path for a well's scatter, named by its strain (or well) label.
pub fn scatter_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("{}_classified.png", label))
}

/// Axis range covering `values` with a small margin; a degenerate or empty
/// range widens to stay drawable.
fn axis_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    let margin = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - margin)..(max + margin)
}

/// Render the classified scatter for one well.
pub fn write_classified_scatter(
    pairs: &[MeasurementPair],
    part: &Partition,
    label: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = scatter_path(out_dir, label);

    let root = BitMapBackend::new(&path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AnalysisError::Plot(e.to_string()))?;

    let x_range = axis_range(pairs.iter().map(|p| p.fitc));
    let y_range = axis_range(pairs.iter().map(|p| p.cherry));

    let mut chart = ChartBuilder::on(&root)
        .caption(label, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| AnalysisError::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("FITC fluorescence")
        .y_desc("Cherry fluorescence")
        .label_style(("sans-serif", 25))
        .draw()
        .map_err(|e| AnalysisError::Plot(e.to_string()))?;

    for (indices, color) in [
        (&part.uninfected, BLUE),
        (&part.lysis, GREEN),
        (&part.lysogeny, RED),
    ] {
        chart
            .draw_series(
                indices
                    .iter()
                    .map(|&i| Circle::new((pairs[i].fitc, pairs[i].cherry), 3, color.filled())),
            )
            .map_err(|e| AnalysisError::Plot(e.to_string()))?;
    }

    root.present()
        .map_err(|e| AnalysisError::Plot(e.to_string()))?;
    Ok(path.clone())
}
