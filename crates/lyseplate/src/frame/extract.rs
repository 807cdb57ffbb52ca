//! Region extraction for one frame.
//!
//! The segmentation mask is binarized at a probability cutoff, cropped to
//! remove side artifacts, and topologically hole-filled. Each fluorescence
//! channel is normalized by subtracting its own background baseline, then
//! per-component statistics (area, eccentricity, mean intensity) are
//! accumulated in a single pass over the label image.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use nalgebra::Matrix2;

use crate::assets::{FrameImages, GrayImageF32};
use crate::config::MaskConfig;
use crate::error::{AnalysisError, Result};

/// Eigenvalues below this are treated as zero when deriving eccentricity.
const EIGEN_EPS: f64 = 1e-12;

/// Summary statistics for one connected component of the binarized mask.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct RegionStats {
    /// Component label in the frame's label image (1-based).
    pub label: u32,
    /// Pixel count.
    pub area: u32,
    /// Elongation in [0, 1): 0 for a disc, approaching 1 for a line.
    pub eccentricity: f64,
    /// Mean FITC intensity over the component, background-subtracted.
    pub mean_fitc: f64,
    /// Mean Cherry intensity over the component, background-subtracted.
    pub mean_cherry: f64,
}

/// Extract per-region statistics from one frame's mask and channel images.
///
/// Regions are returned in label order. An empty vector means the frame has
/// no segmented cells; that is not an error.
pub fn extract_regions(frame: &FrameImages, config: &MaskConfig) -> Result<Vec<RegionStats>> {
    let mask = crop_columns(&frame.mask, config.crop_left_px, config.crop_right_px)?;
    let fitc = crop_columns(&frame.fitc, config.crop_left_px, config.crop_right_px)?;
    let cherry = crop_columns(&frame.cherry, config.crop_left_px, config.crop_right_px)?;

    let expected = [mask.width(), mask.height()];
    for (channel, img) in [("FITC", &fitc), ("Cherry", &cherry)] {
        let got = [img.width(), img.height()];
        if got != expected {
            return Err(AnalysisError::ShapeMismatch {
                channel,
                expected,
                got,
            });
        }
    }

    let mut bin = binarize(&mask, config.probability_threshold);
    fill_holes(&mut bin);

    // Independent background baseline per channel, per frame.
    let fitc_baseline = background_mean(&bin, &fitc);
    let cherry_baseline = background_mean(&bin, &cherry);

    let labels = connected_components(&bin, Connectivity::Eight, Luma([0u8]));
    let n_labels = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    if n_labels == 0 {
        return Ok(Vec::new());
    }

    #[derive(Clone, Copy, Default)]
    struct Accum {
        count: u64,
        sum_x: f64,
        sum_y: f64,
        sum_xx: f64,
        sum_yy: f64,
        sum_xy: f64,
        sum_fitc: f64,
        sum_cherry: f64,
    }

    let mut acc = vec![Accum::default(); n_labels];
    let (w, h) = labels.dimensions();
    for y in 0..h {
        for x in 0..w {
            let label = labels.get_pixel(x, y).0[0];
            if label == 0 {
                continue;
            }
            let a = &mut acc[(label - 1) as usize];
            let xf = x as f64;
            let yf = y as f64;
            a.count += 1;
            a.sum_x += xf;
            a.sum_y += yf;
            a.sum_xx += xf * xf;
            a.sum_yy += yf * yf;
            a.sum_xy += xf * yf;
            a.sum_fitc += fitc.get_pixel(x, y).0[0] as f64;
            a.sum_cherry += cherry.get_pixel(x, y).0[0] as f64;
        }
    }

    let regions = acc
        .iter()
        .enumerate()
        .filter(|(_, a)| a.count > 0)
        .map(|(i, a)| {
            let n = a.count as f64;
            RegionStats {
                label: (i + 1) as u32,
                area: a.count as u32,
                eccentricity: eccentricity_from_moments(a.sum_x, a.sum_y, a.sum_xx, a.sum_yy, a.sum_xy, n),
                mean_fitc: a.sum_fitc / n - fitc_baseline,
                mean_cherry: a.sum_cherry / n - cherry_baseline,
            }
        })
        .collect();
    Ok(regions)
}

/// Drop `left` columns at the left edge and `right` at the right edge.
pub(crate) fn crop_columns(img: &GrayImageF32, left: u32, right: u32) -> Result<GrayImageF32> {
    let (w, h) = img.dimensions();
    if left as u64 + right as u64 >= w as u64 {
        return Err(AnalysisError::CropExceedsImage {
            width: w,
            left,
            right,
        });
    }
    let new_w = w - left - right;
    Ok(GrayImageF32::from_fn(new_w, h, |x, y| {
        *img.get_pixel(x + left, y)
    }))
}

/// Binarize a probability map: strictly above `threshold` is foreground.
fn binarize(mask: &GrayImageF32, threshold: f32) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Fill enclosed holes in a binary mask.
///
/// Background components (4-connectivity, the complement of the 8-connected
/// foreground) that do not touch the image border are enclosed by foreground
/// and become foreground.
fn fill_holes(bin: &mut GrayImage) {
    let (w, h) = bin.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let inverse = GrayImage::from_fn(w, h, |x, y| {
        if bin.get_pixel(x, y).0[0] == 0 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    let labels = connected_components(&inverse, Connectivity::Four, Luma([0u8]));
    let n_labels = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    if n_labels == 0 {
        return;
    }

    let mut touches_border = vec![false; n_labels + 1];
    for x in 0..w {
        touches_border[labels.get_pixel(x, 0).0[0] as usize] = true;
        touches_border[labels.get_pixel(x, h - 1).0[0] as usize] = true;
    }
    for y in 0..h {
        touches_border[labels.get_pixel(0, y).0[0] as usize] = true;
        touches_border[labels.get_pixel(w - 1, y).0[0] as usize] = true;
    }

    for y in 0..h {
        for x in 0..w {
            let label = labels.get_pixel(x, y).0[0];
            if label != 0 && !touches_border[label as usize] {
                bin.put_pixel(x, y, Luma([255u8]));
            }
        }
    }
}

/// Mean channel value over the background (inverse-mask) region.
///
/// A frame whose mask covers every pixel has no background; the baseline is
/// then zero.
fn background_mean(bin: &GrayImage, channel: &GrayImageF32) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for (m, c) in bin.pixels().zip(channel.pixels()) {
        if m.0[0] == 0 {
            sum += c.0[0] as f64;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Eccentricity from second central moments via the inertia tensor.
fn eccentricity_from_moments(
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
    n: f64,
) -> f64 {
    let cx = sum_x / n;
    let cy = sum_y / n;
    let mu20 = sum_xx / n - cx * cx;
    let mu02 = sum_yy / n - cy * cy;
    let mu11 = sum_xy / n - cx * cy;

    let eig = Matrix2::new(mu20, mu11, mu11, mu02).symmetric_eigenvalues();
    let l1 = eig[0].max(eig[1]).max(0.0);
    let l2 = eig[0].min(eig[1]).max(0.0);
    if l1 <= EIGEN_EPS {
        // Degenerate spread (single pixel): treat as circular.
        return 0.0;
    }
    (1.0 - l2 / l1).max(0.0).sqrt()
}
