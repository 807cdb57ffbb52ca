//! Per-frame asset naming and loading.
//!
//! Each frame of a well position consists of three TIFF files:
//! a segmentation mask `feature_1_frame_<frame>.tif` under the mask root,
//! and two fluorescence channels `img_000000000_EGFP_<frame:03>.tif` and
//! `img_000000000_mCherry_<frame:03>.tif` under the data root. Images are
//! decoded to `f32` gray buffers on the normalized [0, 1] scale; the mask is
//! a per-pixel foreground probability on that scale.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};

use crate::error::{AnalysisError, Result};

/// Single-channel `f32` image buffer.
pub type GrayImageF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Paths to the three assets of one frame.
#[derive(Debug, Clone)]
pub struct FrameAssets {
    /// Segmentation mask probability map.
    pub mask: PathBuf,
    /// FITC (EGFP) fluorescence channel.
    pub fitc: PathBuf,
    /// Cherry fluorescence channel.
    pub cherry: PathBuf,
}

impl FrameAssets {
    /// Resolve asset paths for `frame` under a position's data and mask
    /// directories.
    pub fn locate(data_dir: &Path, mask_dir: &Path, frame: u32) -> Self {
        Self {
            mask: mask_dir.join(format!("feature_1_frame_{}.tif", frame)),
            fitc: data_dir.join(format!("img_000000000_EGFP_{:03}.tif", frame)),
            cherry: data_dir.join(format!("img_000000000_mCherry_{:03}.tif", frame)),
        }
    }

    /// Decode all three assets.
    pub fn load(&self) -> Result<FrameImages> {
        Ok(FrameImages {
            mask: load_gray32f(&self.mask)?,
            fitc: load_gray32f(&self.fitc)?,
            cherry: load_gray32f(&self.cherry)?,
        })
    }
}

/// Decoded images of one frame.
#[derive(Debug, Clone)]
pub struct FrameImages {
    /// Mask probability map.
    pub mask: GrayImageF32,
    /// FITC channel.
    pub fitc: GrayImageF32,
    /// Cherry channel.
    pub cherry: GrayImageF32,
}

/// Load a single-channel image as `f32` gray on the [0, 1] scale.
pub fn load_gray32f(path: &Path) -> Result<GrayImageF32> {
    if !path.exists() {
        return Err(AnalysisError::MissingAsset {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path).map_err(|e| AnalysisError::ImageDecode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(img.to_luma32f())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_assets_with_zero_padded_frame_numbers() {
        let assets = FrameAssets::locate(Path::new("/data/A7"), Path::new("/masks/A7"), 3);
        assert_eq!(
            assets.mask,
            Path::new("/masks/A7/feature_1_frame_3.tif")
        );
        assert_eq!(
            assets.fitc,
            Path::new("/data/A7/img_000000000_EGFP_003.tif")
        );
        assert_eq!(
            assets.cherry,
            Path::new("/data/A7/img_000000000_mCherry_003.tif")
        );
    }

    #[test]
    fn missing_asset_is_reported_with_its_path() {
        let err = load_gray32f(Path::new("/nonexistent/frame.tif")).unwrap_err();
        match err {
            AnalysisError::MissingAsset { path } => {
                assert_eq!(path, Path::new("/nonexistent/frame.tif"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
