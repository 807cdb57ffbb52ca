//! Per-position aggregation: frame pooling, classification and the well's
//! lysis ratio.

use std::path::PathBuf;

use crate::assets::FrameAssets;
use crate::classify::classify_infected;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::frame::{analyze_frame, MeasurementPair};
use crate::plate::{WellAnalysis, WellPosition};
use crate::ratio::partition;
use crate::strain::StrainTable;

/// Directory roots holding one plate's assets.
///
/// Infection and control samples are rooted separately, each with its own
/// mask tree; every root contains one subdirectory per well position.
#[derive(Debug, Clone)]
pub struct PlateDirs {
    /// Infection-sample channel images.
    pub infection: PathBuf,
    /// Uninfected-control channel images.
    pub control: PathBuf,
    /// Segmentation masks for the infection sample.
    pub infection_masks: PathBuf,
    /// Segmentation masks for the control sample.
    pub control_masks: PathBuf,
}

impl PlateDirs {
    fn infection_assets(&self, pos: WellPosition, frame: u32) -> FrameAssets {
        let name = pos.to_string();
        FrameAssets::locate(&self.infection.join(&name), &self.infection_masks.join(&name), frame)
    }

    fn control_assets(&self, pos: WellPosition, frame: u32) -> FrameAssets {
        let name = pos.to_string();
        FrameAssets::locate(&self.control.join(&name), &self.control_masks.join(&name), frame)
    }
}

/// Pooled measurement pairs for one well position.
#[derive(Debug, Clone, Default)]
pub struct PositionPools {
    /// Accepted pairs from the infection sample, all frames concatenated.
    pub infection: Vec<MeasurementPair>,
    /// Accepted pairs from the paired control sample.
    pub control: Vec<MeasurementPair>,
}

/// Pool frame measurements for one position.
///
/// Frames that fail to load are logged and skipped; the position only fails
/// when every frame of a sample is unusable. A frame with zero accepted
/// regions contributes nothing and is not an error.
pub fn pool_position(
    dirs: &PlateDirs,
    pos: WellPosition,
    config: &AnalysisConfig,
) -> Result<PositionPools> {
    let mut pools = PositionPools::default();
    let mut infection_ok = 0u32;
    let mut control_ok = 0u32;
    for frame in 0..config.frames_per_position {
        tracing::debug!("analyzing position {} frame {}", pos, frame);
        match analyze_frame(&dirs.infection_assets(pos, frame), config) {
            Ok(pairs) => {
                pools.infection.extend(pairs);
                infection_ok += 1;
            }
            Err(e) => {
                tracing::warn!("position {} frame {} (infection) skipped: {}", pos, frame, e)
            }
        }
        match analyze_frame(&dirs.control_assets(pos, frame), config) {
            Ok(pairs) => {
                pools.control.extend(pairs);
                control_ok += 1;
            }
            Err(e) => tracing::warn!("position {} frame {} (control) skipped: {}", pos, frame, e),
        }
    }
    if infection_ok == 0 {
        return Err(AnalysisError::NoUsableFrames {
            position: pos.to_string(),
            sample: "infection",
        });
    }
    if control_ok == 0 {
        return Err(AnalysisError::NoUsableFrames {
            position: pos.to_string(),
            sample: "control",
        });
    }
    Ok(pools)
}

/// Analyze one well position end to end.
///
/// Pools measurements from all frames, classifies both channels against the
/// control distributions, partitions the pool and computes the lysis ratio.
/// Strain resolution is a logging/plotting aid only; it never affects the
/// numeric output.
pub fn analyze_position(
    dirs: &PlateDirs,
    pos: WellPosition,
    plate: u32,
    strains: Option<&StrainTable>,
    config: &AnalysisConfig,
) -> Result<WellAnalysis> {
    let pools = pool_position(dirs, pos, config)?;

    let fitc_sample: Vec<f64> = pools.infection.iter().map(|p| p.fitc).collect();
    let cherry_sample: Vec<f64> = pools.infection.iter().map(|p| p.cherry).collect();
    let fitc_control: Vec<f64> = pools.control.iter().map(|p| p.fitc).collect();
    let cherry_control: Vec<f64> = pools.control.iter().map(|p| p.cherry).collect();

    let confidence = config.classifier.confidence;
    let fitc_flags = classify_infected(&fitc_control, &fitc_sample, confidence);
    let cherry_flags = classify_infected(&cherry_control, &cherry_sample, confidence);

    let part = partition(&pools.infection, &fitc_flags, &cherry_flags);
    let lysis_ratio = part.lysis_ratio();

    let strain = if config.verbose || config.plot.enable {
        strains.and_then(|t| t.strain_at(plate, pos).map(str::to_string))
    } else {
        None
    };

    if config.verbose {
        tracing::info!(
            "position {}: lysis {}, lysogeny {}, uninfected {}, ratio {:.4}",
            pos,
            part.lysis.len(),
            part.lysogeny.len(),
            part.uninfected.len(),
            lysis_ratio
        );
    }

    if config.plot.enable {
        if let Some(out_dir) = &config.plot.out_dir {
            let label = strain.clone().unwrap_or_else(|| pos.to_string());
            if let Err(e) =
                crate::plot::write_classified_scatter(&pools.infection, &part, &label, out_dir)
            {
                tracing::warn!("position {} scatter not written: {}", pos, e);
            }
        }
    }

    Ok(WellAnalysis {
        position: pos.to_string(),
        strain,
        n_measurements: pools.infection.len(),
        lysis_count: part.lysis.len(),
        lysogeny_count: part.lysogeny.len(),
        uninfected_count: part.uninfected.len(),
        lysis_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use std::path::Path;

    type Gray16 = ImageBuffer<Luma<u16>, Vec<u16>>;

    /// Write one frame's mask and channel TIFFs with a single bright square.
    fn write_frame(data_dir: &Path, mask_dir: &Path, frame: u32, fitc: u16, cherry: u16) {
        std::fs::create_dir_all(data_dir).unwrap();
        std::fs::create_dir_all(mask_dir).unwrap();
        let square = |value: u16| {
            Gray16::from_fn(16, 16, |x, y| {
                if (4..12).contains(&x) && (4..12).contains(&y) {
                    Luma([value])
                } else {
                    Luma([0u16])
                }
            })
        };
        square(u16::MAX)
            .save(mask_dir.join(format!("feature_1_frame_{}.tif", frame)))
            .unwrap();
        square(fitc)
            .save(data_dir.join(format!("img_000000000_EGFP_{:03}.tif", frame)))
            .unwrap();
        square(cherry)
            .save(data_dir.join(format!("img_000000000_mCherry_{:03}.tif", frame)))
            .unwrap();
    }

    fn test_config(frames: u32) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.frames_per_position = frames;
        config.mask.crop_left_px = 0;
        config.mask.crop_right_px = 0;
        config
    }

    fn test_dirs(root: &Path) -> PlateDirs {
        PlateDirs {
            infection: root.join("infection"),
            control: root.join("control"),
            infection_masks: root.join("masks"),
            control_masks: root.join("control_masks"),
        }
    }

    #[test]
    fn pools_concatenate_across_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let pos = WellPosition::parse("B3").unwrap();
        for frame in 0..3 {
            write_frame(
                &dirs.infection.join("B3"),
                &dirs.infection_masks.join("B3"),
                frame,
                40000,
                1000,
            );
            write_frame(
                &dirs.control.join("B3"),
                &dirs.control_masks.join("B3"),
                frame,
                1000,
                1000,
            );
        }
        let pools = pool_position(&dirs, pos, &test_config(3)).unwrap();
        assert_eq!(pools.infection.len(), 3);
        assert_eq!(pools.control.len(), 3);
        assert!(pools.infection.iter().all(|p| p.fitc > p.cherry));
    }

    #[test]
    fn missing_frames_are_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let pos = WellPosition::parse("B3").unwrap();
        // Only frames 0 and 2 of 4 exist.
        for frame in [0, 2] {
            write_frame(
                &dirs.infection.join("B3"),
                &dirs.infection_masks.join("B3"),
                frame,
                20000,
                1000,
            );
            write_frame(
                &dirs.control.join("B3"),
                &dirs.control_masks.join("B3"),
                frame,
                1000,
                1000,
            );
        }
        let pools = pool_position(&dirs, pos, &test_config(4)).unwrap();
        assert_eq!(pools.infection.len(), 2);
        assert_eq!(pools.control.len(), 2);
    }

    #[test]
    fn all_frames_missing_fails_the_position() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let pos = WellPosition::parse("D9").unwrap();
        let err = pool_position(&dirs, pos, &test_config(2)).unwrap_err();
        assert!(matches!(err, AnalysisError::NoUsableFrames { .. }));
    }

    #[test]
    fn identical_sample_and_control_scores_zero_ratio() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let pos = WellPosition::parse("A1").unwrap();
        for frame in 0..2 {
            write_frame(
                &dirs.infection.join("A1"),
                &dirs.infection_masks.join("A1"),
                frame,
                5000,
                5000,
            );
            write_frame(
                &dirs.control.join("A1"),
                &dirs.control_masks.join("A1"),
                frame,
                5000,
                5000,
            );
        }
        let analysis = analyze_position(&dirs, pos, 1, None, &test_config(2)).unwrap();
        assert_eq!(analysis.lysis_count, 0);
        assert_eq!(analysis.lysogeny_count, 0);
        assert_eq!(analysis.lysis_ratio, 0.0);
        assert_eq!(analysis.n_measurements, 2);
        assert_eq!(analysis.uninfected_count, 2);
    }
}
