//! Analysis configuration.
//!
//! All tuning enters through these structs as named parameters; there is no
//! environment or CLI parsing in the library. Defaults reproduce the standard
//! acquisition setup.

use std::path::PathBuf;

use crate::error::{AnalysisError, Result};

/// Mask binarization and cropping controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Probability cutoff applied to the segmentation mask, on the
    /// normalized [0, 1] scale. Pixels strictly above it are foreground.
    pub probability_threshold: f32,
    /// Columns discarded at the left image edge (imaging artifacts).
    pub crop_left_px: u32,
    /// Columns discarded at the right image edge.
    pub crop_right_px: u32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            probability_threshold: 0.75,
            crop_left_px: 50,
            crop_right_px: 50,
        }
    }
}

/// Morphology outlier rejection controls.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Interquartile-range multiplier for the acceptance fences.
    pub iqr_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self { iqr_multiplier: 1.5 }
    }
}

/// Control-model classification controls.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Tail-probability cutoff in (0, 1). A sample value is flagged infected
    /// when its cumulative probability under the fitted control model
    /// exceeds this.
    pub confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { confidence: 0.99999 }
    }
}

/// Scatter-plot emission controls.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Render a classified scatter per analyzed well.
    pub enable: bool,
    /// Output directory for rendered plots.
    pub out_dir: Option<PathBuf>,
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Mask binarization and cropping.
    pub mask: MaskConfig,
    /// Morphology outlier rejection.
    pub outlier: OutlierConfig,
    /// Infection classification.
    pub classifier: ClassifierConfig,
    /// Number of frames acquired per well position.
    pub frames_per_position: u32,
    /// Log per-well counts and ratios at info level.
    pub verbose: bool,
    /// Scatter-plot emission.
    pub plot: PlotConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mask: MaskConfig::default(),
            outlier: OutlierConfig::default(),
            classifier: ClassifierConfig::default(),
            frames_per_position: 25,
            verbose: false,
            plot: PlotConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check parameter ranges before a run.
    pub fn validate(&self) -> Result<()> {
        let t = self.mask.probability_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(AnalysisError::InvalidConfig(format!(
                "mask probability threshold {} outside [0, 1]",
                t
            )));
        }
        let m = self.outlier.iqr_multiplier;
        if !m.is_finite() || m < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "IQR multiplier {} must be non-negative",
                m
            )));
        }
        let c = self.classifier.confidence;
        if !c.is_finite() || c <= 0.0 || c >= 1.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "classifier confidence {} outside (0, 1)",
                c
            )));
        }
        if self.frames_per_position == 0 {
            return Err(AnalysisError::InvalidConfig(
                "frames per position must be at least 1".to_string(),
            ));
        }
        if self.plot.enable && self.plot.out_dir.is_none() {
            return Err(AnalysisError::InvalidConfig(
                "plotting enabled without an output directory".to_string(),
            ));
        }
        Ok(())
    }
}
