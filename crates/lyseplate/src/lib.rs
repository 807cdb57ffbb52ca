//! lyseplate — infection-outcome analysis for fluorescence microscopy plates.
//!
//! For each well of an 8×12 plate, paired FITC/Cherry channel images and a
//! segmentation mask are analyzed per frame. The pipeline stages are:
//!
//! 1. **Extract** – mask binarization, artifact cropping, topological hole
//!    filling, per-channel background normalization, connected-component
//!    labeling and per-region statistics.
//! 2. **Filter** – per-frame Tukey-fence rejection of morphology outliers
//!    over area and eccentricity.
//! 3. **Pool** – concatenation of accepted (FITC, Cherry) mean pairs across
//!    all frames of a position, for the infection sample and its paired
//!    uninfected control.
//! 4. **Classify** – Gaussian control model per channel; sample values in
//!    the extreme upper tail are flagged infected.
//! 5. **Partition** – lysis (FITC-dominant) vs lysogeny (Cherry-dominant)
//!    vs uninfected, and the per-well lysis ratio.
//! 6. **Aggregate** – all 96 positions in parallel into a plate result with
//!    per-cell failure isolation, correlated against a strain table and
//!    exported as a two-column spreadsheet.
//!
//! # Public API
//! [`analyze_plate`], [`analyze_position`] and [`analyze_frame`] are the
//! primary entry points, driven by an [`AnalysisConfig`]; results serialize
//! with serde.

pub mod assets;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod plate;
pub mod plot;
pub mod position;
pub mod ratio;
pub mod strain;

pub use assets::{FrameAssets, FrameImages, GrayImageF32};
pub use classify::{classify_infected, ControlModel};
pub use config::{AnalysisConfig, ClassifierConfig, MaskConfig, OutlierConfig, PlotConfig};
pub use error::{AnalysisError, Result};
pub use frame::{analyze_frame, MeasurementPair, RegionStats};
pub use plate::{
    analyze_plate, PlateResult, WellAnalysis, WellOutcome, WellPosition, PLATE_COLS, PLATE_ROWS,
};
pub use position::{analyze_position, pool_position, PlateDirs, PositionPools};
pub use ratio::{partition, Partition};
pub use strain::StrainTable;
