//! Error types for plate analysis.

use std::path::PathBuf;

// ── Error type ───────────────────────────────────────────────────────────

/// Errors that can occur while analyzing frames, positions or plates.
#[derive(Debug)]
pub enum AnalysisError {
    /// A mask or channel image file for a frame is absent.
    MissingAsset {
        /// Path that was probed.
        path: PathBuf,
    },
    /// An asset file exists but could not be decoded.
    ImageDecode {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
    /// Mask and channel dimensions disagree after cropping.
    ShapeMismatch {
        /// Which channel disagreed with the mask.
        channel: &'static str,
        /// Mask dimensions `[width, height]`.
        expected: [u32; 2],
        /// Channel dimensions `[width, height]`.
        got: [u32; 2],
    },
    /// The configured crop margins consume the whole image width.
    CropExceedsImage {
        /// Image width before cropping.
        width: u32,
        /// Left margin in pixels.
        left: u32,
        /// Right margin in pixels.
        right: u32,
    },
    /// Every frame of a well position failed to load.
    NoUsableFrames {
        /// Well position, e.g. "A7".
        position: String,
        /// Which sample had no usable frames ("infection" or "control").
        sample: &'static str,
    },
    /// A configuration parameter is outside its valid range.
    InvalidConfig(String),
    /// Filesystem failure outside of asset decoding.
    Io(std::io::Error),
    /// Strain table or export table failure.
    Csv(String),
    /// Scatter rendering failure.
    Plot(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAsset { path } => write!(f, "missing asset: {}", path.display()),
            Self::ImageDecode { path, message } => {
                write!(f, "failed to decode {}: {}", path.display(), message)
            }
            Self::ShapeMismatch {
                channel,
                expected,
                got,
            } => write!(
                f,
                "{} channel is {}x{} but mask is {}x{} after cropping",
                channel, got[0], got[1], expected[0], expected[1]
            ),
            Self::CropExceedsImage { width, left, right } => write!(
                f,
                "crop margins {}+{} px consume the whole image width {}",
                left, right, width
            ),
            Self::NoUsableFrames { position, sample } => {
                write!(f, "no usable {} frames for position {}", sample, position)
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::Csv(msg) => write!(f, "csv error: {}", msg),
            Self::Plot(msg) => write!(f, "plot error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

/// Result alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
