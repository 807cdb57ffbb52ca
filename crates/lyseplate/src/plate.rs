//! Plate-level aggregation over the 8×12 well grid.
//!
//! Positions are independent; the plate walk maps over all 96 wells in
//! parallel and isolates failures to their own cell.

use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::position::{analyze_position, PlateDirs};
use crate::strain::StrainTable;

/// Number of well rows (A through H).
pub const PLATE_ROWS: usize = 8;
/// Number of well columns (1 through 12).
pub const PLATE_COLS: usize = 12;

const ROW_LETTERS: [char; PLATE_ROWS] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// One of the 96 well coordinates. `row` and `col` are zero-based; the
/// display form is the conventional well name ("A1" through "H12").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WellPosition {
    /// Zero-based row index (0 = A).
    pub row: usize,
    /// Zero-based column index (0 = column 1).
    pub col: usize,
}

impl WellPosition {
    /// Build from zero-based indices; `None` outside the plate.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < PLATE_ROWS && col < PLATE_COLS).then_some(Self { row, col })
    }

    /// Parse a well name such as "A7" or "H12".
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let letter = chars.next()?;
        let row = ROW_LETTERS.iter().position(|&c| c == letter)?;
        let number: usize = chars.as_str().parse().ok()?;
        if !(1..=PLATE_COLS).contains(&number) {
            return None;
        }
        Some(Self {
            row,
            col: number - 1,
        })
    }

    /// One-based column number as used in well names.
    pub fn column_number(&self) -> usize {
        self.col + 1
    }

    /// All 96 positions in row-major order (A1, A2, ..., H12).
    pub fn all() -> impl Iterator<Item = WellPosition> {
        (0..PLATE_ROWS)
            .flat_map(|row| (0..PLATE_COLS).map(move |col| WellPosition { row, col }))
    }
}

impl std::fmt::Display for WellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", ROW_LETTERS[self.row], self.column_number())
    }
}

/// Per-well analysis summary.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WellAnalysis {
    /// Well name, e.g. "A7".
    pub position: String,
    /// Strain label, when a strain table was supplied and resolution ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strain: Option<String>,
    /// Number of measurement pairs pooled from the infection sample.
    pub n_measurements: usize,
    /// Classified lysis events.
    pub lysis_count: usize,
    /// Classified lysogeny events.
    pub lysogeny_count: usize,
    /// Pairs consistent with the uninfected control.
    pub uninfected_count: usize,
    /// lysis / (lysis + lysogeny), 0.0 when both counts are zero.
    pub lysis_ratio: f64,
}

/// Outcome of one well's analysis. Failures are recorded as such and never
/// coerced to a zero ratio.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WellOutcome {
    /// The position was analyzed to completion.
    Analyzed(WellAnalysis),
    /// The position failed; its cell carries the error message.
    Failed {
        /// Rendered analysis error.
        message: String,
    },
}

impl WellOutcome {
    /// Lysis ratio of an analyzed well, `None` for a failed one.
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Analyzed(a) => Some(a.lysis_ratio),
            Self::Failed { .. } => None,
        }
    }
}

/// Full analysis result for one plate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlateResult {
    /// Plate number the run was keyed to.
    pub plate: u32,
    /// 8×12 grid of well outcomes, `wells[row][column_number - 1]`.
    pub wells: Vec<Vec<WellOutcome>>,
}

impl PlateResult {
    /// Assemble a result grid from row-major outcomes.
    ///
    /// Cells land at `[row][column_number - 1]`; the one-based well-name
    /// column maps onto the zero-based matrix column exactly once.
    pub(crate) fn from_outcomes(
        plate: u32,
        outcomes: impl IntoIterator<Item = (WellPosition, WellOutcome)>,
    ) -> Self {
        let mut wells: Vec<Vec<WellOutcome>> = (0..PLATE_ROWS)
            .map(|_| {
                (0..PLATE_COLS)
                    .map(|_| WellOutcome::Failed {
                        message: "not analyzed".to_string(),
                    })
                    .collect()
            })
            .collect();
        for (pos, outcome) in outcomes {
            wells[pos.row][pos.column_number() - 1] = outcome;
        }
        Self { plate, wells }
    }

    /// Outcome at one position.
    pub fn get(&self, pos: WellPosition) -> &WellOutcome {
        &self.wells[pos.row][pos.col]
    }

    /// 8×12 ratio matrix; failed cells are `None`.
    pub fn ratio_matrix(&self) -> [[Option<f64>; PLATE_COLS]; PLATE_ROWS] {
        let mut matrix = [[None; PLATE_COLS]; PLATE_ROWS];
        for (r, row) in self.wells.iter().enumerate() {
            for (c, outcome) in row.iter().enumerate() {
                matrix[r][c] = outcome.ratio();
            }
        }
        matrix
    }

    /// Wells flattened row-major with each row's columns reversed (12 down
    /// to 1), the order required to correlate against the strain layout.
    pub fn flattened_column_reversed(&self) -> Vec<&WellOutcome> {
        self.wells
            .iter()
            .flat_map(|row| row.iter().rev())
            .collect()
    }

    /// Number of successfully analyzed wells.
    pub fn analyzed_count(&self) -> usize {
        self.wells
            .iter()
            .flatten()
            .filter(|o| matches!(o, WellOutcome::Analyzed(_)))
            .count()
    }
}

/// Analyze a full plate: every position independently, in parallel.
///
/// A failed position becomes a [`WellOutcome::Failed`] cell; it never aborts
/// the rest of the plate.
pub fn analyze_plate(
    dirs: &PlateDirs,
    plate: u32,
    strains: Option<&StrainTable>,
    config: &AnalysisConfig,
) -> Result<PlateResult> {
    config.validate()?;
    let positions: Vec<WellPosition> = WellPosition::all().collect();
    let outcomes: Vec<(WellPosition, WellOutcome)> = positions
        .par_iter()
        .map(|&pos| {
            tracing::info!("analyzing plate {} position {}", plate, pos);
            let outcome = match analyze_position(dirs, pos, plate, strains, config) {
                Ok(analysis) => WellOutcome::Analyzed(analysis),
                Err(e) => {
                    tracing::warn!("position {} failed: {}", pos, e);
                    WellOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            (pos, outcome)
        })
        .collect();
    Ok(PlateResult::from_outcomes(plate, outcomes))
}
