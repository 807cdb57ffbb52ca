//! Strain-identity lookup.
//!
//! Read-only table keyed by (plate, well position), loaded from a CSV file
//! with `plate,well,strain` records (e.g. `9,A7,JW0023`). The table is an
//! explicit dependency of the aggregators; nothing is resolved at load time
//! behind the caller's back.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::plate::{WellPosition, PLATE_COLS, PLATE_ROWS};

/// Strain identities for one or more plates.
#[derive(Debug, Clone, Default)]
pub struct StrainTable {
    entries: HashMap<(u32, WellPosition), String>,
}

impl StrainTable {
    /// Load from a CSV file with a `plate,well,strain` header row.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        let mut table = Self::default();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != 3 {
                return Err(AnalysisError::Csv(format!(
                    "record {} has {} fields, expected plate,well,strain",
                    i + 1,
                    record.len()
                )));
            }
            let plate: u32 = record[0].trim().parse().map_err(|_| {
                AnalysisError::Csv(format!("record {}: bad plate number '{}'", i + 1, &record[0]))
            })?;
            let pos = WellPosition::parse(record[1].trim()).ok_or_else(|| {
                AnalysisError::Csv(format!("record {}: bad well name '{}'", i + 1, &record[1]))
            })?;
            table.insert(plate, pos, record[2].trim().to_string());
        }
        Ok(table)
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, plate: u32, pos: WellPosition, strain: String) {
        self.entries.insert((plate, pos), strain);
    }

    /// Strain at a well of a plate, if known.
    pub fn strain_at(&self, plate: u32, pos: WellPosition) -> Option<&str> {
        self.entries.get(&(plate, pos)).map(String::as_str)
    }

    /// 8×12 strain layout for one plate in native column order; `None` where
    /// no entry exists.
    pub fn plate_layout(&self, plate: u32) -> Vec<Vec<Option<String>>> {
        (0..PLATE_ROWS)
            .map(|row| {
                (0..PLATE_COLS)
                    .map(|col| {
                        let pos = WellPosition { row, col };
                        self.strain_at(plate, pos).map(str::to_string)
                    })
                    .collect()
            })
            .collect()
    }

    /// Number of entries across all plates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
