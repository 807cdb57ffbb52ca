//! Tabular export of strain identities and lysis ratios.

use std::path::Path;

use crate::error::Result;
use crate::plate::{PlateResult, WellOutcome, PLATE_COLS, PLATE_ROWS};
use crate::strain::StrainTable;

/// Write the two-column (strain, lysis ratio) table for one plate.
///
/// The strain layout is read in its native column order while the ratio
/// matrix is read with columns reversed: export row `r·12 + k` pairs the
/// strain at `[r][k]` with the well in matrix column `11 − k`. Failed wells
/// export an empty ratio field; unknown strains an empty strain field.
pub fn write_strain_ratio_csv(
    result: &PlateResult,
    strains: &StrainTable,
    path: &Path,
) -> Result<()> {
    let layout = strains.plate_layout(result.plate);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["strain", "lysis_ratio"])?;
    for row in 0..PLATE_ROWS {
        for k in 0..PLATE_COLS {
            let strain = layout[row][k].clone().unwrap_or_default();
            let outcome: &WellOutcome = &result.wells[row][PLATE_COLS - 1 - k];
            let ratio = match outcome.ratio() {
                Some(r) => r.to_string(),
                None => String::new(),
            };
            writer.write_record([strain.as_str(), ratio.as_str()])?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::{WellAnalysis, WellPosition};

    fn synthetic_result() -> PlateResult {
        let outcomes = WellPosition::all().map(|pos| {
            let outcome = if pos.to_string() == "B2" {
                WellOutcome::Failed {
                    message: "no usable infection frames".to_string(),
                }
            } else {
                WellOutcome::Analyzed(WellAnalysis {
                    position: pos.to_string(),
                    strain: None,
                    n_measurements: 0,
                    lysis_count: 0,
                    lysogeny_count: 0,
                    uninfected_count: 0,
                    lysis_ratio: (pos.row * 100 + pos.column_number()) as f64,
                })
            };
            (pos, outcome)
        });
        PlateResult::from_outcomes(9, outcomes)
    }

    fn synthetic_strains() -> StrainTable {
        let mut table = StrainTable::default();
        for pos in WellPosition::all() {
            table.insert(9, pos, format!("S-{}", pos));
        }
        table
    }

    #[test]
    fn export_order_has_no_index_drift() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("strain_ratio.csv");
        write_strain_ratio_csv(&synthetic_result(), &synthetic_strains(), &path).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .unwrap();
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(records.len(), PLATE_ROWS * PLATE_COLS);

        // Export row (r, k) carries the strain of column k+1 paired with the
        // ratio of the mirrored column 12-k.
        for row in 0..PLATE_ROWS {
            for k in 0..PLATE_COLS {
                let record = &records[row * PLATE_COLS + k];
                let strain_pos = WellPosition::new(row, k).unwrap();
                assert_eq!(&record[0], format!("S-{}", strain_pos).as_str());
                let mirrored = WellPosition::new(row, PLATE_COLS - 1 - k).unwrap();
                if mirrored.to_string() == "B2" {
                    assert_eq!(&record[1], "");
                } else {
                    let expected = (mirrored.row * 100 + mirrored.column_number()) as f64;
                    assert_eq!(record[1].parse::<f64>().unwrap(), expected);
                }
            }
        }
    }
}
