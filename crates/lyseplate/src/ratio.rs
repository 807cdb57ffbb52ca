//! Lysis/lysogeny partitioning and the per-well lysis ratio.

use crate::frame::MeasurementPair;

/// Index partition of a position's measurement pool.
///
/// Indices refer into the pool the partition was computed from. Every index
/// lands in exactly one population, so duplicate measurement values are
/// counted as the distinct observations they are.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Partition {
    /// FITC-dominant infected pairs.
    pub lysis: Vec<usize>,
    /// Cherry-dominant infected pairs.
    pub lysogeny: Vec<usize>,
    /// Everything else, channel ties included.
    pub uninfected: Vec<usize>,
}

impl Partition {
    /// Lysis fraction of the classified infections.
    ///
    /// A well with no classified infections scores 0.0 by convention rather
    /// than dividing by zero.
    pub fn lysis_ratio(&self) -> f64 {
        let n_lysis = self.lysis.len();
        let n_lysogeny = self.lysogeny.len();
        if n_lysis + n_lysogeny == 0 {
            return 0.0;
        }
        n_lysis as f64 / (n_lysis + n_lysogeny) as f64
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Class {
    Uninfected,
    Lysis,
    Lysogeny,
}

/// Partition a measurement pool by its per-channel infection flags.
///
/// A FITC-flagged pair counts as lysis only when its FITC mean dominates its
/// Cherry mean; a Cherry-flagged pair as lysogeny only when Cherry dominates.
/// Pairs flagged without channel dominance (ties) remain uninfected.
pub fn partition(
    pairs: &[MeasurementPair],
    fitc_flags: &[usize],
    cherry_flags: &[usize],
) -> Partition {
    let mut classes = vec![Class::Uninfected; pairs.len()];
    for &i in fitc_flags {
        debug_assert!(i < pairs.len());
        if pairs[i].fitc > pairs[i].cherry {
            classes[i] = Class::Lysis;
        }
    }
    for &i in cherry_flags {
        debug_assert!(i < pairs.len());
        if pairs[i].cherry > pairs[i].fitc {
            classes[i] = Class::Lysogeny;
        }
    }

    let mut out = Partition::default();
    for (i, class) in classes.iter().enumerate() {
        match class {
            Class::Uninfected => out.uninfected.push(i),
            Class::Lysis => out.lysis.push(i),
            Class::Lysogeny => out.lysogeny.push(i),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(fitc: f64, cherry: f64) -> MeasurementPair {
        MeasurementPair { fitc, cherry }
    }

    fn ten_pairs() -> Vec<MeasurementPair> {
        vec![
            pair(10.0, 1.0),
            pair(1.0, 10.0),
            pair(5.0, 5.0),
            pair(8.0, 2.0),
            pair(2.0, 8.0),
            pair(0.5, 0.4),
            pair(3.0, 3.5),
            pair(9.0, 0.5),
            pair(0.1, 9.5),
            pair(4.0, 4.0),
        ]
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        let pairs = ten_pairs();
        let part = partition(&pairs, &[0, 2, 3, 7], &[1, 4, 8, 9]);

        let mut all: Vec<usize> = part
            .lysis
            .iter()
            .chain(part.lysogeny.iter())
            .chain(part.uninfected.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..pairs.len()).collect::<Vec<_>>());

        for i in &part.lysis {
            assert!(!part.lysogeny.contains(i));
            assert!(!part.uninfected.contains(i));
        }
    }

    #[test]
    fn dominance_gates_the_flags() {
        let pairs = ten_pairs();
        // Index 2 is FITC-flagged but tied, index 9 Cherry-flagged but tied:
        // both stay uninfected.
        let part = partition(&pairs, &[0, 2, 3, 7], &[1, 4, 8, 9]);
        assert_eq!(part.lysis, vec![0, 3, 7]);
        assert_eq!(part.lysogeny, vec![1, 4, 8]);
        assert_eq!(part.uninfected, vec![2, 5, 6, 9]);
    }

    #[test]
    fn ratio_counts_classified_infections() {
        let pairs = ten_pairs();
        let part = partition(&pairs, &[0, 3, 7], &[1]);
        assert!((part.lysis_ratio() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn ratio_is_zero_when_nothing_is_classified() {
        let pairs = ten_pairs();
        let part = partition(&pairs, &[], &[]);
        assert_eq!(part.lysis_ratio(), 0.0);
        assert_eq!(part.uninfected.len(), pairs.len());
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let pairs = ten_pairs();
        for (fitc, cherry) in [
            (vec![0usize], vec![1usize]),
            (vec![0, 3, 7], vec![]),
            (vec![], vec![1, 4, 8]),
        ] {
            let r = partition(&pairs, &fitc, &cherry).lysis_ratio();
            assert!((0.0..=1.0).contains(&r), "ratio {}", r);
        }
    }

    #[test]
    fn duplicate_values_are_distinct_observations() {
        let pairs = vec![pair(7.0, 1.0), pair(7.0, 1.0), pair(7.0, 1.0)];
        let part = partition(&pairs, &[0, 2], &[]);
        assert_eq!(part.lysis, vec![0, 2]);
        assert_eq!(part.uninfected, vec![1]);
        assert_eq!(part.lysis_ratio(), 1.0);
    }
}
