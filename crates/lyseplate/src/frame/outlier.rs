//! Interquartile-range outlier rejection for per-frame region sets.
//!
//! Fences are recomputed from scratch for every frame; nothing is shared or
//! cached across frames.

use super::extract::RegionStats;

/// Inclusive acceptance band for one morphology feature.
#[derive(Debug, Clone, Copy)]
pub struct Fence {
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (inclusive).
    pub upper: f64,
}

impl Fence {
    /// Tukey fence around the interquartile range of `values`.
    pub fn from_values(values: &[f64], multiplier: f64) -> Self {
        let q25 = percentile(values, 25.0);
        let q75 = percentile(values, 75.0);
        let iqr = q75 - q25;
        Self {
            lower: q25 - multiplier * iqr,
            upper: q75 + multiplier * iqr,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Acceptance fences over area and eccentricity of one frame's regions.
#[derive(Debug, Clone, Copy)]
pub struct MorphologyFences {
    pub area: Fence,
    pub eccentricity: Fence,
}

impl MorphologyFences {
    pub fn accepts(&self, region: &RegionStats) -> bool {
        self.area.contains(region.area as f64) && self.eccentricity.contains(region.eccentricity)
    }
}

/// Compute per-frame fences, or `None` for an empty region set.
///
/// Small region sets degenerate gracefully: with equal feature values the
/// IQR is zero, the fences collapse onto the quartiles, and all regions at
/// that value are retained.
pub fn morphology_fences(regions: &[RegionStats], multiplier: f64) -> Option<MorphologyFences> {
    if regions.is_empty() {
        return None;
    }
    let areas: Vec<f64> = regions.iter().map(|r| r.area as f64).collect();
    let eccs: Vec<f64> = regions.iter().map(|r| r.eccentricity).collect();
    Some(MorphologyFences {
        area: Fence::from_values(&areas, multiplier),
        eccentricity: Fence::from_values(&eccs, multiplier),
    })
}

/// Percentile of `values` with linear interpolation between order statistics.
///
/// `p` is in [0, 100]. `values` must be non-empty and free of NaN.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(area: u32, ecc: f64) -> RegionStats {
        RegionStats {
            label: 0,
            area,
            eccentricity: ecc,
            mean_fitc: 0.0,
            mean_cherry: 0.0,
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&values, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&values, 100.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&values, 75.0) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn fences_bracket_the_quartiles() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        for multiplier in [0.0, 0.5, 1.5, 3.0] {
            let fence = Fence::from_values(&values, multiplier);
            let q25 = percentile(&values, 25.0);
            let q75 = percentile(&values, 75.0);
            assert!(fence.lower <= q25);
            assert!(q25 <= q75);
            assert!(q75 <= fence.upper);
        }
    }

    #[test]
    fn extreme_regions_are_rejected() {
        let mut regions: Vec<RegionStats> = (0..20).map(|i| region(100 + i, 0.5)).collect();
        regions.push(region(5000, 0.5)); // debris clump
        regions.push(region(110, 0.999)); // fragment
        let fences = morphology_fences(&regions, 1.5).unwrap();
        let kept: Vec<&RegionStats> = regions.iter().filter(|r| fences.accepts(r)).collect();
        assert_eq!(kept.len(), 20);
        assert!(kept.iter().all(|r| r.area < 1000 && r.eccentricity < 0.9));
    }

    #[test]
    fn tiny_region_sets_do_not_fail_and_are_retained() {
        for n in 1..4 {
            let regions: Vec<RegionStats> = (0..n).map(|_| region(50, 0.3)).collect();
            let fences = morphology_fences(&regions, 1.5).unwrap();
            assert!(regions.iter().all(|r| fences.accepts(r)), "n = {}", n);
        }
    }

    #[test]
    fn zero_iqr_keeps_all_equal_valued_regions() {
        let regions: Vec<RegionStats> = (0..10).map(|_| region(64, 0.25)).collect();
        let fences = morphology_fences(&regions, 1.5).unwrap();
        assert!((fences.area.lower - 64.0).abs() < 1e-9);
        assert!((fences.area.upper - 64.0).abs() < 1e-9);
        assert!(regions.iter().all(|r| fences.accepts(r)));
    }

    #[test]
    fn empty_region_set_yields_no_fences() {
        assert!(morphology_fences(&[], 1.5).is_none());
    }
}
