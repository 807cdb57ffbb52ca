//! Gaussian control model and tail-probability infection flagging.
//!
//! One model is fitted per channel and per well from the pooled control
//! measurements. Sample values in the extreme upper tail of the fitted
//! model are flagged as infected in that channel.

use statrs::distribution::{ContinuousCDF, Normal};

/// Standard deviations below this are treated as a degenerate control.
const MIN_STD_DEV: f64 = 1e-12;

/// Single-component Gaussian fitted to a control-channel distribution.
#[derive(Debug, Clone, Copy)]
pub struct ControlModel {
    /// Fitted mean.
    pub mean: f64,
    /// Fitted standard deviation (maximum likelihood).
    pub std_dev: f64,
}

impl ControlModel {
    /// Maximum-likelihood fit. Returns `None` for an empty control pool.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: var.sqrt(),
        })
    }

    /// Indices of sample values in the extreme upper tail of the model.
    ///
    /// A degenerate (zero-variance) control cannot support a CDF; it flags
    /// values strictly above the control mean and treats values at or below
    /// it as control-consistent.
    pub fn flag_infected(&self, sample: &[f64], confidence: f64) -> Vec<usize> {
        if self.std_dev <= MIN_STD_DEV {
            return sample
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v > self.mean)
                .map(|(i, _)| i)
                .collect();
        }
        let normal = Normal::new(self.mean, self.std_dev).expect("validated std dev");
        sample
            .iter()
            .enumerate()
            .filter(|&(_, &v)| normal.cdf(v) > confidence)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Flag sample indices whose value is inconsistent with the control
/// distribution for one channel. An empty control pool flags nothing.
pub fn classify_infected(control: &[f64], sample: &[f64], confidence: f64) -> Vec<usize> {
    match ControlModel::fit(control) {
        Some(model) => model.flag_infected(sample, confidence),
        None => {
            tracing::warn!("empty control distribution, no measurements flagged");
            Vec::new()
        }
    }
}
