use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::errors::ProviderError;

/// Normalized categorical distribution over a sampler's sources.
///
/// Built once from raw weights or size hints and replaced whenever the source
/// list changes; it never goes stale silently because samplers drop it on
/// every mutation.
#[derive(Clone, Debug)]
pub struct SourceDistribution {
    probabilities: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl SourceDistribution {
    /// Normalize `weights` by their sum.
    ///
    /// Weights need not sum to 1, but each must be finite and non-negative and
    /// at least one must be positive.
    pub fn from_weights(weights: &[f64]) -> Result<Self, ProviderError> {
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ProviderError::InvalidWeight { index, value });
            }
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ProviderError::DegenerateWeights);
        }
        let probabilities: Vec<f64> = if total.is_finite() {
            weights.iter().map(|weight| weight / total).collect()
        } else {
            // Finite weights whose sum overflows: rescale by the largest first.
            let max = weights.iter().copied().fold(0.0, f64::max);
            let scaled: Vec<f64> = weights.iter().map(|weight| weight / max).collect();
            let total: f64 = scaled.iter().sum();
            scaled.iter().map(|weight| weight / total).collect()
        };
        let index =
            WeightedIndex::new(&probabilities).map_err(|_| ProviderError::DegenerateWeights)?;
        Ok(Self {
            probabilities,
            index,
        })
    }

    /// Weight each source by its reported sample count.
    ///
    /// Sources reporting zero samples are never drawn. If every source reports
    /// zero the distribution is undefined and construction fails.
    pub fn from_sizes(sizes: &[u128]) -> Result<Self, ProviderError> {
        let weights: Vec<f64> = sizes.iter().map(|&size| size as f64).collect();
        Self::from_weights(&weights)
    }

    /// Normalized probabilities, one per source, in registration order.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Returns `true` when the distribution has no categories.
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Draw one source index.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }
}
