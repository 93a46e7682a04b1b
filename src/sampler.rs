use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::distribution::SourceDistribution;
use crate::errors::ProviderError;
use crate::source::{Dataset, validate_dataset};
use crate::types::{SourceId, SpecKey};

/// Weighted source selection shared by `DataProvider` and `DataSuperset`.
///
/// Owns the ordered source list, the cached distribution over it, and the
/// seedable RNG used for draws. Mutation requires `&mut self`, so the type
/// system keeps reconfiguration out of concurrent sampling; draws only take
/// the cache and RNG locks.
pub struct WeightedSources<S> {
    /// Registered sources in registration order (index matches the distribution).
    sources: Vec<Box<dyn Dataset<S>>>,
    /// Ids of `sources`, kept alongside for duplicate checks and display.
    ids: Vec<SourceId>,
    /// Cached distribution; `None` until computed or after invalidation.
    distribution: RwLock<Option<Arc<SourceDistribution>>>,
    /// True when the cached distribution came from caller-supplied weights.
    explicit_weights: bool,
    /// RNG used for source draws.
    rng: Mutex<StdRng>,
}

impl<S> WeightedSources<S> {
    /// Create an empty source set seeded per `config`.
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            sources: Vec::new(),
            ids: Vec::new(),
            distribution: RwLock::new(None),
            explicit_weights: false,
            rng: Mutex::new(config.build_rng()),
        }
    }

    /// Validate and append `dataset`, invalidating any cached distribution.
    ///
    /// On failure the source list is left untouched.
    pub fn push(&mut self, dataset: Box<dyn Dataset<S>>) -> Result<(), ProviderError> {
        validate_dataset(dataset.as_ref(), &self.ids)?;
        if self.explicit_weights {
            warn!(
                source = dataset.id(),
                "discarding explicit sampling weights after source registration"
            );
        }
        self.ids.push(dataset.id().to_string());
        self.sources.push(dataset);
        self.invalidate();
        Ok(())
    }

    /// Replace the cached distribution.
    ///
    /// `None` weights every source by its reported sample count. Explicit
    /// weights must match the source count and are normalized by their sum.
    pub fn set_weights(&mut self, weights: Option<&[f64]>) -> Result<(), ProviderError> {
        let (distribution, explicit) = match weights {
            None => (self.size_distribution()?, false),
            Some(weights) => {
                if weights.len() != self.sources.len() {
                    return Err(ProviderError::WeightLengthMismatch {
                        expected: self.sources.len(),
                        actual: weights.len(),
                    });
                }
                (SourceDistribution::from_weights(weights)?, true)
            }
        };
        debug!(
            probabilities = ?distribution.probabilities(),
            explicit,
            "sampling distribution set"
        );
        *self.distribution.write().expect("distribution cache poisoned") =
            Some(Arc::new(distribution));
        self.explicit_weights = explicit;
        Ok(())
    }

    /// Drop the cached distribution so the next draw recomputes it from sizes.
    pub fn reset_weights(&mut self) {
        self.invalidate();
    }

    /// Cached distribution, computing the size-based default if needed.
    pub fn distribution(&self) -> Result<Arc<SourceDistribution>, ProviderError> {
        if self.sources.is_empty() {
            return Err(ProviderError::EmptySampler);
        }
        if let Some(distribution) = self
            .distribution
            .read()
            .expect("distribution cache poisoned")
            .as_ref()
        {
            return Ok(Arc::clone(distribution));
        }
        let mut cache = self.distribution.write().expect("distribution cache poisoned");
        if let Some(distribution) = cache.as_ref() {
            return Ok(Arc::clone(distribution));
        }
        let distribution = Arc::new(self.size_distribution()?);
        debug!(
            probabilities = ?distribution.probabilities(),
            "computed default sampling distribution"
        );
        *cache = Some(Arc::clone(&distribution));
        Ok(distribution)
    }

    /// Probabilities of the cached distribution, if one is set.
    pub fn cached_probabilities(&self) -> Option<Vec<f64>> {
        self.distribution
            .read()
            .expect("distribution cache poisoned")
            .as_ref()
            .map(|distribution| distribution.probabilities().to_vec())
    }

    /// Draw one source index.
    pub fn draw_index(&self) -> Result<usize, ProviderError> {
        let distribution = self.distribution()?;
        let mut rng = self.rng.lock().expect("sampler rng poisoned");
        Ok(distribution.sample(&mut *rng))
    }

    /// Draw one source.
    pub fn draw(&self) -> Result<&dyn Dataset<S>, ProviderError> {
        let idx = self.draw_index()?;
        Ok(self.sources[idx].as_ref())
    }

    /// Restart the draw stream from `seed`.
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock().expect("sampler rng poisoned") = StdRng::seed_from_u64(seed);
    }

    /// Registered source ids in registration order.
    pub fn ids(&self) -> &[SourceId] {
        &self.ids
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` when no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterate registered sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Dataset<S>> {
        self.sources.iter().map(|source| source.as_ref())
    }

    /// Whether `key` names a registered source or a key some source produces.
    pub fn knows_key(&self, key: &str) -> bool {
        self.ids.iter().any(|id| id == key)
            || self
                .sources
                .iter()
                .any(|source| source.keys().iter().any(|produced| produced == key))
    }

    /// Keys produced by every registered source, in first-source order.
    pub fn common_keys(&self) -> Vec<SpecKey> {
        let mut sources = self.sources.iter();
        let Some(first) = sources.next() else {
            return Vec::new();
        };
        let mut common = first.keys();
        for source in sources {
            let keys: HashSet<SpecKey> = source.keys().into_iter().collect();
            common.retain(|key| keys.contains(key));
        }
        common
    }

    /// Sum of member size hints, `None` when empty or any member is unsized.
    pub fn total_samples(&self) -> Option<u128> {
        if self.sources.is_empty() {
            return None;
        }
        self.sources
            .iter()
            .map(|source| source.num_samples())
            .try_fold(0u128, |total, size| size.map(|size| total.saturating_add(size)))
    }

    fn size_distribution(&self) -> Result<SourceDistribution, ProviderError> {
        let sizes = self
            .sources
            .iter()
            .map(|source| {
                source
                    .num_samples()
                    .ok_or_else(|| ProviderError::InvalidSource {
                        source_id: source.id().to_string(),
                        reason: "source stopped reporting num_samples".into(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        SourceDistribution::from_sizes(&sizes)
    }

    fn invalidate(&mut self) {
        *self
            .distribution
            .get_mut()
            .expect("distribution cache poisoned") = None;
        self.explicit_weights = false;
    }
}
