use std::fmt;

use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::sampler::WeightedSources;
use crate::source::Dataset;
use crate::types::{SourceId, Spec, SpecKey};

/// Weighted collection of datasets that is itself a dataset.
///
/// Supersets nest: a provider can mix supersets, which mix other supersets
/// or leaf datasets. Sampling a superset performs exactly one weighted draw
/// and delegates to the chosen member. It does not retry; an out-of-range
/// member error bubbles up to the provider, which redraws from the top.
pub struct DataSuperset<S> {
    tag: SourceId,
    spec: Option<Spec>,
    sources: WeightedSources<S>,
}

impl<S> DataSuperset<S> {
    /// Empty superset named `tag`, seeded from the OS.
    pub fn new(tag: impl Into<SourceId>) -> Self {
        Self::with_config(tag, &ProviderConfig::default())
    }

    /// Empty superset whose draws derive from `config.seed` and `tag`.
    pub fn with_config(tag: impl Into<SourceId>, config: &ProviderConfig) -> Self {
        let tag = tag.into();
        Self {
            sources: WeightedSources::new(&config.child(&tag)),
            tag,
            spec: None,
        }
    }

    /// Tag naming this superset; also its source id.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Declare the keys every member must produce.
    ///
    /// `None` clears the requirement. Existing members are checked too.
    pub fn set_spec(&mut self, spec: Option<&Spec>) -> Result<(), ProviderError> {
        if let Some(spec) = spec {
            for member in self.sources.iter() {
                let produced = member.keys();
                if let Some(key) = spec.keys().find(|key| !produced.contains(key)) {
                    return Err(ProviderError::InvalidSpec { key: key.clone() });
                }
            }
        }
        self.spec = spec.cloned();
        Ok(())
    }

    /// Copy of the declared spec.
    pub fn spec(&self) -> Option<Spec> {
        self.spec.clone()
    }

    /// Register a member. It must produce every key of this superset's spec.
    pub fn add_source<D>(&mut self, dataset: D) -> Result<(), ProviderError>
    where
        D: Dataset<S> + 'static,
    {
        if let Some(spec) = &self.spec {
            let produced = dataset.keys();
            if let Some(key) = spec.keys().find(|key| !produced.contains(key)) {
                return Err(ProviderError::InvalidSource {
                    source_id: dataset.id().to_string(),
                    reason: format!("member does not produce '{key}' required by '{}'", self.tag),
                });
            }
        }
        self.sources.push(Box::new(dataset))
    }

    /// Set member weights; `None` weights members by `num_samples`.
    pub fn set_weights(&mut self, weights: Option<&[f64]>) -> Result<(), ProviderError> {
        self.sources.set_weights(weights)
    }

    /// Forget the current weights.
    pub fn reset_weights(&mut self) {
        self.sources.reset_weights();
    }

    /// Normalized member probabilities, computing defaults if needed.
    pub fn probabilities(&self) -> Result<Vec<f64>, ProviderError> {
        Ok(self.sources.distribution()?.probabilities().to_vec())
    }

    /// Restart the member draw stream from `seed`.
    pub fn reseed(&self, seed: u64) {
        self.sources.reseed(seed);
    }

    /// Member ids in registration order.
    pub fn source_ids(&self) -> &[SourceId] {
        self.sources.ids()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` when there are no members.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Draw one member by weight.
    pub fn draw_source(&self) -> Result<&dyn Dataset<S>, ProviderError> {
        self.sources.draw()
    }
}

impl<S> Dataset<S> for DataSuperset<S> {
    fn id(&self) -> &str {
        &self.tag
    }

    fn keys(&self) -> Vec<SpecKey> {
        match &self.spec {
            Some(spec) => spec.keys().cloned().collect(),
            None => self.sources.common_keys(),
        }
    }

    fn num_samples(&self) -> Option<u128> {
        self.sources.total_samples()
    }

    fn sample(&self, spec: &Spec) -> Result<S, ProviderError> {
        self.draw_source()?.sample(spec)
    }

    /// Resolve the member distribution now so degenerate weights fail registration.
    fn validate(&self) -> Result<(), ProviderError> {
        self.sources.distribution().map(|_| ())
    }
}

impl<S> fmt::Display for DataSuperset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataSuperset({})", self.tag)
    }
}
