use std::fmt;
use tracing::{debug, warn};

use crate::augment::Augment;
use crate::config::ProviderConfig;
use crate::constants::provider::{DISPLAY_PRECISION, RETRY_WARN_INTERVAL, UNSET_PROBABILITY_LABEL};
use crate::errors::ProviderError;
use crate::sampler::WeightedSources;
use crate::source::Dataset;
use crate::types::{SourceId, Spec, SpecKey};

/// One sample plus where it came from.
#[derive(Clone, Debug)]
pub struct ProvidedSample<S> {
    /// The produced sample.
    pub sample: S,
    /// Id of the top-level source that produced it.
    pub source_id: SourceId,
    /// Draws taken, including the successful one.
    pub attempts: usize,
}

/// Top-level weighted sampler over heterogeneous datasets.
///
/// Configure it (sources, spec, keys of interest, augment, weights), then
/// call `sample` repeatedly. Each call draws a source, prepares a fresh copy
/// of the spec, and asks the source for a sample. Out-of-range draws are
/// retried with a new source draw; every other error is returned as is.
///
/// With the default config the retry loop is unbounded: if every source is
/// permanently out of range, `sample` never returns. Set
/// `ProviderConfig::max_attempts` to turn that into `RetryLimitExceeded`.
pub struct DataProvider<S> {
    sources: WeightedSources<S>,
    spec: Spec,
    keys: Vec<SpecKey>,
    augment: Option<Box<dyn Augment>>,
    config: ProviderConfig,
}

impl<S> Default for DataProvider<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DataProvider<S> {
    /// Empty provider seeded from the OS with unbounded retries.
    pub fn new() -> Self {
        Self::build(ProviderConfig::default())
    }

    /// Empty provider using `config`.
    pub fn with_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ProviderConfig) -> Self {
        Self {
            sources: WeightedSources::new(&config),
            spec: Spec::new(),
            keys: Vec::new(),
            augment: None,
            config,
        }
    }

    /// Register a source. Cached weights are discarded.
    ///
    /// Fails without modifying the provider if the source has an empty or
    /// duplicate id, reports no size, declares no spec keys, or lacks a key
    /// of the active spec that does not name a registered source.
    pub fn add_source<D>(&mut self, dataset: D) -> Result<(), ProviderError>
    where
        D: Dataset<S> + 'static,
    {
        let produced = dataset.keys();
        let missing = self.spec.keys().find(|key| {
            !produced.contains(key)
                && key.as_str() != dataset.id()
                && !self.sources.ids().contains(key)
        });
        if let Some(key) = missing {
            return Err(ProviderError::InvalidSource {
                source_id: dataset.id().to_string(),
                reason: format!("source does not produce spec key '{key}'"),
            });
        }
        self.sources.push(Box::new(dataset))
    }

    /// Replace the active spec with a copy of `spec`.
    ///
    /// Every key must be produced by (or name) a registered source.
    pub fn set_spec(&mut self, spec: &Spec) -> Result<(), ProviderError> {
        if let Some(key) = spec.keys().find(|key| !self.sources.knows_key(key)) {
            return Err(ProviderError::InvalidSpec { key: key.clone() });
        }
        self.spec = spec.clone();
        Ok(())
    }

    /// Copy of the active spec.
    pub fn spec(&self) -> Spec {
        self.spec.clone()
    }

    /// Replace the keys handed to the augment as context.
    pub fn set_keys_of_interest<I, K>(&mut self, keys: I) -> Result<(), ProviderError>
    where
        I: IntoIterator<Item = K>,
        K: Into<SpecKey>,
    {
        let keys: Vec<SpecKey> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(ProviderError::EmptyKeys);
        }
        if let Some(key) = keys.iter().find(|key| !self.sources.knows_key(key)) {
            return Err(ProviderError::InvalidKeys { key: key.clone() });
        }
        self.keys = keys;
        Ok(())
    }

    /// Keys handed to the augment as context.
    pub fn keys_of_interest(&self) -> &[SpecKey] {
        &self.keys
    }

    /// Replace the augment; `None` passes the spec through unchanged.
    pub fn set_augment(&mut self, augment: Option<Box<dyn Augment>>) {
        self.augment = augment;
    }

    /// Set the sampling distribution.
    ///
    /// `None` weights sources by `num_samples` and fails if all report zero.
    /// Explicit weights must have one entry per source and are normalized.
    pub fn set_weights(&mut self, weights: Option<&[f64]>) -> Result<(), ProviderError> {
        self.sources.set_weights(weights)
    }

    /// Forget the current weights; the next draw uses size-based defaults.
    pub fn reset_weights(&mut self) {
        self.sources.reset_weights();
    }

    /// Normalized sampling probabilities, computing defaults if needed.
    pub fn probabilities(&self) -> Result<Vec<f64>, ProviderError> {
        Ok(self.sources.distribution()?.probabilities().to_vec())
    }

    /// Restart the source draw stream from `seed`.
    pub fn reseed(&self, seed: u64) {
        self.sources.reseed(seed);
    }

    /// Registered source ids in registration order.
    pub fn source_ids(&self) -> &[SourceId] {
        self.sources.ids()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` when no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Active config.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Draw one source by weight.
    pub fn draw_source(&self) -> Result<&dyn Dataset<S>, ProviderError> {
        self.sources.draw()
    }

    /// Produce one sample, redrawing on out-of-range sources.
    pub fn sample(&self) -> Result<S, ProviderError> {
        self.sample_detailed().map(|provided| provided.sample)
    }

    /// Like `sample`, also reporting the producing source and attempt count.
    pub fn sample_detailed(&self) -> Result<ProvidedSample<S>, ProviderError> {
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let dataset = self.draw_source()?;
            let spec = self.prepare_spec()?;
            match dataset.sample(&spec) {
                Ok(sample) => {
                    return Ok(ProvidedSample {
                        sample,
                        source_id: dataset.id().to_string(),
                        attempts,
                    });
                }
                Err(err) if err.is_recoverable() => {
                    debug!(source = dataset.id(), attempts, error = %err, "redrawing");
                    if self
                        .config
                        .max_attempts
                        .is_some_and(|max_attempts| attempts >= max_attempts)
                    {
                        return Err(ProviderError::RetryLimitExceeded { attempts });
                    }
                    if attempts % RETRY_WARN_INTERVAL == 0 {
                        warn!(
                            attempts,
                            "every recent draw was out of range; sources may be exhausted"
                        );
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn prepare_spec(&self) -> Result<Spec, ProviderError> {
        let spec = self.spec.clone();
        match &self.augment {
            Some(augment) => {
                let keys = self.keys.clone();
                augment.prepare(spec, &keys)
            }
            None => Ok(spec),
        }
    }
}

impl<S> fmt::Display for DataProvider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let probabilities = self.sources.cached_probabilities();
        write!(f, "DataProvider(")?;
        for (idx, id) in self.sources.ids().iter().enumerate() {
            match probabilities.as_ref().and_then(|p| p.get(idx)) {
                Some(p) => write!(f, "\n    {p:.prec$} : {id}", prec = DISPLAY_PRECISION)?,
                None => write!(f, "\n    {UNSET_PROBABILITY_LABEL} : {id}")?,
            }
        }
        write!(f, "\n)")
    }
}
