//! Data source interfaces and built-in sources.
//!
//! Ownership model:
//! - `Dataset` is the sampler-facing capability: produce one sample for a spec.
//! - Samplers own their sources as `Box<dyn Dataset<S>>` and validate each one
//!   structurally when it is registered.
//! - `InMemoryDataset` keeps records in memory and draws them uniformly.

use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::types::{Record, SourceId, Spec, SpecKey};

/// Sampler-facing data source interface.
///
/// A source is asked for one sample at a time. When it cannot satisfy a
/// particular request right now it returns `ProviderError::OutOfRange`, which
/// tells the owning provider to draw again. Any other error is fatal.
pub trait Dataset<S>: Send + Sync {
    /// Stable source identifier used in logs, display, and metrics.
    fn id(&self) -> &str;

    /// Spec keys this source can produce.
    fn keys(&self) -> Vec<SpecKey>;

    /// Approximate number of samples, used as the default sampling weight.
    ///
    /// Return `None` when the source cannot report a size. Such sources are
    /// rejected at registration.
    fn num_samples(&self) -> Option<u128>;

    /// Produce one sample conforming to `spec`.
    fn sample(&self, spec: &Spec) -> Result<S, ProviderError>;

    /// Source-specific checks run once at registration.
    ///
    /// Composite sources use this to surface configuration errors before
    /// sampling starts.
    fn validate(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

impl<S, D> Dataset<S> for Box<D>
where
    D: Dataset<S> + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn keys(&self) -> Vec<SpecKey> {
        (**self).keys()
    }

    fn num_samples(&self) -> Option<u128> {
        (**self).num_samples()
    }

    fn sample(&self, spec: &Spec) -> Result<S, ProviderError> {
        (**self).sample(spec)
    }

    fn validate(&self) -> Result<(), ProviderError> {
        (**self).validate()
    }
}

/// Check that `dataset` satisfies the capability contract before registration.
///
/// `registered` lists ids already owned by the sampler.
pub(crate) fn validate_dataset<S>(
    dataset: &dyn Dataset<S>,
    registered: &[SourceId],
) -> Result<(), ProviderError> {
    let id = dataset.id();
    if id.trim().is_empty() {
        return Err(ProviderError::InvalidSource {
            source_id: id.to_string(),
            reason: "source id is empty".into(),
        });
    }
    if registered.iter().any(|existing| existing == id) {
        return Err(ProviderError::DuplicateSource {
            source_id: id.to_string(),
        });
    }
    if dataset.num_samples().is_none() {
        return Err(ProviderError::InvalidSource {
            source_id: id.to_string(),
            reason: "source does not report num_samples".into(),
        });
    }
    if dataset.keys().is_empty() {
        return Err(ProviderError::InvalidSource {
            source_id: id.to_string(),
            reason: "source declares no spec keys".into(),
        });
    }
    dataset.validate()
}

/// In-memory dataset for tests and small corpora.
///
/// Each call draws one record uniformly and projects it onto the spec keys.
/// A drawn record that lacks a requested key is reported as out of range so
/// the provider redraws.
pub struct InMemoryDataset<V> {
    id: SourceId,
    keys: Vec<SpecKey>,
    records: Arc<Vec<Record<V>>>,
    rng: Mutex<StdRng>,
}

impl<V> InMemoryDataset<V> {
    /// Create a dataset from prebuilt records, seeded from the OS.
    pub fn new(id: impl Into<SourceId>, records: Vec<Record<V>>) -> Self {
        Self::with_config(id, records, &ProviderConfig::default())
    }

    /// Create a dataset whose record draws follow `config.seed`.
    pub fn with_config(
        id: impl Into<SourceId>,
        records: Vec<Record<V>>,
        config: &ProviderConfig,
    ) -> Self {
        let id = id.into();
        let mut seen = HashSet::new();
        let keys = records
            .iter()
            .flat_map(|record| record.keys())
            .filter(|key| seen.insert(key.as_str()))
            .cloned()
            .collect();
        Self {
            rng: Mutex::new(config.child(&id).build_rng()),
            id,
            keys,
            records: Arc::new(records),
        }
    }

    /// Declare spec keys beyond those found in the records.
    ///
    /// Needed for datasets that start empty but must still register.
    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SpecKey>,
    {
        for key in keys {
            let key = key.into();
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<V> Dataset<Record<V>> for InMemoryDataset<V>
where
    V: Clone + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn keys(&self) -> Vec<SpecKey> {
        self.keys.clone()
    }

    fn num_samples(&self) -> Option<u128> {
        Some(self.records.len() as u128)
    }

    fn sample(&self, spec: &Spec) -> Result<Record<V>, ProviderError> {
        if self.records.is_empty() {
            return Err(ProviderError::OutOfRange {
                source_id: self.id.clone(),
                reason: "dataset holds no records".into(),
            });
        }
        let idx = {
            let mut rng = self.rng.lock().expect("dataset rng poisoned");
            rng.random_range(0..self.records.len())
        };
        let record = &self.records[idx];
        if spec.is_empty() {
            return Ok(record.clone());
        }
        let mut projected = Record::with_capacity(spec.len());
        for key in spec.keys() {
            let value = record
                .get(key)
                .ok_or_else(|| ProviderError::OutOfRange {
                    source_id: self.id.clone(),
                    reason: format!("record {idx} has no '{key}'"),
                })?;
            projected.insert(key.clone(), value.clone());
        }
        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::provider_tests::{INPUT_KEY, LABEL_KEY, PRIMARY_SOURCE_ID};
    use serde_json::json;

    fn record(input: u32, label: Option<u32>) -> Record<u32> {
        let mut record = Record::new();
        record.insert(INPUT_KEY.to_string(), input);
        if let Some(label) = label {
            record.insert(LABEL_KEY.to_string(), label);
        }
        record
    }

    fn spec(keys: &[&str]) -> Spec {
        keys.iter()
            .map(|key| (key.to_string(), json!(null)))
            .collect()
    }

    /// Fixture that never reports a size.
    struct Unsized;

    impl Dataset<u32> for Unsized {
        fn id(&self) -> &str {
            "unsized"
        }

        fn keys(&self) -> Vec<SpecKey> {
            vec![INPUT_KEY.to_string()]
        }

        fn num_samples(&self) -> Option<u128> {
            None
        }

        fn sample(&self, _spec: &Spec) -> Result<u32, ProviderError> {
            Ok(0)
        }
    }

    #[test]
    fn in_memory_dataset_collects_keys_in_first_seen_order() {
        let dataset = InMemoryDataset::new(
            PRIMARY_SOURCE_ID,
            vec![record(1, None), record(2, Some(0))],
        );
        assert_eq!(dataset.keys(), vec![INPUT_KEY, LABEL_KEY]);
        assert_eq!(dataset.num_samples(), Some(2));
    }

    #[test]
    fn in_memory_dataset_projects_onto_spec_keys() {
        let dataset = InMemoryDataset::with_config(
            PRIMARY_SOURCE_ID,
            vec![record(5, Some(1))],
            &ProviderConfig::seeded(1),
        );
        let sample = dataset.sample(&spec(&[LABEL_KEY])).unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample.get(LABEL_KEY), Some(&1));
    }

    #[test]
    fn in_memory_dataset_reports_missing_key_as_out_of_range() {
        let dataset = InMemoryDataset::with_config(
            PRIMARY_SOURCE_ID,
            vec![record(5, None)],
            &ProviderConfig::seeded(1),
        );
        let err = dataset.sample(&spec(&[LABEL_KEY])).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_in_memory_dataset_is_always_out_of_range() {
        let dataset: InMemoryDataset<u32> =
            InMemoryDataset::new(PRIMARY_SOURCE_ID, Vec::new()).with_keys([INPUT_KEY]);
        assert!(dataset.is_empty());
        assert_eq!(dataset.num_samples(), Some(0));
        assert!(validate_dataset::<Record<u32>>(&dataset, &[]).is_ok());
        assert!(dataset.sample(&Spec::new()).unwrap_err().is_recoverable());
    }

    #[test]
    fn validation_rejects_unsized_and_duplicate_sources() {
        let err = validate_dataset::<u32>(&Unsized, &[]).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSource { .. }));

        let dataset = InMemoryDataset::new(PRIMARY_SOURCE_ID, vec![record(1, None)]);
        let err = validate_dataset::<Record<u32>>(&dataset, &[PRIMARY_SOURCE_ID.to_string()])
            .unwrap_err();
        assert!(matches!(err, ProviderError::DuplicateSource { .. }));
    }

    #[test]
    fn validation_rejects_sources_without_keys() {
        let dataset: InMemoryDataset<u32> = InMemoryDataset::new(PRIMARY_SOURCE_ID, Vec::new());
        let err = validate_dataset::<Record<u32>>(&dataset, &[]).unwrap_err();
        assert!(
            matches!(err, ProviderError::InvalidSource { ref reason, .. } if reason.contains("keys"))
        );
    }
}
