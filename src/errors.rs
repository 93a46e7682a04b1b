use std::io;

use thiserror::Error;

use crate::types::{SourceId, SpecKey};

/// Error type for provider configuration, source, and sampling failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no data sources are registered")]
    EmptySampler,
    #[error("data source '{source_id}' cannot be registered: {reason}")]
    InvalidSource { source_id: SourceId, reason: String },
    #[error("data source '{source_id}' is already registered")]
    DuplicateSource { source_id: SourceId },
    #[error("spec key '{key}' is not produced by any registered source")]
    InvalidSpec { key: SpecKey },
    #[error("key of interest '{key}' is not produced by any registered source")]
    InvalidKeys { key: SpecKey },
    #[error("keys of interest must not be empty")]
    EmptyKeys,
    #[error("expected {expected} sampling weights, got {actual}")]
    WeightLengthMismatch { expected: usize, actual: usize },
    #[error("sampling weight {index} is invalid: {value}")]
    InvalidWeight { index: usize, value: f64 },
    #[error("sampling weights sum to zero; the distribution is undefined")]
    DegenerateWeights,
    #[error("data source '{source_id}' cannot satisfy this draw: {reason}")]
    OutOfRange { source_id: SourceId, reason: String },
    #[error("gave up after {attempts} consecutive out-of-range draws")]
    RetryLimitExceeded { attempts: usize },
    #[error("augmentation failed: {0}")]
    Augment(String),
    #[error("data source '{source_id}' failed: {reason}")]
    Source { source_id: SourceId, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProviderError {
    /// Returns `true` only for the signal the retry loop consumes.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProviderError::OutOfRange { .. })
    }
}
