#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Spec augmentation capability.
pub mod augment;
/// Provider configuration.
pub mod config;
/// Centralized constants used across samplers and fixtures.
pub mod constants;
/// Normalized categorical distributions over sources.
pub mod distribution;
/// Reusable example runners shared by demos.
pub mod example_apps;
mod hash;
/// Aggregate selection metrics.
pub mod metrics;
/// Top-level weighted provider with the retry loop.
pub mod provider;
/// Weighted source selection shared by providers and supersets.
pub mod sampler;
/// Dataset trait and built-in sources.
pub mod source;
/// Nested weighted collections of datasets.
pub mod superset;
/// Shared type aliases.
pub mod types;

mod errors;

pub use augment::Augment;
pub use config::ProviderConfig;
pub use distribution::SourceDistribution;
pub use errors::ProviderError;
pub use metrics::{SelectionSkew, SourceShare, selection_skew};
pub use provider::{DataProvider, ProvidedSample};
pub use sampler::WeightedSources;
pub use source::{Dataset, InMemoryDataset};
pub use superset::DataSuperset;
pub use types::{Record, SourceId, Spec, SpecKey, SpecValue};
