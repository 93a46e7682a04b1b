use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::hash::derive_seed;

/// Runtime configuration shared by providers and supersets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// RNG seed for source selection. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Upper bound on consecutive out-of-range draws per `sample` call.
    ///
    /// `None` retries forever. If every source is exhausted the call never
    /// returns, so long-running jobs should set a bound.
    pub max_attempts: Option<usize>,
}

impl ProviderConfig {
    /// Config with a fixed seed and unbounded retries.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Set the retry bound.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Parse a config from JSON text and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, ProviderError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| ProviderError::Configuration(format!("invalid provider config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file from `path`.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject settings that can never produce a sample.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.max_attempts == Some(0) {
            return Err(ProviderError::Configuration(
                "max_attempts must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    /// Config for a nested sampler named `tag`.
    ///
    /// Seeded parents hand children a derived seed; unseeded parents stay unseeded.
    pub fn child(&self, tag: &str) -> Self {
        Self {
            seed: self.seed.map(|seed| derive_seed(seed, tag)),
            max_attempts: self.max_attempts,
        }
    }

    pub(crate) fn build_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unseeded_and_unbounded() {
        let config = ProviderConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.max_attempts, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_config_parses_partial_fields() {
        let config = ProviderConfig::from_json_str(r#"{ "seed": 11 }"#).unwrap();
        assert_eq!(config, ProviderConfig::seeded(11));
    }

    #[test]
    fn json_config_rejects_zero_attempts() {
        let err = ProviderConfig::from_json_str(r#"{ "max_attempts": 0 }"#).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn json_config_rejects_unknown_fields() {
        let err = ProviderConfig::from_json_str(r#"{ "sead": 1 }"#).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(ref msg) if msg.contains("sead")));
    }

    #[test]
    fn child_config_derives_distinct_seeds() {
        let parent = ProviderConfig::seeded(3).with_max_attempts(5);
        let a = parent.child("a");
        let b = parent.child("b");
        assert_ne!(a.seed, b.seed);
        assert_eq!(a.seed, parent.child("a").seed);
        assert_eq!(a.max_attempts, Some(5));
        assert_eq!(ProviderConfig::default().child("a").seed, None);
    }
}
