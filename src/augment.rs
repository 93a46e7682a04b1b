use crate::errors::ProviderError;
use crate::types::{Spec, SpecKey};

/// Prepares a sampling spec before it is handed to a source.
///
/// Called once per draw with a fresh copy of the provider's spec and its keys
/// of interest. Implementations should not rely on call order or count; a
/// draw that ends out of range is retried with a fresh `prepare` call.
/// Errors are fatal and reach the caller of `DataProvider::sample` unchanged.
pub trait Augment: Send + Sync {
    /// Return the spec to hand to the drawn source. `keys` are the keys of interest.
    fn prepare(&self, spec: Spec, keys: &[SpecKey]) -> Result<Spec, ProviderError>;
}

impl<F> Augment for F
where
    F: Fn(Spec, &[SpecKey]) -> Result<Spec, ProviderError> + Send + Sync,
{
    fn prepare(&self, spec: Spec, keys: &[SpecKey]) -> Result<Spec, ProviderError> {
        self(spec, keys)
    }
}
