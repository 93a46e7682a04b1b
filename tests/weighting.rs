use std::collections::HashMap;

use dataprovider::{
    DataProvider, Dataset, InMemoryDataset, ProviderConfig, ProviderError, Record, SourceId,
    selection_skew,
};

fn records(count: u32) -> Vec<Record<u32>> {
    (0..count)
        .map(|value| Record::from([("input".to_string(), value)]))
        .collect()
}

fn provider_with_sizes(seed: u64, sizes: &[u32]) -> DataProvider<Record<u32>> {
    let config = ProviderConfig::seeded(seed);
    let mut provider = DataProvider::with_config(config.clone()).unwrap();
    for (idx, size) in sizes.iter().enumerate() {
        provider
            .add_source(
                InMemoryDataset::with_config(format!("source_{idx}"), records(*size), &config)
                    .with_keys(["input"]),
            )
            .unwrap();
    }
    provider
}

fn draw_counts(provider: &DataProvider<Record<u32>>, draws: usize) -> HashMap<SourceId, usize> {
    let mut counts = HashMap::new();
    for _ in 0..draws {
        let provided = provider.sample_detailed().unwrap();
        *counts.entry(provided.source_id).or_default() += 1;
    }
    counts
}

#[test]
fn probabilities_are_normalized_and_non_negative() {
    let cases: [(&[u32], Option<&[f64]>); 4] = [
        (&[3, 1], None),
        (&[1, 1, 1], Some(&[0.2, 0.2, 0.2])),
        (&[5, 0, 5], None),
        (&[1, 1], Some(&[7.0, 0.0])),
    ];
    for (sizes, weights) in cases {
        let mut provider = provider_with_sizes(1, sizes);
        provider.set_weights(weights).unwrap();
        let probabilities = provider.probabilities().unwrap();
        let sum: f64 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum={sum} for {sizes:?}/{weights:?}");
        assert!(probabilities.iter().all(|p| *p >= 0.0));
    }
}

#[test]
fn boundary_weights_always_pick_the_first_source() {
    let mut provider = provider_with_sizes(2, &[4, 4]);
    provider.set_weights(Some(&[1.0, 0.0][..])).unwrap();
    for _ in 0..500 {
        let source = provider.draw_source().unwrap();
        assert_eq!(source.id(), "source_0");
    }
}

#[test]
fn all_zero_sizes_fail_instead_of_degrading() {
    let mut provider = provider_with_sizes(3, &[0, 0]);
    assert!(matches!(
        provider.set_weights(None),
        Err(ProviderError::DegenerateWeights)
    ));
    assert!(matches!(
        provider.sample(),
        Err(ProviderError::DegenerateWeights)
    ));
}

#[test]
fn default_weights_track_reported_sizes() {
    let provider = provider_with_sizes(4, &[300, 100]);
    let skew = selection_skew(&draw_counts(&provider, 10_000)).unwrap();
    let expected = HashMap::from([
        ("source_0".to_string(), 0.75),
        ("source_1".to_string(), 0.25),
    ]);
    assert!(
        skew.max_deviation(&expected) < 0.03,
        "observed shares {:?}",
        skew.per_source
    );
}

#[test]
fn explicit_weights_are_scaled_not_required_to_sum_to_one() {
    let mut provider = provider_with_sizes(5, &[1, 1, 1]);
    provider.set_weights(Some(&[2.0, 1.0, 1.0][..])).unwrap();
    let probabilities = provider.probabilities().unwrap();
    assert!((probabilities[0] - 0.5).abs() < 1e-12);
    assert!((probabilities[2] - 0.25).abs() < 1e-12);

    let skew = selection_skew(&draw_counts(&provider, 8_000)).unwrap();
    assert!((skew.share_of("source_0") - 0.5).abs() < 0.03);
}

#[test]
fn explicit_weights_must_match_source_count() {
    let mut provider = provider_with_sizes(6, &[1, 1]);
    let err = provider.set_weights(Some(&[1.0, 1.0, 1.0][..])).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::WeightLengthMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[test]
fn new_sources_replace_explicit_weights_with_size_defaults() {
    let config = ProviderConfig::seeded(7);
    let mut provider = provider_with_sizes(7, &[1, 1]);
    provider.set_weights(Some(&[0.0, 1.0][..])).unwrap();
    provider
        .add_source(InMemoryDataset::with_config("late", records(2), &config))
        .unwrap();
    assert_eq!(provider.probabilities().unwrap(), vec![0.25, 0.25, 0.5]);
}

#[test]
fn reset_weights_returns_to_size_defaults() {
    let mut provider = provider_with_sizes(8, &[1, 3]);
    provider.set_weights(Some(&[1.0, 0.0][..])).unwrap();
    provider.reset_weights();
    assert_eq!(provider.probabilities().unwrap(), vec![0.25, 0.75]);
}

#[test]
fn same_seed_replays_the_same_sources() {
    let sequence = |seed: u64| -> Vec<SourceId> {
        let provider = provider_with_sizes(seed, &[5, 5, 5, 5]);
        (0..64)
            .map(|_| provider.sample_detailed().unwrap().source_id)
            .collect()
    };
    assert_eq!(sequence(11), sequence(11));
    assert_ne!(sequence(11), sequence(12));
}
