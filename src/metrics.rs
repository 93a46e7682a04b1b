use std::collections::HashMap;

use crate::types::SourceId;

/// How evenly observed draws spread across sources.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSkew {
    pub draws: usize,
    pub sources: usize,
    pub min: usize,
    pub max: usize,
    pub max_share: f64,
    pub min_share: f64,
    /// `max / min`, infinite when some source was never drawn.
    pub ratio: f64,
    pub per_source: Vec<SourceShare>,
}

/// Observed share of one source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceShare {
    pub source: SourceId,
    pub count: usize,
    pub share: f64,
}

impl SelectionSkew {
    /// Observed share for `source`, zero when it never appeared.
    pub fn share_of(&self, source: &str) -> f64 {
        self.per_source
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.share)
            .unwrap_or(0.0)
    }

    /// Largest absolute gap between observed and `expected` shares.
    ///
    /// Sources present on only one side count with a share of zero on the other.
    pub fn max_deviation(&self, expected: &HashMap<SourceId, f64>) -> f64 {
        let observed = self
            .per_source
            .iter()
            .map(|entry| (entry.share - expected.get(&entry.source).copied().unwrap_or(0.0)).abs());
        let unobserved = expected
            .iter()
            .filter(|(source, _)| !self.per_source.iter().any(|entry| &entry.source == *source))
            .map(|(_, share)| share.abs());
        observed.chain(unobserved).fold(0.0, f64::max)
    }
}

/// Summarize per-source draw counts, keyed by source id.
pub fn selection_skew(counts: &HashMap<SourceId, usize>) -> Option<SelectionSkew> {
    if counts.is_empty() {
        return None;
    }
    let draws: usize = counts.values().sum();
    let share = |count: usize| {
        if draws == 0 {
            0.0
        } else {
            count as f64 / draws as f64
        }
    };
    let min = counts.values().copied().min().unwrap_or(0);
    let max = counts.values().copied().max().unwrap_or(0);
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_source: Vec<SourceShare> = counts
        .iter()
        .map(|(source, &count)| SourceShare {
            source: source.clone(),
            count,
            share: share(count),
        })
        .collect();
    per_source.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
    Some(SelectionSkew {
        draws,
        sources: counts.len(),
        min,
        max,
        max_share: share(max),
        min_share: share(min),
        ratio,
        per_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_counts_have_unit_ratio() {
        let counts = HashMap::from([("A".to_string(), 3), ("B".to_string(), 3)]);
        let skew = selection_skew(&counts).expect("skew");
        assert_eq!(skew.draws, 6);
        assert_eq!(skew.sources, 2);
        assert!((skew.ratio - 1.0).abs() < 1e-12);
        assert!((skew.share_of("A") - 0.5).abs() < 1e-12);
        assert_eq!(skew.share_of("missing"), 0.0);
    }

    #[test]
    fn shares_are_sorted_by_count() {
        let counts = HashMap::from([
            ("A".to_string(), 1),
            ("B".to_string(), 6),
            ("C".to_string(), 1),
        ]);
        let skew = selection_skew(&counts).expect("skew");
        assert_eq!(skew.per_source[0].source, "B");
        assert_eq!(skew.per_source[1].source, "A");
        assert!((skew.max_share - 0.75).abs() < 1e-12);
        assert!((skew.ratio - 6.0).abs() < 1e-12);
    }

    #[test]
    fn deviation_counts_missing_sources() {
        let counts = HashMap::from([("A".to_string(), 4)]);
        let skew = selection_skew(&counts).expect("skew");
        let expected = HashMap::from([("A".to_string(), 0.75), ("B".to_string(), 0.25)]);
        assert!((skew.max_deviation(&expected) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_counts_have_no_skew() {
        assert_eq!(selection_skew(&HashMap::new()), None);
    }
}
