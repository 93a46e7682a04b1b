/// Constants used by the provider retry loop.
pub mod provider {
    /// Emit a starvation warning every this many consecutive out-of-range draws.
    pub const RETRY_WARN_INTERVAL: usize = 10_000;
    /// Digits after the decimal point when rendering probabilities.
    pub const DISPLAY_PRECISION: usize = 3;
    /// Placeholder rendered for probabilities that are not computed yet.
    pub const UNSET_PROBABILITY_LABEL: &str = "-";
}

/// Constants used when deriving seeds for nested samplers.
pub mod seeding {
    /// Offset mixed into child seeds so a child never reuses its parent stream.
    pub const CHILD_SEED_OFFSET: u64 = 0xD5E7_5EED;
}
