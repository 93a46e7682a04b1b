use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::constants::seeding::CHILD_SEED_OFFSET;

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

pub fn stable_hash_str(seed: u64, value: &str) -> u64 {
    stable_hash_with(|hasher| {
        seed.hash(hasher);
        value.hash(hasher);
    })
}

/// Seed for a child sampler named `tag` under a parent seeded with `seed`.
pub fn derive_seed(seed: u64, tag: &str) -> u64 {
    stable_hash_str(seed ^ CHILD_SEED_OFFSET, tag)
}
