use rand::{rngs::OsRng, Rng};

/// Source of randomness for shuffling and shuffled insertion.
///
/// Injected rather than reached for globally so that queue ordering is
/// reproducible in tests: the same call sequence against the same source
/// yields the same play order.
pub trait RandomSource: Send + Sync + 'static {
    /// Next random value.
    fn next(&self) -> u64;

    /// Random value in `[min, max)`. `max` must be greater than `min`.
    fn next_range(&self, min: usize, max: usize) -> usize;
}

/// Cryptographically secure [`RandomSource`] backed by the operating system
/// generator. This is the default used by the service builder.
pub struct SecureRandom;

impl RandomSource for SecureRandom {
    fn next(&self) -> u64 {
        OsRng.gen()
    }

    fn next_range(&self, min: usize, max: usize) -> usize {
        OsRng.gen_range(min..max)
    }
}

/// Reorders `items` by tagging each with a fresh random key and sorting on
/// the keys. Stable, so equal keys keep their relative order and the result
/// is fully determined by the source's output sequence.
pub(crate) fn random_sort<T>(items: &mut [T], rng: &dyn RandomSource) {
    items.sort_by_cached_key(|_| rng.next());
}
