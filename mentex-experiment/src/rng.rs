//! Seed handling for session randomness.
//!
//! One session seed feeds two independent streams: the schedule shuffle and
//! the separator jitter. Keeping the streams separate means the trial order
//! for a given seed never depends on how the session is driven. The jitter
//! stream derives its seed by XOR with a fixed gamma (SplitMix64's), so the
//! mapping from seed to both streams is stable and documented here.

use rand::SeedableRng;
use rand::rngs::StdRng;

const SEPARATOR_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// RNG for the schedule shuffle. An explicit seed gives a reproducible
/// trial order; otherwise process entropy.
pub fn schedule_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// RNG for separator jitter draws, a separate stream derived from the same
/// session seed.
pub fn separator_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s ^ SEPARATOR_STREAM),
        None => StdRng::from_os_rng(),
    }
}
