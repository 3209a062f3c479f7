use mentex_core::{Schedule, TrialClass};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// Permutations drawn before generation gives up. With any workable run
/// bound a valid order appears within a handful of draws; impossible
/// parameters fail here instead of spinning.
pub const MAX_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error(
        "no valid trial order for trials_per_class={trials_per_class}, max_run={max_run} \
         within {attempts} attempts"
    )]
    GenerationFailed {
        trials_per_class: u32,
        max_run: u32,
        attempts: u32,
    },
}

/// Draws a balanced trial order with no run of identical classes longer
/// than `max_run`.
///
/// A fixed `[Focus × N, Relaxation × N]` array is Fisher-Yates shuffled
/// with draws from `rng`; a permutation violating the run bound is
/// discarded whole and redrawn from the same stream, never locally
/// repaired, so accepted orders stay uniform over the valid ones.
pub fn generate<R: Rng>(
    trials_per_class: u32,
    max_run: u32,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    let n = trials_per_class as usize;
    let mut entries = vec![TrialClass::Focus; n];
    entries.extend(vec![TrialClass::Relaxation; n]);

    for attempt in 1..=MAX_ATTEMPTS {
        entries.shuffle(rng);
        if !exceeds_run_bound(&entries, max_run) {
            tracing::debug!(attempt, trials = entries.len(), "trial order accepted");
            return Ok(Schedule::new(entries));
        }
    }

    Err(ScheduleError::GenerationFailed {
        trials_per_class,
        max_run,
        attempts: MAX_ATTEMPTS,
    })
}

fn exceeds_run_bound(entries: &[TrialClass], max_run: u32) -> bool {
    let mut run = 0u32;
    let mut prev = None;
    for &class in entries {
        run = if Some(class) == prev { run + 1 } else { 1 };
        prev = Some(class);
        if run > max_run {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_RUN;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn generate_seeded(trials_per_class: u32, max_run: u32, seed: u64) -> Schedule {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(trials_per_class, max_run, &mut rng).unwrap()
    }

    #[test]
    fn standard_schedule_is_balanced() {
        for seed in 0..20 {
            let schedule = generate_seeded(50, MAX_RUN, seed);
            assert_eq!(schedule.len(), 100);
            assert_eq!(schedule.count_of(TrialClass::Focus), 50);
            assert_eq!(schedule.count_of(TrialClass::Relaxation), 50);
        }
    }

    #[test]
    fn run_bound_is_respected() {
        for seed in 0..20 {
            let schedule = generate_seeded(50, MAX_RUN, seed);
            assert!(schedule.longest_run() <= MAX_RUN as usize);
        }
    }

    #[test]
    fn same_seed_same_schedule() {
        let a = generate_seeded(50, MAX_RUN, 1234);
        let b = generate_seeded(50, MAX_RUN, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_give_different_orders() {
        let a = generate_seeded(50, MAX_RUN, 1);
        let b = generate_seeded(50, MAX_RUN, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn single_trial_per_class_terminates_promptly() {
        let schedule = generate_seeded(1, MAX_RUN, 99);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.count_of(TrialClass::Focus), 1);
        assert_eq!(schedule.count_of(TrialClass::Relaxation), 1);
    }

    #[test]
    fn impossible_bound_exhausts_retries() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate(2, 0, &mut rng).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::GenerationFailed {
                trials_per_class: 2,
                max_run: 0,
                attempts: MAX_ATTEMPTS,
            }
        );
    }

    proptest! {
        #[test]
        fn generated_schedules_hold_the_invariants(
            seed in any::<u64>(),
            trials_per_class in 1u32..=60,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = generate(trials_per_class, MAX_RUN, &mut rng).unwrap();
            prop_assert_eq!(schedule.len(), trials_per_class as usize * 2);
            prop_assert_eq!(
                schedule.count_of(TrialClass::Focus),
                trials_per_class as usize
            );
            prop_assert!(schedule.longest_run() <= MAX_RUN as usize);
        }
    }
}
