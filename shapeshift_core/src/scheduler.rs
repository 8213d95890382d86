use rand::Rng;
use rand::seq::SliceRandom;
use rand_core::RngCore;
use thiserror::Error;

/// Errors that can occur during scheduler operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// There is nothing to pick from.
    #[error("No techniques to schedule")]
    NoTechniques,
}

/// A `Scheduler` decides in which order the engine invokes its techniques.
///
/// It works on indices into the engine's technique list, so it never needs to know what the
/// techniques are. The engine asks for one full pass first (`full_pass`) and then for single
/// picks (`next`) while it still needs variants.
pub trait Scheduler: Send + Sync {
    /// Returns an ordering of `0..technique_count` visiting every technique exactly once.
    fn full_pass(&mut self, technique_count: usize, rng: &mut dyn RngCore) -> Vec<usize>;

    /// Selects a single technique index for a retry attempt.
    ///
    /// # Returns
    /// The index of the selected technique, or `SchedulerError::NoTechniques` when
    /// `technique_count` is zero.
    fn next(
        &mut self,
        technique_count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SchedulerError>;
}

/// A basic `Scheduler` with no memory.
///
/// `full_pass` is a uniform shuffle, so no technique is favoured by its position in the
/// configured list; `next` picks uniformly with replacement, so the same technique can be
/// retried any number of times.
#[derive(Default, Debug)]
pub struct RandomScheduler;

impl RandomScheduler {
    /// Creates a new `RandomScheduler`.
    pub fn new() -> Self {
        RandomScheduler
    }
}

impl Scheduler for RandomScheduler {
    fn full_pass(&mut self, technique_count: usize, rng: &mut dyn RngCore) -> Vec<usize> {
        let mut order: Vec<usize> = (0..technique_count).collect();
        order.shuffle(rng);
        order
    }

    fn next(
        &mut self,
        technique_count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SchedulerError> {
        if technique_count == 0 {
            return Err(SchedulerError::NoTechniques);
        }
        Ok(rng.random_range(0..technique_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn random_scheduler_next_with_no_techniques_returns_error() {
        let mut scheduler = RandomScheduler::new();
        let mut rng = ChaCha8Rng::from_seed([0; 32]);

        assert_eq!(
            scheduler.next(0, &mut rng),
            Err(SchedulerError::NoTechniques),
            "Scheduling from an empty technique list must fail"
        );
    }

    #[test]
    fn random_scheduler_full_pass_is_a_permutation() {
        let mut scheduler = RandomScheduler::new();
        let mut rng = ChaCha8Rng::from_seed([1; 32]);

        let mut order = scheduler.full_pass(19, &mut rng);
        assert_eq!(order.len(), 19);
        order.sort_unstable();
        assert_eq!(order, (0..19).collect::<Vec<_>>());
        assert!(scheduler.full_pass(0, &mut rng).is_empty());
    }

    #[test]
    fn random_scheduler_full_pass_varies_between_calls() {
        let mut scheduler = RandomScheduler::new();
        let mut rng = ChaCha8Rng::from_seed([2; 32]);

        let orders: HashSet<Vec<usize>> =
            (0..10).map(|_| scheduler.full_pass(8, &mut rng)).collect();
        assert!(
            orders.len() > 1,
            "Ten shuffles of eight items should not all coincide: {orders:?}"
        );
    }

    #[test]
    fn random_scheduler_next_covers_all_indices_with_replacement() {
        let mut scheduler = RandomScheduler::new();
        let mut rng = ChaCha8Rng::from_seed([3; 32]);

        let mut seen = HashSet::new();
        for i in 0..100 {
            let index = scheduler
                .next(3, &mut rng)
                .unwrap_or_else(|e| panic!("next() failed on iteration {i}: {e:?}"));
            assert!(index < 3, "Index {index} is out of bounds");
            seen.insert(index);
        }
        assert_eq!(
            seen.len(),
            3,
            "100 picks from 3 techniques should select each at least once"
        );
    }
}
