use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::dna::{Circle, CircleSet};
use crate::mutation_config::MutateConfig;

/// Produces a neighbour of a circle set. Takes ownership so implementations can reuse the storage.
pub trait Mutator {
    fn mutate(&mut self, circles: CircleSet, width: u32, height: u32) -> CircleSet;
}

/// Random add/remove mutator.
///
/// Each edit appends a random circle with probability `p_add`, otherwise removes one at a
/// random index (no-op on an empty set). After every edit another one follows with
/// probability `p_continue`, so the edit count is geometric (expected 2 with the defaults).
pub struct RandomMutator<R: Rng = Pcg32> {
    rng: R,
    cfg: MutateConfig,
}

impl RandomMutator<Pcg32> {
    /// seeded from the thread rng, non-reproducible
    pub fn from_entropy(cfg: MutateConfig) -> Self {
        Self { rng: Pcg32::from_rng(&mut rand::rng()), cfg }
    }

    /// reproducible stream for a given seed
    pub fn seeded(seed: u64, cfg: MutateConfig) -> Self {
        Self { rng: Pcg32::seed_from_u64(seed), cfg }
    }
}

impl<R: Rng> RandomMutator<R> {
    fn edit_once(&mut self, circles: &mut CircleSet, width: u32, height: u32) {
        if self.rng.random_bool(self.cfg.p_add) {
            circles.push(Circle::random(&mut self.rng, width, height, &self.cfg));
        } else if !circles.is_empty() {
            let index = self.rng.random_range(0..circles.len());
            circles.remove(index);
        }
    }
}

impl<R: Rng> Mutator for RandomMutator<R> {
    fn mutate(&mut self, mut circles: CircleSet, width: u32, height: u32) -> CircleSet {
        profiling::scope!("RandomMutator::mutate");
        loop {
            self.edit_once(&mut circles, width, height);
            if !self.rng.random_bool(self.cfg.p_continue) {
                break;
            }
        }
        circles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_never_underflows() {
        let mut m = RandomMutator::seeded(1, MutateConfig { p_add: 0.0, ..Default::default() });
        for _ in 0..200 {
            let out = m.mutate(CircleSet::new(), 10, 10);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_always_add_grows_by_at_least_one() {
        let mut m = RandomMutator::seeded(2, MutateConfig { p_add: 1.0, ..Default::default() });
        let mut total = 0usize;
        for _ in 0..500 {
            let out = m.mutate(CircleSet::new(), 10, 10);
            assert!(out.len() >= 1);
            total += out.len();
        }
        // geometric with p_continue = 0.5 averages 2 edits
        let mean = total as f64 / 500.0;
        assert!(mean > 1.5 && mean < 2.5, "mean edits {mean}");
    }

    #[test]
    fn test_no_continue_means_exactly_one_edit() {
        let cfg = MutateConfig { p_continue: 0.0, ..Default::default() };
        let mut m = RandomMutator::seeded(3, cfg);
        let start = CircleSet::from(vec![Circle::new(1, 1, 1, 20, [0, 0, 0]); 5]);
        for _ in 0..200 {
            let out = m.mutate(start.clone(), 10, 10);
            let diff = out.len() as i64 - start.len() as i64;
            assert!(diff == 1 || diff == -1);
        }
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let cfg = MutateConfig { p_add: 0.0, p_continue: 0.0, ..Default::default() };
        let mut m = RandomMutator::seeded(4, cfg);
        let start: Vec<Circle> = (0..6).map(|i| Circle::new(i, i, 1, 20, [0, 0, 0])).collect();
        let out = m.mutate(CircleSet::from(start.clone()), 10, 10);
        assert_eq!(out.len(), 5);
        let xs: Vec<i32> = out.iter().map(|c| c.x).collect();
        let mut sorted = xs.clone();
        sorted.sort();
        assert_eq!(xs, sorted);
    }

    #[test]
    fn test_added_circles_land_in_bounds() {
        let cfg = MutateConfig { p_add: 1.0, ..Default::default() };
        let mut m = RandomMutator::seeded(5, cfg);
        let out = m.mutate(CircleSet::new(), 8, 3);
        for c in &out {
            assert!((0..8).contains(&c.x) && (0..3).contains(&c.y));
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let cfg = MutateConfig::default();
        let a = RandomMutator::seeded(9, cfg.clone()).mutate(CircleSet::new(), 20, 20);
        let b = RandomMutator::seeded(9, cfg).mutate(CircleSet::new(), 20, 20);
        assert_eq!(a, b);
    }
}
