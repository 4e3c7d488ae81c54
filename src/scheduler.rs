use rand::RngCore;
use rand::seq::SliceRandom;

use crate::agent::AgentId;

/// Activates every agent once per tick in a freshly shuffled order.
///
/// The order is rebuilt from registry order before each shuffle, so a
/// tick's permutation depends only on the random stream, never on the
/// previous tick's permutation.
#[derive(Debug, Clone, Default)]
pub struct RandomActivation {
    order: Vec<AgentId>,
}

impl RandomActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform permutation of `0..agent_count`.
    pub fn order(&mut self, agent_count: usize, rng: &mut dyn RngCore) -> &[AgentId] {
        self.order.clear();
        self.order.extend((0..agent_count).map(AgentId::new));
        self.order.shuffle(rng);
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn order_is_a_permutation() {
        let mut scheduler = RandomActivation::new();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut order = scheduler.order(50, &mut rng).to_vec();
        order.sort();
        assert_eq!(order, (0..50).map(AgentId::new).collect::<Vec<_>>());
    }

    #[test]
    fn order_changes_between_ticks() {
        let mut scheduler = RandomActivation::new();
        let mut rng = SmallRng::seed_from_u64(42);
        let first = scheduler.order(50, &mut rng).to_vec();
        let second = scheduler.order(50, &mut rng).to_vec();
        assert_ne!(first, second);
    }

    #[test]
    fn same_seed_same_orders() {
        let mut a = RandomActivation::new();
        let mut b = RandomActivation::new();
        let mut rng_a = SmallRng::seed_from_u64(9);
        let mut rng_b = SmallRng::seed_from_u64(9);
        for _ in 0..5 {
            assert_eq!(a.order(20, &mut rng_a), b.order(20, &mut rng_b));
        }
    }

    #[test]
    fn empty_registry_yields_empty_order() {
        let mut scheduler = RandomActivation::new();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(scheduler.order(0, &mut rng).is_empty());
    }
}
