//! One-time construction of citizens' social networks.
//!
//! Each citizen samples `citizen_network_size` peers from every other
//! citizen, with replacement, weighted by straight-line distance normalized
//! to the farthest candidate. Draws bisect a prefix sum of those weights
//! against a uniform draw scaled to the total, so duplicates are expected.

use rand::{Rng, RngCore};

use crate::agent::{Agent, AgentId};

/// Draw `k` indices into `weights`, with replacement.
///
/// Returns an empty vector if there is nothing to draw from or every
/// weight is zero.
pub fn sample_with_replacement(weights: &[f64], k: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for &w in weights {
        total += w;
        cumulative.push(total);
    }
    if total <= 0.0 {
        return Vec::new();
    }
    let last = weights.len() - 1;
    (0..k)
        .map(|_| {
            let target = rng.random::<f64>() * total;
            cumulative.partition_point(|&c| c <= target).min(last)
        })
        .collect()
}

/// Assign every citizen its peer list. Citizens are visited in registry order.
pub fn build_networks(agents: &mut [Agent], network_size: usize, rng: &mut dyn RngCore) {
    let citizens: Vec<(AgentId, crate::grid::Pos)> = agents
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_cop())
        .map(|(i, a)| (AgentId::new(i), a.pos()))
        .collect();

    for &(id, pos) in &citizens {
        let (peers, distances): (Vec<AgentId>, Vec<f64>) = citizens
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|&(other, other_pos)| (other, pos.euclidean(other_pos)))
            .unzip();

        let max_distance = distances.iter().copied().fold(0.0, f64::max);
        let network = if max_distance > 0.0 {
            let weights: Vec<f64> = distances.iter().map(|d| d / max_distance).collect();
            sample_with_replacement(&weights, network_size, rng)
                .into_iter()
                .map(|i| peers[i])
                .collect()
        } else {
            Vec::new()
        };

        if let Some(citizen) = agents[id.index()].as_citizen_mut() {
            citizen.network = network;
        }
    }
}

/// Fraction of `network` currently Active (jailed or not). Empty networks
/// contribute nothing.
pub fn active_fraction(agents: &[Agent], network: &[AgentId]) -> f64 {
    if network.is_empty() {
        return 0.0;
    }
    let active = network
        .iter()
        .filter(|peer| {
            agents[peer.index()]
                .as_citizen()
                .is_some_and(|c| c.is_active())
        })
        .count();
    active as f64 / network.len() as f64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::agent::{Citizen, Condition, Cop};
    use crate::grid::Pos;

    fn citizen_at(x: usize, y: usize) -> Agent {
        Agent::Citizen(Citizen::new(Pos::new(x, y), 7, 0.5, 0.5, 0.8, 0.1))
    }

    #[test]
    fn sampling_keeps_duplicates_and_length() {
        let mut rng = SmallRng::seed_from_u64(42);
        let picks = sample_with_replacement(&[1.0, 0.5], 50, &mut rng);
        assert_eq!(picks.len(), 50);
        assert!(picks.iter().all(|&i| i < 2));
        assert!(picks.iter().filter(|&&i| i == 0).count() > 1);
    }

    #[test]
    fn zero_weight_is_never_drawn() {
        let mut rng = SmallRng::seed_from_u64(7);
        let picks = sample_with_replacement(&[0.0, 1.0, 0.0], 200, &mut rng);
        assert!(picks.iter().all(|&i| i == 1));
    }

    #[test]
    fn heavier_weight_is_drawn_more_often() {
        let mut rng = SmallRng::seed_from_u64(3);
        let picks = sample_with_replacement(&[0.1, 1.0], 2000, &mut rng);
        let heavy = picks.iter().filter(|&&i| i == 1).count();
        assert!(heavy > 1500, "heavy index drawn {heavy} times");
    }

    #[test]
    fn empty_or_zero_weights_yield_nothing() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(sample_with_replacement(&[], 5, &mut rng).is_empty());
        assert!(sample_with_replacement(&[0.0, 0.0], 5, &mut rng).is_empty());
    }

    #[test]
    fn networks_have_fixed_size_and_skip_self_and_cops() {
        let mut agents = vec![
            citizen_at(0, 0),
            Agent::Cop(Cop::new(Pos::new(1, 1), 7)),
            citizen_at(3, 4),
            citizen_at(9, 9),
        ];
        let mut rng = SmallRng::seed_from_u64(42);
        build_networks(&mut agents, 20, &mut rng);

        for (i, agent) in agents.iter().enumerate() {
            let Some(c) = agent.as_citizen() else { continue };
            assert_eq!(c.network.len(), 20);
            assert!(c.network.iter().all(|p| p.index() != i));
            assert!(c.network.iter().all(|p| p.index() != 1));
        }
    }

    #[test]
    fn lone_citizen_has_empty_network() {
        let mut agents = vec![citizen_at(2, 2), Agent::Cop(Cop::new(Pos::new(0, 0), 7))];
        let mut rng = SmallRng::seed_from_u64(42);
        build_networks(&mut agents, 20, &mut rng);
        assert!(agents[0].as_citizen().unwrap().network.is_empty());
    }

    #[test]
    fn active_fraction_counts_duplicates() {
        let mut agents = vec![citizen_at(0, 0), citizen_at(1, 0), citizen_at(2, 0)];
        agents[1]
            .as_citizen_mut()
            .unwrap()
            .set_condition(Condition::Active);
        let network = vec![AgentId::new(1), AgentId::new(1), AgentId::new(2), AgentId::new(0)];
        assert!((active_fraction(&agents, &network) - 0.5).abs() < 1e-12);
        assert_eq!(active_fraction(&agents, &[]), 0.0);
    }
}
