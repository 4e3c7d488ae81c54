use crate::agent::Agent;

/// Serves one tick of every outstanding sentence.
///
/// Runs after all turns of a tick. A citizen whose sentence reaches zero is
/// free from the next tick on; its condition is left as it was and gets
/// re-evaluated on its next turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct JailTracker;

impl JailTracker {
    /// Decrement every positive sentence. Returns how many citizens were released.
    pub fn serve_tick(&self, agents: &mut [Agent]) -> usize {
        let mut released = 0;
        for citizen in agents.iter_mut().filter_map(Agent::as_citizen_mut) {
            if citizen.jail_sentence > 0 {
                citizen.jail_sentence -= 1;
                if citizen.jail_sentence == 0 {
                    released += 1;
                }
            }
        }
        released
    }

    /// Citizens currently serving a sentence.
    pub fn jailed_count(&self, agents: &[Agent]) -> usize {
        agents
            .iter()
            .filter_map(Agent::as_citizen)
            .filter(|c| c.is_jailed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Citizen, Condition, Cop};
    use crate::grid::Pos;

    fn jailed(sentence: u32) -> Agent {
        let mut c = Citizen::new(Pos::new(0, 0), 1, 1.0, 0.0, 0.0, 0.1);
        c.set_condition(Condition::Active);
        c.jail_sentence = sentence;
        Agent::Citizen(c)
    }

    #[test]
    fn sentences_drop_by_one_and_floor_at_zero() {
        let mut agents = vec![
            jailed(2),
            jailed(1),
            jailed(0),
            Agent::Cop(Cop::new(Pos::new(1, 1), 1)),
        ];
        let tracker = JailTracker;

        assert_eq!(tracker.jailed_count(&agents), 2);
        assert_eq!(tracker.serve_tick(&mut agents), 1);
        let sentences: Vec<u32> = agents
            .iter()
            .filter_map(Agent::as_citizen)
            .map(|c| c.jail_sentence)
            .collect();
        assert_eq!(sentences, vec![1, 0, 0]);

        assert_eq!(tracker.serve_tick(&mut agents), 1);
        assert_eq!(tracker.serve_tick(&mut agents), 0);
        assert_eq!(tracker.jailed_count(&agents), 0);
    }

    #[test]
    fn release_keeps_last_condition() {
        let mut agents = vec![jailed(1)];
        JailTracker.serve_tick(&mut agents);
        let c = agents[0].as_citizen().unwrap();
        assert!(!c.is_jailed());
        assert_eq!(c.condition, Condition::Active);
    }
}
