use civil_violence::{SimulationConfig, SimulationState};

/// `(quiescent, active, jailed, speed)` after each of `steps` ticks.
pub type Sample = (usize, usize, usize, f64);

pub fn run_series(config: SimulationConfig, steps: usize) -> Vec<Sample> {
    let mut state = SimulationState::initialize(config).unwrap();
    (0..steps)
        .map(|_| {
            state.step();
            (
                state.quiescent_count(),
                state.active_count(),
                state.jail_count(),
                state.speed_of_rebellion_transmission(),
            )
        })
        .collect()
}

/// Every citizen's jail sentence, in registry order.
pub fn sentences(state: &SimulationState) -> Vec<u32> {
    state
        .agents()
        .iter()
        .filter_map(|a| a.as_citizen())
        .map(|c| c.jail_sentence)
        .collect()
}

pub fn small_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        width: 20,
        height: 20,
        max_iters: 200,
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}
