//! Per-turn decision rules for citizens and cops.
//!
//! A turn reads the acting agent's surroundings first, then writes: the
//! acting agent's own state, an arrestee's sentence, and finally the grid
//! when the agent relocates. Nothing here allocates agents or touches
//! other agents' positions.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::agent::{Agent, AgentId, Condition};
use crate::config::SimulationConfig;
use crate::grid::{Pos, SpatialGrid};
use crate::network::active_fraction;

/// The subset of the configuration the rules read every turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleParams {
    pub arrest_prob_constant: f64,
    pub network_discount_factor: f64,
    pub max_jail_term: u32,
    pub movement: bool,
}

impl From<&SimulationConfig> for RuleParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            arrest_prob_constant: config.arrest_prob_constant,
            network_discount_factor: config.network_discount_factor,
            max_jail_term: config.max_jail_term,
            movement: config.movement,
        }
    }
}

/// Everything an agent may read or mutate during its turn.
pub struct TickContext<'a> {
    pub grid: &'a mut SpatialGrid,
    pub agents: &'a mut [Agent],
    pub rng: &'a mut dyn RngCore,
    pub params: &'a RuleParams,
}

/// A cop jailing a citizen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrest {
    pub cop: AgentId,
    pub citizen: AgentId,
    pub sentence: u32,
}

/// What one agent can see within its vision.
#[derive(Debug, Default)]
struct Surroundings {
    cops: usize,
    /// Visible citizens that are Active and free.
    rebels: Vec<AgentId>,
    empty: Vec<Pos>,
}

fn survey(grid: &SpatialGrid, agents: &[Agent], center: Pos, vision: usize) -> Surroundings {
    let mut view = Surroundings::default();
    for (_, id) in grid.neighbors_within(center, vision) {
        match &agents[id.index()] {
            Agent::Cop(_) => view.cops += 1,
            Agent::Citizen(c) if c.is_rebelling() => view.rebels.push(id),
            Agent::Citizen(_) => {}
        }
    }
    view.empty = grid.empty_cells_within(center, vision).collect();
    view
}

/// `1 - exp(-k * floor(C / max(A, 1)))`.
pub fn arrest_probability(constant: f64, cops: usize, actives: usize) -> f64 {
    let ratio = cops / actives.max(1);
    1.0 - (-constant * ratio as f64).exp()
}

/// Run `id`'s turn, dispatching on its variant. Returns the arrest a cop
/// made, if any.
pub fn act(ctx: &mut TickContext, id: AgentId) -> Option<Arrest> {
    match ctx.agents[id.index()] {
        Agent::Citizen(_) => {
            citizen_turn(ctx, id);
            None
        }
        Agent::Cop(_) => cop_turn(ctx, id),
    }
}

fn citizen_turn(ctx: &mut TickContext, id: AgentId) {
    let Some(citizen) = ctx.agents[id.index()].as_citizen() else {
        return;
    };
    if citizen.is_jailed() {
        return;
    }

    let view = survey(ctx.grid, ctx.agents, citizen.pos, citizen.vision);
    let contagion = active_fraction(ctx.agents, &citizen.network);
    let effective_grievance = citizen.grievance() + ctx.params.network_discount_factor * contagion;
    // The citizen counts itself among the actives.
    let probability =
        arrest_probability(ctx.params.arrest_prob_constant, view.cops, view.rebels.len() + 1);
    let rebels =
        effective_grievance - citizen.risk_aversion * probability > citizen.active_threshold;

    if let Some(citizen) = ctx.agents[id.index()].as_citizen_mut() {
        citizen.arrest_probability = probability;
        citizen.set_condition(if rebels {
            Condition::Active
        } else {
            Condition::Quiescent
        });
    }

    if ctx.params.movement {
        relocate(ctx, id, &view.empty);
    }
}

fn cop_turn(ctx: &mut TickContext, id: AgentId) -> Option<Arrest> {
    let agent = &ctx.agents[id.index()];
    let view = survey(ctx.grid, ctx.agents, agent.pos(), agent.vision());

    let arrest = match view.rebels.choose(ctx.rng) {
        Some(&target) => {
            let sentence = ctx.rng.random_range(1..=ctx.params.max_jail_term);
            ctx.agents[target.index()]
                .as_citizen_mut()
                .map(|citizen| {
                    citizen.jail_sentence = sentence;
                    Arrest {
                        cop: id,
                        citizen: target,
                        sentence,
                    }
                })
        }
        None => None,
    };

    if ctx.params.movement {
        relocate(ctx, id, &view.empty);
    }
    arrest
}

/// Move to a uniformly chosen free cell. With no free cell the agent stays.
fn relocate(ctx: &mut TickContext, id: AgentId, empty: &[Pos]) {
    let Some(&to) = empty.choose(ctx.rng) else {
        return;
    };
    let from = ctx.agents[id.index()].pos();
    if ctx.grid.move_agent(from, to) {
        ctx.agents[id.index()].set_pos(to);
    }
}
