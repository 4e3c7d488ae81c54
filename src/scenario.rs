use crate::agent::{AgentId, Condition};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::grid::Pos;
use crate::model::SimulationState;

enum Placement {
    Cop(Pos),
    Citizen {
        pos: Pos,
        hardship: f64,
        risk_aversion: f64,
        condition: Condition,
    },
}

/// Hand-placed model setup for tests and demos.
///
/// Starts from an empty grid (both densities zero, movement off, seed 42)
/// and places exactly the agents added here, in order, so the n-th added
/// agent gets `AgentId::new(n)`. Networks are still sampled normally when
/// the scenario is built.
pub struct Scenario {
    config: SimulationConfig,
    placements: Vec<Placement>,
}

/// Typed reference to a citizen in a [`Scenario`], enabling chained field mutation.
///
/// Call [`.id()`](CitizenRef::id) to terminate the chain and extract the handle.
pub struct CitizenRef<'a> {
    scenario: &'a mut Scenario,
    index: usize,
}

impl CitizenRef<'_> {
    fn set(mut self, f: impl FnOnce(&mut f64, &mut f64, &mut Condition)) -> Self {
        if let Placement::Citizen {
            hardship,
            risk_aversion,
            condition,
            ..
        } = &mut self.scenario.placements[self.index]
        {
            f(hardship, risk_aversion, condition);
        }
        self
    }

    pub fn hardship(self, v: f64) -> Self { self.set(|h, _, _| *h = v) }
    pub fn risk_aversion(self, v: f64) -> Self { self.set(|_, r, _| *r = v) }
    /// Start the citizen out Active (and therefore already flipped).
    pub fn active(self) -> Self { self.set(|_, _, c| *c = Condition::Active) }

    /// Terminate the chain and return the agent handle.
    pub fn id(self) -> AgentId { AgentId::new(self.index) }
}

impl Scenario {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            config: SimulationConfig {
                width,
                height,
                citizen_density: 0.0,
                cop_density: 0.0,
                movement: false,
                seed: Some(42),
                ..SimulationConfig::default()
            },
            placements: Vec::new(),
        }
    }

    /// Escape hatch: adjust any configuration field.
    pub fn with_config(mut self, f: impl FnOnce(&mut SimulationConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn add_cop(&mut self, x: usize, y: usize) -> AgentId {
        self.placements.push(Placement::Cop(Pos::new(x, y)));
        AgentId::new(self.placements.len() - 1)
    }

    /// Add a quiescent citizen with hardship and risk aversion of 0.5.
    pub fn citizen(&mut self, x: usize, y: usize) -> CitizenRef<'_> {
        self.placements.push(Placement::Citizen {
            pos: Pos::new(x, y),
            hardship: 0.5,
            risk_aversion: 0.5,
            condition: Condition::Quiescent,
        });
        let index = self.placements.len() - 1;
        CitizenRef {
            scenario: self,
            index,
        }
    }

    /// Validate, place everything and take the iteration-0 sample.
    pub fn build(self) -> Result<SimulationState, SimError> {
        let mut state = SimulationState::with_empty_grid(self.config)?;
        for placement in self.placements {
            match placement {
                Placement::Cop(pos) => {
                    state.add_cop(pos)?;
                }
                Placement::Citizen {
                    pos,
                    hardship,
                    risk_aversion,
                    condition,
                } => {
                    let id = state.add_citizen(pos, hardship, risk_aversion)?;
                    if let Some(citizen) = state.agents_mut()[id.index()].as_citizen_mut() {
                        citizen.set_condition(condition);
                    }
                }
            }
        }
        state.finish_initialization();
        Ok(state)
    }
}
