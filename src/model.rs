//! The networked civil-violence model.
//!
//! [`SimulationState`] owns the grid, the agent registry, the random stream
//! and the metrics collector. A tick is:
//!
//! 1. every agent acts once, in a freshly shuffled order;
//! 2. every outstanding jail sentence drops by one;
//! 3. aggregate counts are refreshed and the collector samples them;
//! 4. the iteration counter advances, and the model stops running once it
//!    passes `max_iters`.

use serde::Serialize;

use crate::agent::{Agent, AgentId, Citizen, Cop};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::grid::{Pos, SpatialGrid};
use crate::jail::JailTracker;
use crate::metrics::{AgentRow, Counts, MetricsCollector};
use crate::network::build_networks;
use crate::rng::RandomSource;
use crate::rules::{self, RuleParams, TickContext};
use crate::scheduler::RandomActivation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Initializing,
    Running,
    Terminated,
}

#[derive(Debug)]
pub struct SimulationState {
    config: SimulationConfig,
    params: RuleParams,
    phase: Phase,
    iteration: u64,
    running: bool,
    counts: Counts,
    grid: SpatialGrid,
    agents: Vec<Agent>,
    rng: RandomSource,
    scheduler: RandomActivation,
    jail: JailTracker,
    metrics: MetricsCollector,
}

/// Read-only view of the model for renderers and reporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub iteration: u64,
    pub running: bool,
    pub phase: Phase,
    pub counts: Counts,
    pub speed_of_rebellion_transmission: f64,
    pub agents: Vec<AgentRow>,
}

impl SimulationState {
    /// Validate `config`, scatter agents over the grid, wire up the social
    /// networks and take the iteration-0 sample.
    pub fn initialize(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut state = Self::empty(config);

        let cells: Vec<Pos> = state.grid.coord_iter().collect();
        for pos in cells {
            if state.rng.unit() < state.config.cop_density {
                state.add_cop(pos)?;
            } else if state.rng.unit() < state.config.cop_density + state.config.citizen_density {
                let hardship = state.rng.unit();
                let risk_aversion = state.rng.unit();
                state.add_citizen(pos, hardship, risk_aversion)?;
            }
        }

        state.finish_initialization();
        Ok(state)
    }

    /// Validated model with an empty grid. Agents are added with
    /// [`add_cop`](Self::add_cop) / [`add_citizen`](Self::add_citizen) and the
    /// model is started with [`finish_initialization`](Self::finish_initialization).
    pub(crate) fn with_empty_grid(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    fn empty(config: SimulationConfig) -> Self {
        let rng = RandomSource::new(config.seed);
        let metrics = MetricsCollector::new(rng.seed(), config.collect_agent_reporters);
        Self {
            params: RuleParams::from(&config),
            phase: Phase::Initializing,
            iteration: 0,
            running: true,
            counts: Counts::default(),
            grid: SpatialGrid::new(config.width, config.height),
            agents: Vec::new(),
            rng,
            scheduler: RandomActivation::new(),
            jail: JailTracker,
            metrics,
            config,
        }
    }

    pub(crate) fn add_cop(&mut self, pos: Pos) -> Result<AgentId, SimError> {
        let agent = Agent::Cop(Cop::new(pos, self.config.cop_vision));
        self.register(agent)
    }

    pub(crate) fn add_citizen(
        &mut self,
        pos: Pos,
        hardship: f64,
        risk_aversion: f64,
    ) -> Result<AgentId, SimError> {
        let agent = Agent::Citizen(Citizen::new(
            pos,
            self.config.citizen_vision,
            hardship,
            risk_aversion,
            self.config.legitimacy,
            self.config.active_threshold,
        ));
        self.register(agent)
    }

    fn register(&mut self, agent: Agent) -> Result<AgentId, SimError> {
        debug_assert_eq!(self.phase, Phase::Initializing);
        let id = AgentId::new(self.agents.len());
        self.grid.place(id, agent.pos())?;
        self.agents.push(agent);
        Ok(id)
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Build networks from final positions, take the first sample and
    /// switch to `Running`.
    pub(crate) fn finish_initialization(&mut self) {
        build_networks(&mut self.agents, self.config.citizen_network_size, &mut self.rng);
        self.counts = Counts::tally(&self.agents);
        self.metrics.collect(self.iteration, &self.agents);
        self.phase = Phase::Running;
        tracing::info!(
            seed = self.rng.seed(),
            citizens = self.counts.citizens,
            cops = self.counts.cops,
            width = self.config.width,
            height = self.config.height,
            "civil violence model initialized"
        );
    }

    /// Advance one tick.
    pub fn step(&mut self) -> &mut Self {
        let mut ctx = TickContext {
            grid: &mut self.grid,
            agents: &mut self.agents,
            rng: &mut self.rng,
            params: &self.params,
        };
        let order = self.scheduler.order(ctx.agents.len(), ctx.rng);
        for &id in order {
            if let Some(arrest) = rules::act(&mut ctx, id) {
                tracing::trace!(
                    cop = %arrest.cop,
                    citizen = %arrest.citizen,
                    sentence = arrest.sentence,
                    "arrest"
                );
            }
        }

        let released = self.jail.serve_tick(&mut self.agents);
        self.counts = Counts::tally(&self.agents);
        self.iteration += 1;
        self.metrics.collect(self.iteration, &self.agents);
        tracing::debug!(
            iteration = self.iteration,
            active = self.counts.active,
            quiescent = self.counts.quiescent,
            jailed = self.counts.jailed,
            released,
            "tick complete"
        );

        if self.iteration > self.config.max_iters && self.running {
            self.running = false;
            self.phase = Phase::Terminated;
            tracing::info!(iteration = self.iteration, "max iterations exceeded, stopping");
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn citizen_count(&self) -> usize {
        self.counts.citizens
    }

    pub fn cop_count(&self) -> usize {
        self.counts.cops
    }

    pub fn active_count(&self) -> usize {
        self.counts.active
    }

    pub fn quiescent_count(&self) -> usize {
        self.counts.quiescent
    }

    pub fn jail_count(&self) -> usize {
        self.counts.jailed
    }

    pub fn speed_of_rebellion_transmission(&self) -> f64 {
        self.counts.speed_of_rebellion_transmission()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Move an agent by `(dx, dy)` on the torus. An occupied destination
    /// leaves it in place and returns false.
    pub fn move_agent(&mut self, id: AgentId, dx: isize, dy: isize) -> bool {
        let Some(agent) = self.agents.get_mut(id.index()) else {
            return false;
        };
        match self.grid.move_by(agent.pos(), dx, dy) {
            Some(to) => {
                agent.set_pos(to);
                true
            }
            None => false,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// End the run and keep only its reporters.
    pub fn into_metrics(self) -> MetricsCollector {
        self.metrics
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            iteration: self.iteration,
            running: self.running,
            phase: self.phase,
            counts: self.counts,
            speed_of_rebellion_transmission: self.counts.speed_of_rebellion_transmission(),
            agents: self
                .agents
                .iter()
                .enumerate()
                .map(|(i, agent)| AgentRow::new(self.iteration, AgentId::new(i), agent))
                .collect(),
        }
    }
}
