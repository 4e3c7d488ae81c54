//! Networked Epstein civil-violence model.
//!
//! Citizens on a toroidal grid turn Active or stay Quiescent depending on
//! grievance, perceived legitimacy, social-network contagion and the risk of
//! arrest; cops patrol and jail visible rebels. [`SimulationState`] owns one
//! run and exposes `initialize` / `step` / `snapshot` / `is_running`;
//! [`batch::ParameterSweep`] drives many independent runs.

pub mod agent;
pub mod batch;
pub mod config;
pub mod error;
pub mod grid;
pub mod jail;
pub mod metrics;
pub mod model;
pub mod network;
pub mod rng;
pub mod rules;
pub mod scenario;
pub mod scheduler;

pub use agent::{Agent, AgentId, Breed, Citizen, Condition, Cop};
pub use config::SimulationConfig;
pub use error::{BatchError, ConfigError, GridError, SimError};
pub use grid::{Pos, SpatialGrid};
pub use metrics::{AgentRow, Counts, MetricsCollector, ModelRow};
pub use model::{Phase, SimulationState, Snapshot};
pub use rng::RandomSource;
