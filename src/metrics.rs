//! Per-tick aggregate counts and per-agent reporter rows.
//!
//! The collector is owned by the model while it runs and can be taken out
//! with [`SimulationState::into_metrics`](crate::model::SimulationState::into_metrics)
//! once the run is over. Export helpers write JSONL (one object per line) and
//! the CSV layout the batch driver uses.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, Breed, Condition};

/// Aggregate agent counts at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub citizens: usize,
    pub cops: usize,
    pub active: usize,
    pub quiescent: usize,
    pub jailed: usize,
    /// Citizens that have been Active at least once.
    pub flipped: usize,
}

impl Counts {
    pub fn tally(agents: &[Agent]) -> Self {
        let mut counts = Self::default();
        for agent in agents {
            match agent {
                Agent::Cop(_) => counts.cops += 1,
                Agent::Citizen(c) => {
                    counts.citizens += 1;
                    match c.condition {
                        Condition::Active => counts.active += 1,
                        Condition::Quiescent => counts.quiescent += 1,
                    }
                    if c.is_jailed() {
                        counts.jailed += 1;
                    }
                    if c.flipped {
                        counts.flipped += 1;
                    }
                }
            }
        }
        counts
    }

    /// Fraction of citizens that have ever rebelled; 0 with no citizens.
    pub fn speed_of_rebellion_transmission(&self) -> f64 {
        if self.citizens == 0 {
            return 0.0;
        }
        self.flipped as f64 / self.citizens as f64
    }
}

/// Model-level reporters for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    pub iteration: u64,
    pub quiescent: usize,
    pub active: usize,
    pub jailed: usize,
    pub speed_of_rebellion_transmission: f64,
    pub seed: u64,
}

/// Agent-level reporters for one iteration. Citizen-only fields are `None`
/// for cops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    pub iteration: u64,
    pub agent_id: AgentId,
    pub x: usize,
    pub y: usize,
    pub breed: Breed,
    pub jail_sentence: Option<u32>,
    pub condition: Option<Condition>,
    pub arrest_probability: Option<f64>,
}

impl AgentRow {
    pub fn new(iteration: u64, id: AgentId, agent: &Agent) -> Self {
        let pos = agent.pos();
        let citizen = agent.as_citizen();
        Self {
            iteration,
            agent_id: id,
            x: pos.x,
            y: pos.y,
            breed: agent.breed(),
            jail_sentence: citizen.map(|c| c.jail_sentence),
            condition: citizen.map(|c| c.condition),
            arrest_probability: citizen.map(|c| c.arrest_probability),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    seed: u64,
    collect_agents: bool,
    model_rows: Vec<ModelRow>,
    agent_rows: Vec<AgentRow>,
}

impl MetricsCollector {
    pub fn new(seed: u64, collect_agents: bool) -> Self {
        Self {
            seed,
            collect_agents,
            model_rows: Vec::new(),
            agent_rows: Vec::new(),
        }
    }

    /// Sample the registry for `iteration` and append the rows.
    pub fn collect(&mut self, iteration: u64, agents: &[Agent]) -> ModelRow {
        let counts = Counts::tally(agents);
        let row = ModelRow {
            iteration,
            quiescent: counts.quiescent,
            active: counts.active,
            jailed: counts.jailed,
            speed_of_rebellion_transmission: counts.speed_of_rebellion_transmission(),
            seed: self.seed,
        };
        self.model_rows.push(row);
        if self.collect_agents {
            self.agent_rows.extend(
                agents
                    .iter()
                    .enumerate()
                    .map(|(i, agent)| AgentRow::new(iteration, AgentId::new(i), agent)),
            );
        }
        row
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn model_rows(&self) -> &[ModelRow] {
        &self.model_rows
    }

    pub fn agent_rows(&self) -> &[AgentRow] {
        &self.agent_rows
    }

    pub fn latest(&self) -> Option<&ModelRow> {
        self.model_rows.last()
    }

    /// Agent rows recorded for one iteration.
    pub fn agent_rows_at(&self, iteration: u64) -> impl Iterator<Item = &AgentRow> {
        self.agent_rows
            .iter()
            .filter(move |row| row.iteration == iteration)
    }
}

/// Write serializable items as JSONL (one JSON object per line).
pub fn write_jsonl<T: Serialize>(
    path: &Path,
    items: impl IntoIterator<Item = T>,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

pub const MODEL_CSV_HEADER: &str = "Step,Quiescent,Active,Jailed,SpeedOfRebellionTransmission,Seed";

/// Write the model time series as CSV, one line per iteration.
pub fn write_model_csv(path: &Path, rows: &[ModelRow]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{MODEL_CSV_HEADER}")?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            row.iteration,
            row.quiescent,
            row.active,
            row.jailed,
            row.speed_of_rebellion_transmission,
            row.seed
        )?;
    }
    writer.flush()
}
