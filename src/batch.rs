//! Parameter-sweep driver.
//!
//! A sweep takes a fixed configuration plus ordered lists of values for the
//! parameters to vary, expands their cross product (last parameter varies
//! fastest), and runs every combination as an independent model. Runs share
//! nothing, so they execute in parallel on the rayon pool; results come back
//! in combination order regardless.
//!
//! Overrides go through serde: the fixed config is serialized to JSON, the
//! varying fields are replaced, and the result is deserialized and validated
//! like any other config.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use serde_json::Value;

use crate::config::SimulationConfig;
use crate::error::BatchError;
use crate::metrics::{ModelRow, write_model_csv};
use crate::model::SimulationState;

/// One point of the cross product: `(parameter, value)` pairs in sweep order.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub values: Vec<(String, Value)>,
}

impl Combination {
    /// File-name friendly label, e.g. `citizen_network_size=1_seed=3`.
    pub fn key(&self) -> String {
        if self.values.is_empty() {
            return "default".to_string();
        }
        self.values
            .iter()
            .map(|(name, value)| format!("{name}={}", render(value)))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Apply the overrides to `fixed`.
    pub fn apply(&self, fixed: &SimulationConfig) -> Result<SimulationConfig, BatchError> {
        let mut json = serde_json::to_value(fixed)?;
        for (name, value) in &self.values {
            match json.get_mut(name.as_str()) {
                Some(slot) => *slot = value.clone(),
                None => return Err(BatchError::UnknownParameter(name.clone())),
            }
        }
        Ok(serde_json::from_value(json)?)
    }
}

/// Final reporters and full time series of one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub steps: u64,
    pub seed: u64,
    pub series: Vec<ModelRow>,
}

impl RunResult {
    pub fn last(&self) -> Option<&ModelRow> {
        self.series.last()
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub combination: Combination,
    pub result: Result<RunResult, BatchError>,
}

/// Files written for a sweep, plus per-run write failures.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub runs_written: usize,
    pub failures: Vec<(String, BatchError)>,
}

#[derive(Debug, Clone)]
pub struct ParameterSweep {
    fixed: SimulationConfig,
    varying: Vec<(String, Vec<Value>)>,
    max_steps: u64,
}

impl ParameterSweep {
    pub fn new(fixed: SimulationConfig, max_steps: u64) -> Self {
        Self {
            fixed,
            varying: Vec::new(),
            max_steps,
        }
    }

    /// Add a parameter to vary. Order of calls is the order of the cross product.
    pub fn vary<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.varying
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.varying.iter().map(|(name, _)| name.as_str())
    }

    pub fn combinations(&self) -> Vec<Combination> {
        let mut prefixes: Vec<Vec<(String, Value)>> = vec![Vec::new()];
        for (name, values) in &self.varying {
            prefixes = prefixes
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push((name.clone(), value.clone()));
                        next
                    })
                })
                .collect();
        }
        prefixes
            .into_iter()
            .map(|values| Combination { values })
            .collect()
    }

    /// Run every combination. A failing run does not affect the others.
    pub fn run(&self) -> Vec<RunOutcome> {
        self.combinations()
            .into_par_iter()
            .map(|combination| {
                let result = self.run_one(&combination);
                if let Err(err) = &result {
                    tracing::warn!(run = %combination.key(), error = %err, "batch run failed");
                }
                RunOutcome {
                    combination,
                    result,
                }
            })
            .collect()
    }

    fn run_one(&self, combination: &Combination) -> Result<RunResult, BatchError> {
        let mut config = combination.apply(&self.fixed)?;
        config.collect_agent_reporters = false;
        let mut state = SimulationState::initialize(config)?;
        let mut steps = 0;
        while steps < self.max_steps && state.is_running() {
            state.step();
            steps += 1;
        }
        let seed = state.seed();
        Ok(RunResult {
            steps,
            seed,
            series: state.into_metrics().model_rows().to_vec(),
        })
    }

    /// Write `model_batch.csv` (one row per successful run) and
    /// `step/<key>.csv` (each run's time series) under `dir`.
    ///
    /// Failing to write the summary is an error; a failing time-series file
    /// is recorded in the report and the remaining runs are still written.
    pub fn write_results(
        &self,
        outcomes: &[RunOutcome],
        dir: &Path,
    ) -> Result<BatchReport, BatchError> {
        let step_dir = dir.join("step");
        fs::create_dir_all(&step_dir).map_err(|source| BatchError::Io {
            path: step_dir.clone(),
            source,
        })?;

        let summary = dir.join("model_batch.csv");
        write_summary(&summary, self.parameter_names(), outcomes).map_err(|source| {
            BatchError::Io {
                path: summary.clone(),
                source,
            }
        })?;

        let mut report = BatchReport::default();
        for outcome in outcomes {
            let Ok(run) = &outcome.result else { continue };
            let key = outcome.combination.key();
            let path = step_dir.join(format!("{key}.csv"));
            match write_model_csv(&path, &run.series) {
                Ok(()) => report.runs_written += 1,
                Err(source) => {
                    tracing::warn!(run = %key, error = %source, "failed to write run series");
                    report.failures.push((key, BatchError::Io { path, source }));
                }
            }
        }
        Ok(report)
    }
}

fn write_summary<'a>(
    path: &Path,
    names: impl Iterator<Item = &'a str>,
    outcomes: &[RunOutcome],
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut header: Vec<&str> = names.collect();
    header.extend([
        "Steps",
        "Quiescent",
        "Active",
        "Jailed",
        "SpeedOfRebellionTransmission",
        "Seed",
    ]);
    writeln!(writer, "{}", header.join(","))?;

    for outcome in outcomes {
        let Ok(run) = &outcome.result else { continue };
        let Some(last) = run.last() else { continue };
        let mut fields: Vec<String> = outcome
            .combination
            .values
            .iter()
            .map(|(_, value)| render(value))
            .collect();
        fields.extend([
            run.steps.to_string(),
            last.quiescent.to_string(),
            last.active.to_string(),
            last.jailed.to_string(),
            last.speed_of_rebellion_transmission.to_string(),
            run.seed.to_string(),
        ]);
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> SimulationConfig {
        SimulationConfig {
            width: 10,
            height: 10,
            max_iters: 100,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn cross_product_varies_last_parameter_fastest() {
        let sweep = ParameterSweep::new(fixed(), 1)
            .vary("citizen_network_size", [1, 11])
            .vary("seed", [1, 2, 3]);
        let combos = sweep.combinations();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0].key(), "citizen_network_size=1_seed=1");
        assert_eq!(combos[1].key(), "citizen_network_size=1_seed=2");
        assert_eq!(combos[3].key(), "citizen_network_size=11_seed=1");
    }

    #[test]
    fn no_varying_parameters_is_a_single_run() {
        let combos = ParameterSweep::new(fixed(), 1).combinations();
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].key(), "default");
    }

    #[test]
    fn apply_overrides_fields() {
        let combo = Combination {
            values: vec![
                ("network_discount_factor".to_string(), Value::from(0.33)),
                ("seed".to_string(), Value::from(9)),
            ],
        };
        let config = combo.apply(&fixed()).unwrap();
        assert!((config.network_discount_factor - 0.33).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.width, 10);
    }

    #[test]
    fn apply_rejects_unknown_parameter() {
        let combo = Combination {
            values: vec![("not_a_field".to_string(), Value::from(1))],
        };
        assert!(matches!(
            combo.apply(&fixed()),
            Err(BatchError::UnknownParameter(name)) if name == "not_a_field"
        ));
    }

    #[test]
    fn run_stops_at_max_steps() {
        let outcomes = ParameterSweep::new(fixed(), 4).vary("seed", [5]).run();
        let run = outcomes[0].result.as_ref().unwrap();
        assert_eq!(run.steps, 4);
        assert_eq!(run.series.len(), 5);
        assert_eq!(run.seed, 5);
    }

    #[test]
    fn run_stops_when_model_terminates() {
        let config = SimulationConfig {
            max_iters: 2,
            ..fixed()
        };
        let outcomes = ParameterSweep::new(config, 50).vary("seed", [5]).run();
        let run = outcomes[0].result.as_ref().unwrap();
        assert_eq!(run.steps, 3);
    }
}
