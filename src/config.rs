use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Slack allowed on the density sum so that e.g. `0.7 + 0.3` counts as 1.
const DENSITY_EPSILON: f64 = 1e-9;

/// Tunables for one civil-violence run.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Approximate fraction of cells occupied by citizens.
    pub citizen_density: f64,
    /// Approximate fraction of cells occupied by cops.
    pub cop_density: f64,
    /// Cells in each direction a citizen can inspect.
    pub citizen_vision: usize,
    /// Cells in each direction a cop can inspect.
    pub cop_vision: usize,
    /// Perceived regime legitimacy, shared by all citizens.
    pub legitimacy: f64,
    /// Peers sampled into each citizen's social network.
    pub citizen_network_size: usize,
    /// Upper bound (inclusive) of a drawn jail sentence.
    pub max_jail_term: u32,
    /// A citizen rebels when net risk-adjusted grievance exceeds this.
    pub active_threshold: f64,
    /// Scales the arrest probability estimate.
    pub arrest_prob_constant: f64,
    /// Weight of network contagion relative to spatial grievance.
    pub network_discount_factor: f64,
    /// Whether agents try to relocate at the end of their turn.
    pub movement: bool,
    /// The model stops running once the iteration count exceeds this.
    pub max_iters: u64,
    /// RNG seed. `None` draws a fresh one, which is then reported.
    pub seed: Option<u64>,
    /// Record per-agent reporter rows every tick.
    pub collect_agent_reporters: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            citizen_density: 0.7,
            cop_density: 0.074,
            citizen_vision: 7,
            cop_vision: 7,
            legitimacy: 0.8,
            citizen_network_size: 20,
            max_jail_term: 1000,
            active_threshold: 0.1,
            arrest_prob_constant: 2.3,
            network_discount_factor: 0.5,
            movement: true,
            max_iters: 1000,
            seed: None,
            collect_agent_reporters: true,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check every range constraint. Called by the model before placement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::NonPositiveDimension {
                width: self.width,
                height: self.height,
            });
        }
        for (name, value) in [
            ("citizen_density", self.citizen_density),
            ("cop_density", self.cop_density),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::DensityOutOfRange { name, value });
            }
        }
        if self.cop_density + self.citizen_density > 1.0 + DENSITY_EPSILON {
            return Err(ConfigError::DensitySumExceedsOne {
                cop: self.cop_density,
                citizen: self.citizen_density,
            });
        }
        if !(0.0..=1.0).contains(&self.legitimacy) {
            return Err(ConfigError::LegitimacyOutOfRange(self.legitimacy));
        }
        if self.max_jail_term < 1 {
            return Err(ConfigError::InvalidJailTerm(self.max_jail_term));
        }
        if !(self.arrest_prob_constant.is_finite() && self.arrest_prob_constant > 0.0) {
            return Err(ConfigError::InvalidArrestConstant(self.arrest_prob_constant));
        }
        if !(self.network_discount_factor.is_finite() && self.network_discount_factor >= 0.0) {
            return Err(ConfigError::InvalidDiscountFactor(
                self.network_discount_factor,
            ));
        }
        if !self.active_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.active_threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn density_sum_of_exactly_one_is_accepted() {
        let config = SimulationConfig {
            citizen_density: 0.7,
            cop_density: 0.3,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn density_sum_above_one_is_rejected() {
        let config = SimulationConfig {
            citizen_density: 0.8,
            cop_density: 0.3,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DensitySumExceedsOne { .. })
        ));
    }

    #[test]
    fn zero_width_is_rejected() {
        let config = SimulationConfig {
            width: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveDimension { width: 0, .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let negative_density = SimulationConfig {
            cop_density: -0.1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            negative_density.validate(),
            Err(ConfigError::DensityOutOfRange { name: "cop_density", .. })
        ));

        let legitimacy = SimulationConfig {
            legitimacy: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            legitimacy.validate(),
            Err(ConfigError::LegitimacyOutOfRange(_))
        ));

        let jail = SimulationConfig {
            max_jail_term: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(jail.validate(), Err(ConfigError::InvalidJailTerm(0))));

        let arrest = SimulationConfig {
            arrest_prob_constant: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            arrest.validate(),
            Err(ConfigError::InvalidArrestConstant(_))
        ));

        let discount = SimulationConfig {
            network_discount_factor: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            discount.validate(),
            Err(ConfigError::InvalidDiscountFactor(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SimulationConfig::from_json_str(r#"{"width": 10, "seed": 7}"#).unwrap();
        assert_eq!(config.width, 10);
        assert_eq!(config.height, 40);
        assert_eq!(config.seed, Some(7));
        assert!(config.movement);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SimulationConfig::from_json_str("{width: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
