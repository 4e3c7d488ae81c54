use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::Pos;

/// Handle into the model's agent registry.
///
/// Networks and grid cells hold these instead of references, so citizens
/// can point at each other without ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(usize);

impl AgentId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breed {
    Citizen,
    Cop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    #[default]
    Quiescent,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Citizen {
    pub pos: Pos,
    pub vision: usize,
    /// Private hardship, drawn once in `[0, 1)`.
    pub hardship: f64,
    pub risk_aversion: f64,
    pub regime_legitimacy: f64,
    pub active_threshold: f64,
    pub condition: Condition,
    /// Remaining ticks in jail; 0 means free.
    pub jail_sentence: u32,
    /// Last arrest-probability estimate, kept for reporting.
    pub arrest_probability: f64,
    /// Set the first time the citizen turns Active and never cleared.
    pub flipped: bool,
    /// Peers sampled at initialization. May contain duplicates.
    pub network: Vec<AgentId>,
}

impl Citizen {
    pub fn new(
        pos: Pos,
        vision: usize,
        hardship: f64,
        risk_aversion: f64,
        regime_legitimacy: f64,
        active_threshold: f64,
    ) -> Self {
        Self {
            pos,
            vision,
            hardship,
            risk_aversion,
            regime_legitimacy,
            active_threshold,
            condition: Condition::Quiescent,
            jail_sentence: 0,
            arrest_probability: 0.0,
            flipped: false,
            network: Vec::new(),
        }
    }

    /// Local grievance, `H * (1 - L)`.
    pub fn grievance(&self) -> f64 {
        self.hardship * (1.0 - self.regime_legitimacy)
    }

    pub fn is_jailed(&self) -> bool {
        self.jail_sentence > 0
    }

    pub fn is_active(&self) -> bool {
        self.condition == Condition::Active
    }

    /// Active and not in jail, i.e. visible to cops as an arrest target.
    pub fn is_rebelling(&self) -> bool {
        self.is_active() && !self.is_jailed()
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
        if condition == Condition::Active {
            self.flipped = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cop {
    pub pos: Pos,
    pub vision: usize,
}

impl Cop {
    pub fn new(pos: Pos, vision: usize) -> Self {
        Self { pos, vision }
    }
}

/// Every agent in the registry is one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Agent {
    Citizen(Citizen),
    Cop(Cop),
}

impl Agent {
    pub fn breed(&self) -> Breed {
        match self {
            Agent::Citizen(_) => Breed::Citizen,
            Agent::Cop(_) => Breed::Cop,
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            Agent::Citizen(c) => c.pos,
            Agent::Cop(c) => c.pos,
        }
    }

    pub fn set_pos(&mut self, pos: Pos) {
        match self {
            Agent::Citizen(c) => c.pos = pos,
            Agent::Cop(c) => c.pos = pos,
        }
    }

    pub fn vision(&self) -> usize {
        match self {
            Agent::Citizen(c) => c.vision,
            Agent::Cop(c) => c.vision,
        }
    }

    pub fn as_citizen(&self) -> Option<&Citizen> {
        match self {
            Agent::Citizen(c) => Some(c),
            Agent::Cop(_) => None,
        }
    }

    pub fn as_citizen_mut(&mut self) -> Option<&mut Citizen> {
        match self {
            Agent::Citizen(c) => Some(c),
            Agent::Cop(_) => None,
        }
    }

    pub fn is_cop(&self) -> bool {
        matches!(self, Agent::Cop(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citizen() -> Citizen {
        Citizen::new(Pos::new(0, 0), 7, 0.6, 0.3, 0.5, 0.1)
    }

    #[test]
    fn grievance_is_hardship_times_illegitimacy() {
        assert!((citizen().grievance() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn flipped_survives_return_to_quiescence() {
        let mut c = citizen();
        assert!(!c.flipped);
        c.set_condition(Condition::Active);
        assert!(c.flipped);
        c.set_condition(Condition::Quiescent);
        assert!(c.flipped);
        assert!(!c.is_active());
    }

    #[test]
    fn jailed_active_citizen_is_not_rebelling() {
        let mut c = citizen();
        c.set_condition(Condition::Active);
        assert!(c.is_rebelling());
        c.jail_sentence = 3;
        assert!(c.is_jailed());
        assert!(c.is_active());
        assert!(!c.is_rebelling());
    }

    #[test]
    fn breed_and_condition_serialize_as_reporter_strings() {
        assert_eq!(serde_json::to_string(&Breed::Cop).unwrap(), "\"cop\"");
        assert_eq!(
            serde_json::to_string(&Condition::Quiescent).unwrap(),
            "\"Quiescent\""
        );
        assert_eq!(
            serde_json::to_string(&Breed::Citizen).unwrap(),
            "\"citizen\""
        );
    }

    #[test]
    fn agent_accessors_dispatch_on_variant() {
        let mut agent = Agent::Cop(Cop::new(Pos::new(1, 2), 3));
        assert_eq!(agent.breed(), Breed::Cop);
        assert_eq!(agent.vision(), 3);
        assert!(agent.as_citizen().is_none());
        agent.set_pos(Pos::new(4, 4));
        assert_eq!(agent.pos(), Pos::new(4, 4));
    }
}
