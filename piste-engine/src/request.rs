//! Request and response types of the formula engine.

use piste_core::{
    AthleteId, BracketConfiguration, BracketConfigurationId, Competition, CompetitionId,
    DirectEliminationBracket, Entrant, Phase, PhaseId, PhaseStatus, Poule, PouleAssignment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entrant input for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseEntrants {
    /// Raw entrants; the composers decide the placement.
    Entrants(Vec<Entrant>),
    /// Pools already computed by the caller, one athlete list per pool in
    /// seat order. Only valid for POULE phases.
    Poules(Vec<Vec<AthleteId>>),
}

/// Status change applied to a phase as part of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStatusUpdate {
    pub phase_id: PhaseId,
    pub status: PhaseStatus,
}

/// Input of [`FormulaEngine::generate`](crate::FormulaEngine::generate).
///
/// Phases without an entry in `phase_entrants` use the competition's
/// registrations. A MAIN bracket takes its own entry in `bracket_entrants`
/// first, then the phase entrants, then the registrations. Other bracket
/// types are only drawn when `bracket_entrants` names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub competition_id: CompetitionId,
    #[serde(default)]
    pub phase_entrants: HashMap<PhaseId, PhaseEntrants>,
    #[serde(default)]
    pub bracket_entrants: HashMap<BracketConfigurationId, Vec<Entrant>>,
    /// Slot order of MANUAL draws, `None` marking a bye.
    #[serde(default)]
    pub manual_placements: HashMap<BracketConfigurationId, Vec<Option<AthleteId>>>,
    #[serde(default)]
    pub phase_status_updates: Vec<PhaseStatusUpdate>,
    /// Seed for RANDOM draws, overriding the engine configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl GenerateRequest {
    pub fn new(competition_id: CompetitionId) -> Self {
        Self {
            competition_id,
            phase_entrants: HashMap::new(),
            bracket_entrants: HashMap::new(),
            manual_placements: HashMap::new(),
            phase_status_updates: Vec::new(),
            random_seed: None,
        }
    }

    pub fn with_entrants(mut self, phase_id: PhaseId, entrants: Vec<Entrant>) -> Self {
        self.phase_entrants
            .insert(phase_id, PhaseEntrants::Entrants(entrants));
        self
    }

    pub fn with_poules(mut self, phase_id: PhaseId, poules: Vec<Vec<AthleteId>>) -> Self {
        self.phase_entrants.insert(phase_id, PhaseEntrants::Poules(poules));
        self
    }

    pub fn with_bracket_entrants(
        mut self,
        bracket_configuration_id: BracketConfigurationId,
        entrants: Vec<Entrant>,
    ) -> Self {
        self.bracket_entrants.insert(bracket_configuration_id, entrants);
        self
    }

    pub fn with_manual_placement(
        mut self,
        bracket_configuration_id: BracketConfigurationId,
        slots: Vec<Option<AthleteId>>,
    ) -> Self {
        self.manual_placements.insert(bracket_configuration_id, slots);
        self
    }

    pub fn with_phase_status(mut self, phase_id: PhaseId, status: PhaseStatus) -> Self {
        self.phase_status_updates
            .push(PhaseStatusUpdate { phase_id, status });
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Everything a successful generation run wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Competition after the run, with its new status and version.
    pub competition: Competition,
    pub poules: Vec<Poule>,
    pub assignments: Vec<PouleAssignment>,
    pub brackets: Vec<DirectEliminationBracket>,
    pub phases_updated: usize,
}

impl GenerationOutcome {
    /// Seats of one poule ordered by position.
    pub fn seats_of(&self, poule: &Poule) -> Vec<&PouleAssignment> {
        let mut seats: Vec<&PouleAssignment> = self
            .assignments
            .iter()
            .filter(|a| a.poule_id == poule.poule_id)
            .collect();
        seats.sort_by_key(|a| a.position);
        seats
    }
}

/// A phase with its bracket configurations as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredPhase {
    pub phase: Phase,
    pub brackets: Vec<BracketConfiguration>,
}

/// The stored formula of a competition, phases in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredFormula {
    pub competition_id: CompetitionId,
    pub phases: Vec<ConfiguredPhase>,
}

impl ConfiguredFormula {
    pub fn phase(&self, sequence_order: u32) -> Option<&ConfiguredPhase> {
        self.phases
            .iter()
            .find(|p| p.phase.sequence_order == sequence_order)
    }
}
