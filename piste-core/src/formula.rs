//! Formula definitions submitted by callers.
//!
//! A formula is the ordered list of phases of a competition, each with its
//! bracket configurations. It is validated as a whole before anything is
//! persisted.

use crate::{
    BracketConfiguration, BracketConfigurationId, BracketType, CompetitionId, EngineConfig, Phase,
    PhaseConfig, PhaseId, PhaseStatus, PisteError, PisteResult, SeedingMethod, ValidationError,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One bracket declared on a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct BracketDefinition {
    pub bracket_type: BracketType,
    pub size: u32,
    pub seeding_method: SeedingMethod,
}

/// One phase of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct PhaseDefinition {
    pub name: String,
    pub sequence_order: u32,
    pub config: PhaseConfig,
    #[serde(default)]
    pub brackets: Vec<BracketDefinition>,
}

impl PhaseDefinition {
    pub fn new(name: impl Into<String>, sequence_order: u32, config: PhaseConfig) -> Self {
        Self {
            name: name.into(),
            sequence_order,
            config,
            brackets: Vec::new(),
        }
    }

    pub fn with_bracket(
        mut self,
        bracket_type: BracketType,
        size: u32,
        seeding_method: SeedingMethod,
    ) -> Self {
        self.brackets.push(BracketDefinition {
            bracket_type,
            size,
            seeding_method,
        });
        self
    }

    /// Materialize the phase and its bracket configurations for a competition.
    pub fn instantiate(&self, competition_id: CompetitionId) -> (Phase, Vec<BracketConfiguration>) {
        let phase = Phase {
            phase_id: PhaseId::now_v7(),
            competition_id,
            name: self.name.clone(),
            sequence_order: self.sequence_order,
            status: PhaseStatus::Scheduled,
            config: self.config.clone(),
            created_at: Utc::now(),
        };
        let brackets = self
            .brackets
            .iter()
            .map(|bracket| BracketConfiguration {
                bracket_configuration_id: BracketConfigurationId::now_v7(),
                phase_id: phase.phase_id,
                bracket_type: bracket.bracket_type,
                size: bracket.size,
                seeding_method: bracket.seeding_method,
            })
            .collect();
        (phase, brackets)
    }
}

/// Ordered phase list of a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct FormulaDefinition {
    pub phases: Vec<PhaseDefinition>,
}

impl FormulaDefinition {
    pub fn new(phases: Vec<PhaseDefinition>) -> Self {
        Self { phases }
    }

    /// Parse a formula document. Malformed JSON, unknown enum values and
    /// unknown fields are all validation failures.
    pub fn from_json(json: &str) -> PisteResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            PisteError::Validation(ValidationError::InvalidValue {
                field: "formula".to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Validate the whole formula against the engine limits.
    pub fn validate(&self, limits: &EngineConfig) -> Result<(), ValidationError> {
        if self.phases.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "phases".to_string(),
            });
        }

        let mut previous: Option<u32> = None;
        for (index, phase) in self.phases.iter().enumerate() {
            let field = format!("phases[{index}]");

            if phase.name.trim().is_empty() {
                return Err(ValidationError::RequiredFieldMissing {
                    field: format!("{field}.name"),
                });
            }

            if let Some(prev) = previous {
                if phase.sequence_order == prev {
                    return Err(ValidationError::ConstraintViolation {
                        constraint: "unique_sequence_order".to_string(),
                        reason: format!("sequence_order {} is used twice", prev),
                    });
                }
                if phase.sequence_order < prev {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{field}.sequence_order"),
                        reason: format!(
                            "{} does not follow {}; phases must be listed in execution order",
                            phase.sequence_order, prev
                        ),
                    });
                }
            }
            previous = Some(phase.sequence_order);

            phase.config.validate(&format!("{field}.config"), limits)?;

            let mut seen_types = HashSet::new();
            for (bracket_index, bracket) in phase.brackets.iter().enumerate() {
                let bracket_field = format!("{field}.brackets[{bracket_index}]");
                if bracket.size < 2 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{bracket_field}.size"),
                        reason: format!("a bracket needs at least 2 competitors, got {}", bracket.size),
                    });
                }
                if bracket.size > limits.max_draw_size {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{bracket_field}.size"),
                        reason: format!(
                            "{} exceeds the maximum draw size {}",
                            bracket.size, limits.max_draw_size
                        ),
                    });
                }
                if !seen_types.insert(bracket.bracket_type) {
                    return Err(ValidationError::ConstraintViolation {
                        constraint: "unique_bracket_type".to_string(),
                        reason: format!(
                            "phase '{}' declares {} twice",
                            phase.name, bracket.bracket_type
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
