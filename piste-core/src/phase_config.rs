//! Phase configuration as a tagged variant per phase type.
//!
//! Each phase type owns a statically-known parameter struct. Unknown phase
//! types and unknown fields are rejected when a formula is parsed.

use crate::{EngineConfig, PhaseType, ValidationError};
use serde::{Deserialize, Serialize};

/// Parameters of a pool phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct PoulePhaseConfig {
    /// Preferred number of fencers per pool.
    pub target_pool_size: u32,
    /// Explicit pool count, overriding `ceil(entrants / target_pool_size)`.
    /// The resulting pools must still fit the engine's pool size limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_count: Option<u32>,
    /// How many fencers qualify for the next phase, if known.
    ///
    /// Stored with the formula for the ranking step after the pools;
    /// generation does not read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<u32>,
}

/// Parameters of a direct elimination phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct EliminationPhaseConfig {
    /// Fence off the losing semi-finalists for third place.
    ///
    /// Stored for whoever schedules the later rounds; the first-round draw
    /// is the same either way.
    #[serde(default)]
    pub third_place_bout: bool,
}

/// Parameters of a classification phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct ClassificationPhaseConfig {
    /// Best placing decided by this phase (e.g. 9 for places 9-16).
    ///
    /// Stored for the final ranking; generation does not read it.
    pub first_place: u32,
}

/// Parameters of a repechage phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct RepechagePhaseConfig {
    /// Main-draw round from which eliminated fencers become eligible.
    ///
    /// Stored for the caller that selects the repechage field, which is
    /// passed to generation as bracket entrants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_from_round: Option<u32>,
}

/// Phase-type-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "phase_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseConfig {
    Poule(PoulePhaseConfig),
    DirectElimination(EliminationPhaseConfig),
    Classification(ClassificationPhaseConfig),
    Repechage(RepechagePhaseConfig),
}

impl PhaseConfig {
    /// Pool phase with the given target size.
    pub fn poule(target_pool_size: u32) -> Self {
        PhaseConfig::Poule(PoulePhaseConfig {
            target_pool_size,
            pool_count: None,
            qualifiers: None,
        })
    }

    /// Direct elimination phase without a third-place bout.
    pub fn direct_elimination() -> Self {
        PhaseConfig::DirectElimination(EliminationPhaseConfig::default())
    }

    pub fn phase_type(&self) -> PhaseType {
        match self {
            PhaseConfig::Poule(_) => PhaseType::Poule,
            PhaseConfig::DirectElimination(_) => PhaseType::DirectElimination,
            PhaseConfig::Classification(_) => PhaseType::Classification,
            PhaseConfig::Repechage(_) => PhaseType::Repechage,
        }
    }

    /// Pool parameters, if this is a pool phase.
    pub fn as_poule(&self) -> Option<&PoulePhaseConfig> {
        match self {
            PhaseConfig::Poule(config) => Some(config),
            _ => None,
        }
    }

    /// Check the parameters against the engine limits.
    ///
    /// `field` prefixes the reported field name, e.g. `phases[2].config`.
    pub fn validate(&self, field: &str, limits: &EngineConfig) -> Result<(), ValidationError> {
        match self {
            PhaseConfig::Poule(config) => {
                let size = config.target_pool_size;
                if size < limits.min_pool_size || size > limits.max_pool_size {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{field}.target_pool_size"),
                        reason: format!(
                            "{} is outside the allowed range {}..={}",
                            size, limits.min_pool_size, limits.max_pool_size
                        ),
                    });
                }
                if config.pool_count == Some(0) {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{field}.pool_count"),
                        reason: "at least one pool is required".to_string(),
                    });
                }
                if config.qualifiers == Some(0) {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{field}.qualifiers"),
                        reason: "at least one fencer must qualify".to_string(),
                    });
                }
                Ok(())
            }
            PhaseConfig::Classification(config) if config.first_place == 0 => {
                Err(ValidationError::InvalidValue {
                    field: format!("{field}.first_place"),
                    reason: "placings start at 1".to_string(),
                })
            }
            PhaseConfig::Repechage(config) if config.eligible_from_round == Some(0) => {
                Err(ValidationError::InvalidValue {
                    field: format!("{field}.eligible_from_round"),
                    reason: "rounds are numbered from 1".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poule_config_json_shape() {
        let json = serde_json::to_value(PhaseConfig::poule(6)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "phase_type": "POULE", "target_pool_size": 6 })
        );
    }

    #[test]
    fn test_parse_elimination_with_defaults() {
        let config: PhaseConfig =
            serde_json::from_str(r#"{ "phase_type": "DIRECT_ELIMINATION" }"#).unwrap();
        assert_eq!(config, PhaseConfig::direct_elimination());
        assert_eq!(config.phase_type(), PhaseType::DirectElimination);
    }

    #[test]
    fn test_unknown_phase_type_rejected() {
        let result = serde_json::from_str::<PhaseConfig>(r#"{ "phase_type": "SWISS" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_json::from_str::<PhaseConfig>(
            r#"{ "phase_type": "POULE", "target_pool_size": 6, "pool_colour": "red" }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pool_size_outside_limits() {
        let limits = EngineConfig::default();
        let err = PhaseConfig::poule(2)
            .validate("phases[0].config", &limits)
            .unwrap_err();
        match err {
            ValidationError::InvalidValue { field, .. } => {
                assert_eq!(field, "phases[0].config.target_pool_size")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(PhaseConfig::poule(6).validate("p", &limits).is_ok());
    }

    #[test]
    fn test_zero_pool_count_rejected() {
        let config = PhaseConfig::Poule(PoulePhaseConfig {
            target_pool_size: 6,
            pool_count: Some(0),
            qualifiers: None,
        });
        assert!(config.validate("p", &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_classification_first_place() {
        let config = PhaseConfig::Classification(ClassificationPhaseConfig { first_place: 0 });
        assert!(config.validate("p", &EngineConfig::default()).is_err());
        let config = PhaseConfig::Classification(ClassificationPhaseConfig { first_place: 9 });
        assert!(config.validate("p", &EngineConfig::default()).is_ok());
    }
}
