//! PISTE Core - Tournament Entity Types
//!
//! Identifiers, entities, enums, formula definitions and the lifecycle table
//! shared by every other crate. Composition and persistence live elsewhere.

mod config;
mod entities;
mod enums;
mod error;
mod formula;
mod identity;
mod lifecycle;
mod phase_config;

pub use config::EngineConfig;
pub use entities::{
    Bout, BracketConfiguration, Competition, DirectEliminationBracket, DrawSlot, Entrant, Phase,
    Poule, PouleAssignment, Registration, SlotOccupant, Tournament,
};
pub use enums::{
    BracketType, CompetitionStatus, EntityType, EnumParseError, PhaseStatus, PhaseType,
    PouleStatus, Role, SeedingMethod, Weapon,
};
pub use error::{
    AuthorizationError, ConfigError, ErrorKind, PisteError, PisteResult, StateConflictError,
    StorageError, ValidationError,
};
pub use formula::{BracketDefinition, FormulaDefinition, PhaseDefinition};
pub use identity::{
    AthleteId, BracketConfigurationId, BracketId, CompetitionId, EntityIdType, OrganizationId,
    PhaseId, PouleAssignmentId, PouleId, RegistrationId, Timestamp, TournamentId, UserId,
};
pub use lifecycle::CompetitionEvent;
pub use phase_config::{
    ClassificationPhaseConfig, EliminationPhaseConfig, PhaseConfig, PoulePhaseConfig,
    RepechagePhaseConfig,
};
