//! Enum types for PISTE entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing an unknown enum value from its string representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Normalise `in-progress`, `In Progress`, `in_progress` to `IN_PROGRESS`.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

macro_rules! impl_db_str_traits {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

// ============================================================================
// ENTITY DISCRIMINATOR
// ============================================================================

/// Entity type discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Organization,
    Tournament,
    Competition,
    Registration,
    Phase,
    BracketConfiguration,
    Poule,
    PouleAssignment,
    DirectEliminationBracket,
}

// ============================================================================
// FORMULA ENUMS
// ============================================================================

/// Kind of stage a phase represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseType {
    /// Round-robin pools
    Poule,
    /// Single elimination tableau
    DirectElimination,
    /// Placement bouts for final ranking
    Classification,
    /// Second-chance elimination path
    Repechage,
}

impl PhaseType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PhaseType::Poule => "POULE",
            PhaseType::DirectElimination => "DIRECT_ELIMINATION",
            PhaseType::Classification => "CLASSIFICATION",
            PhaseType::Repechage => "REPECHAGE",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "POULE" | "POOL" => Ok(PhaseType::Poule),
            "DIRECT_ELIMINATION" => Ok(PhaseType::DirectElimination),
            "CLASSIFICATION" => Ok(PhaseType::Classification),
            "REPECHAGE" => Ok(PhaseType::Repechage),
            _ => Err(EnumParseError::new("phase type", s)),
        }
    }

    /// Whether phases of this type are drawn by the bracket composer.
    pub fn is_elimination(&self) -> bool {
        !matches!(self, PhaseType::Poule)
    }
}

impl_db_str_traits!(PhaseType);

/// Role of a bracket inside an elimination phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BracketType {
    Main,
    Repechage,
    Classification,
    Consolation,
}

impl BracketType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BracketType::Main => "MAIN",
            BracketType::Repechage => "REPECHAGE",
            BracketType::Classification => "CLASSIFICATION",
            BracketType::Consolation => "CONSOLATION",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "MAIN" => Ok(BracketType::Main),
            "REPECHAGE" => Ok(BracketType::Repechage),
            "CLASSIFICATION" => Ok(BracketType::Classification),
            "CONSOLATION" => Ok(BracketType::Consolation),
            _ => Err(EnumParseError::new("bracket type", s)),
        }
    }

    /// Label used when naming generated brackets.
    pub fn label(&self) -> &'static str {
        match self {
            BracketType::Main => "Main",
            BracketType::Repechage => "Repechage",
            BracketType::Classification => "Classification",
            BracketType::Consolation => "Consolation",
        }
    }
}

impl_db_str_traits!(BracketType);

/// How competitors are placed into draw slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedingMethod {
    /// Conventional seeding table by rank
    Ranking,
    /// Same placement as ranking for elimination draws
    Snake,
    /// Caller supplies the slot order
    Manual,
    /// Uniform random placement
    Random,
}

impl SeedingMethod {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SeedingMethod::Ranking => "RANKING",
            SeedingMethod::Snake => "SNAKE",
            SeedingMethod::Manual => "MANUAL",
            SeedingMethod::Random => "RANDOM",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "RANKING" => Ok(SeedingMethod::Ranking),
            "SNAKE" | "SERPENTINE" => Ok(SeedingMethod::Snake),
            "MANUAL" => Ok(SeedingMethod::Manual),
            "RANDOM" => Ok(SeedingMethod::Random),
            _ => Err(EnumParseError::new("seeding method", s)),
        }
    }

    /// Whether two runs over identical inputs produce identical placements.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, SeedingMethod::Random)
    }
}

impl_db_str_traits!(SeedingMethod);

/// Fencing weapon of a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weapon {
    Foil,
    Epee,
    Sabre,
}

impl Weapon {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Weapon::Foil => "FOIL",
            Weapon::Epee => "EPEE",
            Weapon::Sabre => "SABRE",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "FOIL" => Ok(Weapon::Foil),
            "EPEE" => Ok(Weapon::Epee),
            "SABRE" | "SABER" => Ok(Weapon::Sabre),
            _ => Err(EnumParseError::new("weapon", s)),
        }
    }
}

impl_db_str_traits!(Weapon);

// ============================================================================
// STATUS ENUMS
// ============================================================================

/// Lifecycle status of a competition. Transitions live in `lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionStatus {
    #[default]
    Draft,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
    Cancelled,
}

impl CompetitionStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CompetitionStatus::Draft => "DRAFT",
            CompetitionStatus::RegistrationOpen => "REGISTRATION_OPEN",
            CompetitionStatus::RegistrationClosed => "REGISTRATION_CLOSED",
            CompetitionStatus::InProgress => "IN_PROGRESS",
            CompetitionStatus::Completed => "COMPLETED",
            CompetitionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "DRAFT" => Ok(CompetitionStatus::Draft),
            "REGISTRATION_OPEN" => Ok(CompetitionStatus::RegistrationOpen),
            "REGISTRATION_CLOSED" => Ok(CompetitionStatus::RegistrationClosed),
            "IN_PROGRESS" | "INPROGRESS" => Ok(CompetitionStatus::InProgress),
            "COMPLETED" | "COMPLETE" => Ok(CompetitionStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(CompetitionStatus::Cancelled),
            _ => Err(EnumParseError::new("competition status", s)),
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CompetitionStatus::Completed | CompetitionStatus::Cancelled
        )
    }

    /// Formula configuration and generation are only allowed before the
    /// competition reaches a terminal state.
    pub fn permits_modification(&self) -> bool {
        !self.is_terminal()
    }
}

impl_db_str_traits!(CompetitionStatus);

/// Lifecycle status of a phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl PhaseStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PhaseStatus::Scheduled => "SCHEDULED",
            PhaseStatus::InProgress => "IN_PROGRESS",
            PhaseStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "SCHEDULED" => Ok(PhaseStatus::Scheduled),
            "IN_PROGRESS" | "INPROGRESS" => Ok(PhaseStatus::InProgress),
            "COMPLETED" | "COMPLETE" => Ok(PhaseStatus::Completed),
            _ => Err(EnumParseError::new("phase status", s)),
        }
    }
}

impl_db_str_traits!(PhaseStatus);

/// Status of a generated poule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PouleStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl PouleStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PouleStatus::Scheduled => "SCHEDULED",
            PouleStatus::InProgress => "IN_PROGRESS",
            PouleStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "SCHEDULED" => Ok(PouleStatus::Scheduled),
            "IN_PROGRESS" | "INPROGRESS" => Ok(PouleStatus::InProgress),
            "COMPLETED" | "COMPLETE" => Ok(PouleStatus::Completed),
            _ => Err(EnumParseError::new("poule status", s)),
        }
    }
}

impl_db_str_traits!(PouleStatus);

// ============================================================================
// CALLER ROLE
// ============================================================================

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SystemAdmin,
    OrganizationAdmin,
    Organizer,
    Referee,
    Viewer,
}

impl Role {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "SYSTEM_ADMIN",
            Role::OrganizationAdmin => "ORGANIZATION_ADMIN",
            Role::Organizer => "ORGANIZER",
            Role::Referee => "REFEREE",
            Role::Viewer => "VIEWER",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize(s).as_str() {
            "SYSTEM_ADMIN" => Ok(Role::SystemAdmin),
            "ORGANIZATION_ADMIN" => Ok(Role::OrganizationAdmin),
            "ORGANIZER" => Ok(Role::Organizer),
            "REFEREE" => Ok(Role::Referee),
            "VIEWER" => Ok(Role::Viewer),
            _ => Err(EnumParseError::new("role", s)),
        }
    }

    /// Roles that may ever mutate competition structure.
    pub fn can_write(&self) -> bool {
        matches!(
            self,
            Role::SystemAdmin | Role::OrganizationAdmin | Role::Organizer
        )
    }
}

impl_db_str_traits!(Role);
