//! Identity types for PISTE entities

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour of the strongly-typed entity identifiers.
///
/// Every identifier wraps a UUIDv7, so ids sort by creation time.
pub trait EntityIdType: Copy + Eq + Hash + fmt::Debug + fmt::Display {
    /// Human-readable entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap an existing UUID.
    fn from_uuid(uuid: Uuid) -> Self;

    /// Access the inner UUID.
    fn uuid(&self) -> Uuid;

    /// Generate a fresh timestamp-sortable id.
    fn generate() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new UUIDv7 id.
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil id, useful as a placeholder in tests.
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Organization (club, federation) owning tournaments.
    OrganizationId,
    "organization"
);
define_entity_id!(
    /// Authenticated user issuing a request.
    UserId,
    "user"
);
define_entity_id!(
    /// Tournament grouping several competitions.
    TournamentId,
    "tournament"
);
define_entity_id!(
    /// One weapon and category unit inside a tournament.
    CompetitionId,
    "competition"
);
define_entity_id!(
    /// Stage of a competition.
    PhaseId,
    "phase"
);
define_entity_id!(
    /// Declared bracket shape of a phase.
    BracketConfigurationId,
    "bracket_configuration"
);
define_entity_id!(
    /// Generated pool.
    PouleId,
    "poule"
);
define_entity_id!(PouleAssignmentId, "poule_assignment");
define_entity_id!(
    /// Generated direct elimination draw.
    BracketId,
    "direct_elimination_bracket"
);
define_entity_id!(AthleteId, "athlete");
define_entity_id!(RegistrationId, "registration");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let a = CompetitionId::now_v7();
        let b = CompetitionId::now_v7();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let uuid = Uuid::now_v7();
        let id = PhaseId::new(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        let back: PhaseId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_trait() {
        let id = AthleteId::generate();
        assert_eq!(AthleteId::from_uuid(id.uuid()), id);
        assert_eq!(AthleteId::ENTITY_NAME, "athlete");
        assert!(PouleId::nil().as_uuid().is_nil());
    }
}
