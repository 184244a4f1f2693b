//! Core entity structures

use crate::{
    // ID types
    AthleteId, BracketConfigurationId, BracketId, CompetitionId, OrganizationId, PhaseId,
    PouleAssignmentId, PouleId, RegistrationId, TournamentId,
    // Other types
    BracketType, CompetitionStatus, PhaseConfig, PhaseStatus, PhaseType, PouleStatus,
    SeedingMethod, Timestamp, Weapon,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Tournament - top-level event owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Tournament {
    pub tournament_id: TournamentId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub created_at: Timestamp,
}

impl Tournament {
    pub fn new(organization_id: OrganizationId, name: impl Into<String>) -> Self {
        Self {
            tournament_id: TournamentId::now_v7(),
            organization_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Competition - one weapon and category unit inside a tournament.
///
/// `version` increases on every write made through a store transaction and
/// is used to detect concurrent modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Competition {
    pub competition_id: CompetitionId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub weapon: Weapon,
    /// Free-form category label, e.g. "Senior Men".
    pub category: String,
    pub status: CompetitionStatus,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Competition {
    pub fn new(
        tournament_id: TournamentId,
        name: impl Into<String>,
        weapon: Weapon,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            competition_id: CompetitionId::now_v7(),
            tournament_id,
            name: name.into(),
            weapon,
            category: category.into(),
            status: CompetitionStatus::default(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: CompetitionStatus) -> Self {
        self.status = status;
        self
    }
}

/// An athlete's entry in a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Registration {
    pub registration_id: RegistrationId,
    pub competition_id: CompetitionId,
    pub athlete_id: AthleteId,
    /// Seed rank, 1 being the strongest. `None` for unranked athletes.
    pub seed_rank: Option<u32>,
}

impl Registration {
    pub fn new(competition_id: CompetitionId, athlete_id: AthleteId, seed_rank: Option<u32>) -> Self {
        Self {
            registration_id: RegistrationId::now_v7(),
            competition_id,
            athlete_id,
            seed_rank,
        }
    }

    /// The entrant this registration contributes to generation.
    pub fn entrant(&self) -> Entrant {
        Entrant {
            athlete_id: self.athlete_id,
            seed: self.seed_rank,
        }
    }
}

/// Athlete handed to the composers, with an optional seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Entrant {
    pub athlete_id: AthleteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl Entrant {
    pub fn seeded(athlete_id: AthleteId, seed: u32) -> Self {
        Self {
            athlete_id,
            seed: Some(seed),
        }
    }

    pub fn unseeded(athlete_id: AthleteId) -> Self {
        Self {
            athlete_id,
            seed: None,
        }
    }
}

/// Phase - one stage of a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Phase {
    pub phase_id: PhaseId,
    pub competition_id: CompetitionId,
    pub name: String,
    /// Execution order, unique within the competition.
    pub sequence_order: u32,
    pub status: PhaseStatus,
    pub config: PhaseConfig,
    pub created_at: Timestamp,
}

impl Phase {
    pub fn phase_type(&self) -> PhaseType {
        self.config.phase_type()
    }
}

/// Declared shape of one bracket drawn for a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BracketConfiguration {
    pub bracket_configuration_id: BracketConfigurationId,
    pub phase_id: PhaseId,
    pub bracket_type: BracketType,
    /// Competitor capacity. Need not be a power of two.
    pub size: u32,
    pub seeding_method: SeedingMethod,
}

/// Generated pool of a pool phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Poule {
    pub poule_id: PouleId,
    pub phase_id: PhaseId,
    /// 1-based, unique within the phase.
    pub number: u32,
    pub status: PouleStatus,
    pub created_at: Timestamp,
}

/// Seat of one athlete in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PouleAssignment {
    pub assignment_id: PouleAssignmentId,
    pub poule_id: PouleId,
    pub athlete_id: AthleteId,
    /// 1-based seat number, drives the round-robin bout order.
    pub position: u32,
}

/// Occupant of a draw slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotOccupant {
    /// A competitor and the seed number they hold in this draw.
    Competitor { athlete_id: AthleteId, seed: u32 },
    Bye,
}

impl SlotOccupant {
    pub fn is_bye(&self) -> bool {
        matches!(self, SlotOccupant::Bye)
    }

    pub fn athlete_id(&self) -> Option<AthleteId> {
        match self {
            SlotOccupant::Competitor { athlete_id, .. } => Some(*athlete_id),
            SlotOccupant::Bye => None,
        }
    }
}

/// One slot of an elimination draw. Positions are 1-based, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DrawSlot {
    pub position: u32,
    pub occupant: SlotOccupant,
}

/// First-round pairing of two adjacent draw slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Bout {
    /// 1-based bout number within the round.
    pub number: u32,
    pub top: DrawSlot,
    pub bottom: DrawSlot,
}

impl Bout {
    /// The competitor advancing without fencing, if the other slot is a bye.
    pub fn walkover(&self) -> Option<AthleteId> {
        match (self.top.occupant, self.bottom.occupant) {
            (SlotOccupant::Competitor { athlete_id, .. }, SlotOccupant::Bye)
            | (SlotOccupant::Bye, SlotOccupant::Competitor { athlete_id, .. }) => Some(athlete_id),
            _ => None,
        }
    }
}

/// Generated elimination draw of a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DirectEliminationBracket {
    pub bracket_id: BracketId,
    pub phase_id: PhaseId,
    pub bracket_configuration_id: BracketConfigurationId,
    pub name: String,
    /// Power of two, at least the configured size.
    pub draw_size: u32,
    pub slots: Vec<DrawSlot>,
    pub created_at: Timestamp,
}

impl DirectEliminationBracket {
    /// First-round bouts: slots 1-2, 3-4, and so on.
    pub fn first_round(&self) -> Vec<Bout> {
        self.slots
            .chunks_exact(2)
            .zip(1u32..)
            .map(|(pair, number)| Bout {
                number,
                top: pair[0],
                bottom: pair[1],
            })
            .collect()
    }

    /// Competitors advancing to the second round on a bye.
    pub fn advanced_by_bye(&self) -> Vec<AthleteId> {
        self.first_round().iter().filter_map(Bout::walkover).collect()
    }

    pub fn bye_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.occupant.is_bye()).count()
    }

    pub fn competitor_count(&self) -> usize {
        self.slots.len() - self.bye_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(position: u32, seed: Option<u32>) -> DrawSlot {
        DrawSlot {
            position,
            occupant: match seed {
                Some(seed) => SlotOccupant::Competitor {
                    athlete_id: AthleteId::now_v7(),
                    seed,
                },
                None => SlotOccupant::Bye,
            },
        }
    }

    fn bracket(slots: Vec<DrawSlot>) -> DirectEliminationBracket {
        DirectEliminationBracket {
            bracket_id: BracketId::now_v7(),
            phase_id: PhaseId::now_v7(),
            bracket_configuration_id: BracketConfigurationId::now_v7(),
            name: "Main".to_string(),
            draw_size: slots.len() as u32,
            slots,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_round_pairs_adjacent_slots() {
        let draw = bracket(vec![slot(1, Some(1)), slot(2, None), slot(3, Some(3)), slot(4, Some(2))]);
        let bouts = draw.first_round();
        assert_eq!(bouts.len(), 2);
        assert_eq!(bouts[0].number, 1);
        assert_eq!(bouts[0].top.position, 1);
        assert_eq!(bouts[0].bottom.position, 2);
        assert_eq!(bouts[1].top.position, 3);
        assert_eq!(bouts[1].bottom.position, 4);
    }

    #[test]
    fn test_advanced_by_bye() {
        let draw = bracket(vec![slot(1, Some(1)), slot(2, None), slot(3, Some(3)), slot(4, Some(2))]);
        let advanced = draw.advanced_by_bye();
        assert_eq!(advanced.len(), 1);
        assert_eq!(Some(advanced[0]), draw.slots[0].occupant.athlete_id());
        assert_eq!(draw.bye_count(), 1);
        assert_eq!(draw.competitor_count(), 3);
    }

    #[test]
    fn test_slot_occupant_json() {
        let json = serde_json::to_value(SlotOccupant::Bye).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "BYE" }));
    }

    #[test]
    fn test_new_competition_starts_in_draft() {
        let competition = Competition::new(TournamentId::now_v7(), "Senior", Weapon::Epee, "Senior Men");
        assert_eq!(competition.status, CompetitionStatus::Draft);
        assert_eq!(competition.version, 1);
    }

    #[test]
    fn test_registration_entrant() {
        let registration = Registration::new(CompetitionId::now_v7(), AthleteId::now_v7(), Some(4));
        let entrant = registration.entrant();
        assert_eq!(entrant.athlete_id, registration.athlete_id);
        assert_eq!(entrant.seed, Some(4));
    }
}
