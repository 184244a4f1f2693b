//! PISTE Test Utilities
//!
//! Centralized test infrastructure for the PISTE workspace:
//! - Proptest generators for entrants, enums and formulas
//! - Fixtures that seed a `MockStorage` with a ready competition
//! - Custom assertions for pool and draw invariants

// Re-export mock storage from its source crate
pub use piste_storage::MockStorage;

// Re-export core types for convenience
pub use piste_core::{
    AthleteId, BracketType, Competition, CompetitionId, CompetitionStatus, DrawSlot, EngineConfig,
    Entrant, EntityType, ErrorKind, FormulaDefinition, OrganizationId, PhaseConfig,
    PhaseDefinition, PhaseStatus, PisteError, PisteResult, PoulePhaseConfig, Registration, Role,
    SeedingMethod, SlotOccupant, StorageError, Tournament, UserId, Weapon,
};

use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating PISTE types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_athlete_id() -> impl Strategy<Value = AthleteId> {
        arb_uuid().prop_map(AthleteId::new)
    }

    /// Entrant that is seeded three times out of four.
    pub fn arb_entrant() -> impl Strategy<Value = Entrant> {
        (arb_athlete_id(), prop::option::weighted(0.75, 1u32..500))
            .prop_map(|(athlete_id, seed)| Entrant { athlete_id, seed })
    }

    /// Field of entrants with distinct athletes.
    pub fn arb_entrants(count: impl Into<prop::collection::SizeRange>) -> impl Strategy<Value = Vec<Entrant>> {
        prop::collection::vec(prop::option::weighted(0.75, 1u32..500), count).prop_map(|seeds| {
            seeds
                .into_iter()
                .map(|seed| Entrant {
                    athlete_id: AthleteId::now_v7(),
                    seed,
                })
                .collect()
        })
    }

    pub fn arb_seeding_method() -> impl Strategy<Value = SeedingMethod> {
        prop_oneof![
            Just(SeedingMethod::Ranking),
            Just(SeedingMethod::Snake),
            Just(SeedingMethod::Manual),
            Just(SeedingMethod::Random),
        ]
    }

    /// Seeding methods that need no caller-supplied placement.
    pub fn arb_automatic_seeding_method() -> impl Strategy<Value = SeedingMethod> {
        prop_oneof![
            Just(SeedingMethod::Ranking),
            Just(SeedingMethod::Snake),
            Just(SeedingMethod::Random),
        ]
    }

    pub fn arb_bracket_type() -> impl Strategy<Value = BracketType> {
        prop_oneof![
            Just(BracketType::Main),
            Just(BracketType::Repechage),
            Just(BracketType::Classification),
            Just(BracketType::Consolation),
        ]
    }

    pub fn arb_competition_status() -> impl Strategy<Value = CompetitionStatus> {
        prop_oneof![
            Just(CompetitionStatus::Draft),
            Just(CompetitionStatus::RegistrationOpen),
            Just(CompetitionStatus::RegistrationClosed),
            Just(CompetitionStatus::InProgress),
            Just(CompetitionStatus::Completed),
            Just(CompetitionStatus::Cancelled),
        ]
    }

    pub fn arb_phase_status() -> impl Strategy<Value = PhaseStatus> {
        prop_oneof![
            Just(PhaseStatus::Scheduled),
            Just(PhaseStatus::InProgress),
            Just(PhaseStatus::Completed),
        ]
    }

    /// Pool phase config within the default engine limits.
    pub fn arb_poule_phase_config() -> impl Strategy<Value = PhaseConfig> {
        (3u32..=10).prop_map(PhaseConfig::poule)
    }

    /// Valid formula: one to three pool rounds followed by a tableau.
    pub fn arb_formula() -> impl Strategy<Value = FormulaDefinition> {
        (
            prop::collection::vec(arb_poule_phase_config(), 1..=3),
            2u32..=64,
            arb_automatic_seeding_method(),
        )
            .prop_map(|(pool_rounds, size, seeding_method)| {
                let mut phases: Vec<PhaseDefinition> = pool_rounds
                    .into_iter()
                    .zip(1u32..)
                    .map(|(config, order)| PhaseDefinition::new(format!("Pools {}", order), order, config))
                    .collect();
                let order = phases.len() as u32 + 1;
                phases.push(
                    PhaseDefinition::new("Tableau", order, PhaseConfig::direct_elimination())
                        .with_bracket(BracketType::Main, size, seeding_method),
                );
                FormulaDefinition::new(phases)
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Storage seeded with one tournament, one competition and its entrants.
    #[derive(Debug, Clone)]
    pub struct CompetitionFixture {
        pub storage: MockStorage,
        pub tournament: Tournament,
        pub competition: Competition,
        pub registrations: Vec<Registration>,
    }

    impl CompetitionFixture {
        pub fn competition_id(&self) -> CompetitionId {
            self.competition.competition_id
        }

        pub fn organization_id(&self) -> OrganizationId {
            self.tournament.organization_id
        }

        pub fn entrants(&self) -> Vec<Entrant> {
            self.registrations.iter().map(Registration::entrant).collect()
        }
    }

    /// Competition in `status` with `entrant_count` registrations seeded 1..=N.
    pub fn seeded_competition(
        entrant_count: u32,
        status: CompetitionStatus,
    ) -> PisteResult<CompetitionFixture> {
        let storage = MockStorage::new();
        let tournament = Tournament::new(OrganizationId::now_v7(), "Test Open");
        storage.tournament_insert(&tournament)?;

        let competition = Competition::new(
            tournament.tournament_id,
            "Senior Epee",
            Weapon::Epee,
            "Senior Men",
        )
        .with_status(status);
        storage.competition_insert(&competition)?;

        let registrations: Vec<Registration> = (1..=entrant_count)
            .map(|seed| Registration::new(competition.competition_id, AthleteId::now_v7(), Some(seed)))
            .collect();
        for registration in &registrations {
            storage.registration_insert(registration)?;
        }

        Ok(CompetitionFixture {
            storage,
            tournament,
            competition,
            registrations,
        })
    }

    /// `count` entrants seeded 1..=count.
    pub fn seeded_entrants(count: u32) -> Vec<Entrant> {
        (1..=count)
            .map(|seed| Entrant::seeded(AthleteId::now_v7(), seed))
            .collect()
    }

    /// Single pool round.
    pub fn pools_only(target_pool_size: u32) -> FormulaDefinition {
        FormulaDefinition::new(vec![PhaseDefinition::new(
            "Pools",
            1,
            PhaseConfig::poule(target_pool_size),
        )])
    }

    /// Pool round followed by a main tableau.
    pub fn pools_then_tableau(
        target_pool_size: u32,
        bracket_size: u32,
        seeding_method: SeedingMethod,
    ) -> FormulaDefinition {
        FormulaDefinition::new(vec![
            PhaseDefinition::new("Pools", 1, PhaseConfig::poule(target_pool_size)),
            PhaseDefinition::new("Tableau", 2, PhaseConfig::direct_elimination()).with_bracket(
                BracketType::Main,
                bracket_size,
                seeding_method,
            ),
        ])
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for PISTE-specific validation.

    use super::*;
    use std::collections::HashSet;

    /// Assert that a PisteResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &PisteResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a PisteResult failed with the given error kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &PisteResult<T>, kind: ErrorKind) {
        match result {
            Err(e) => assert_eq!(e.kind(), kind, "Wrong error kind for {:?}", e),
            Ok(value) => panic!("Expected {:?} error, got Ok({:?})", kind, value),
        }
    }

    /// Assert that a PisteResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &PisteResult<T>, entity_type: EntityType) {
        match result {
            Err(PisteError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that pool sizes differ by at most one.
    #[track_caller]
    pub fn assert_balanced(sizes: &[usize]) {
        if let (Some(min), Some(max)) = (sizes.iter().min(), sizes.iter().max()) {
            assert!(max - min <= 1, "Unbalanced pool sizes: {:?}", sizes);
        }
    }

    /// Assert that a draw holds every competitor exactly once and byes elsewhere.
    #[track_caller]
    pub fn assert_draw_holds(slots: &[DrawSlot], draw_size: u32, competitors: &[Entrant]) {
        assert_eq!(slots.len(), draw_size as usize, "Slot count differs from draw size");
        assert!(draw_size.is_power_of_two(), "Draw size {} is not a power of two", draw_size);

        let positions: Vec<u32> = slots.iter().map(|s| s.position).collect();
        let expected: Vec<u32> = (1..=draw_size).collect();
        assert_eq!(positions, expected, "Slot positions are not 1..=draw_size");

        let placed: Vec<AthleteId> = slots.iter().filter_map(|s| s.occupant.athlete_id()).collect();
        let unique: HashSet<AthleteId> = placed.iter().copied().collect();
        assert_eq!(unique.len(), placed.len(), "A competitor occupies two slots");

        let wanted: HashSet<AthleteId> = competitors.iter().map(|e| e.athlete_id).collect();
        assert_eq!(unique, wanted, "Placed competitors differ from the field");
        assert_eq!(
            slots.iter().filter(|s| s.occupant == SlotOccupant::Bye).count(),
            draw_size as usize - competitors.len(),
            "Wrong bye count"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
