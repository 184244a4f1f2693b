//! PISTE Storage - Storage Traits and Mock Implementation
//!
//! Defines the storage abstraction the formula engine runs against. Every
//! mutation happens inside a [`StoreTransaction`]; dropping a transaction
//! without committing discards all of its writes.

mod mock;

pub use mock::MockStorage;

use piste_core::{
    BracketConfiguration, Competition, CompetitionId, CompetitionStatus,
    DirectEliminationBracket, Phase, PhaseId, PhaseStatus, PisteResult, Poule, PouleAssignment,
    PouleId, Registration, Tournament, TournamentId,
};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for competitions.
///
/// `expected_version` must match the stored version or the update fails with
/// `StorageError::ConcurrentModification`. A successful update bumps the
/// version by one.
#[derive(Debug, Clone)]
pub struct CompetitionUpdate {
    pub expected_version: i64,
    /// New status
    pub status: Option<CompetitionStatus>,
}

impl CompetitionUpdate {
    /// Bump the version without changing anything else.
    pub fn touch(expected_version: i64) -> Self {
        Self {
            expected_version,
            status: None,
        }
    }

    pub fn with_status(mut self, status: CompetitionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

// ============================================================================
// STORAGE TRAITS
// ============================================================================

/// Read access to tournament data plus the entry point for transactions.
///
/// Reads through the store must not be issued while a transaction obtained
/// from the same store is still open.
pub trait TournamentStore: Send + Sync {
    // === Master data ===

    /// Get a tournament by ID.
    fn tournament_get(&self, id: TournamentId) -> PisteResult<Option<Tournament>>;

    /// Get a competition by ID.
    fn competition_get(&self, id: CompetitionId) -> PisteResult<Option<Competition>>;

    /// List the registrations of a competition, in registration order.
    fn registration_list_by_competition(
        &self,
        competition_id: CompetitionId,
    ) -> PisteResult<Vec<Registration>>;

    // === Formula ===

    /// List the phases of a competition ordered by `sequence_order`.
    fn phase_list_by_competition(&self, competition_id: CompetitionId) -> PisteResult<Vec<Phase>>;

    /// List the bracket configurations of a phase, in insertion order.
    fn bracket_configuration_list_by_phase(
        &self,
        phase_id: PhaseId,
    ) -> PisteResult<Vec<BracketConfiguration>>;

    // === Generated data ===

    /// List the poules of a phase ordered by number.
    fn poule_list_by_phase(&self, phase_id: PhaseId) -> PisteResult<Vec<Poule>>;

    /// List the seats of a poule ordered by position.
    fn poule_assignment_list_by_poule(&self, poule_id: PouleId) -> PisteResult<Vec<PouleAssignment>>;

    /// List the elimination brackets of a phase.
    fn bracket_list_by_phase(&self, phase_id: PhaseId) -> PisteResult<Vec<DirectEliminationBracket>>;

    // === Transactions ===

    /// Open an all-or-nothing write transaction.
    fn begin(&self) -> PisteResult<Box<dyn StoreTransaction + '_>>;
}

/// Multi-statement write transaction.
///
/// Writes are only visible to other readers after [`StoreTransaction::commit`]
/// succeeds. Reads through the transaction see its own uncommitted writes.
pub trait StoreTransaction {
    /// Get a competition by ID, including uncommitted changes.
    fn competition_get(&self, id: CompetitionId) -> PisteResult<Option<Competition>>;

    /// Apply a versioned update and return the updated competition.
    fn competition_update(
        &mut self,
        id: CompetitionId,
        update: CompetitionUpdate,
    ) -> PisteResult<Competition>;

    /// List the phases of a competition ordered by `sequence_order`.
    fn phase_list_by_competition(&self, competition_id: CompetitionId) -> PisteResult<Vec<Phase>>;

    /// Delete every phase of a competition together with its bracket
    /// configurations, poules, assignments and brackets. Returns the number
    /// of phases removed.
    fn phase_delete_by_competition(&mut self, competition_id: CompetitionId) -> PisteResult<usize>;

    /// Insert a new phase.
    fn phase_insert(&mut self, phase: &Phase) -> PisteResult<()>;

    /// Set the status of a phase.
    fn phase_update_status(&mut self, phase_id: PhaseId, status: PhaseStatus) -> PisteResult<()>;

    /// Insert a new bracket configuration.
    fn bracket_configuration_insert(&mut self, config: &BracketConfiguration) -> PisteResult<()>;

    /// Delete every poule of a phase with its assignments. Returns the
    /// number of poules removed.
    fn poule_delete_by_phase(&mut self, phase_id: PhaseId) -> PisteResult<usize>;

    /// Insert a new poule.
    fn poule_insert(&mut self, poule: &Poule) -> PisteResult<()>;

    /// Insert a new poule assignment.
    fn poule_assignment_insert(&mut self, assignment: &PouleAssignment) -> PisteResult<()>;

    /// Delete every bracket of a phase. Returns the number removed.
    fn bracket_delete_by_phase(&mut self, phase_id: PhaseId) -> PisteResult<usize>;

    /// Insert a new elimination bracket.
    fn bracket_insert(&mut self, bracket: &DirectEliminationBracket) -> PisteResult<()>;

    /// Make all writes of this transaction durable.
    fn commit(self: Box<Self>) -> PisteResult<()>;
}
