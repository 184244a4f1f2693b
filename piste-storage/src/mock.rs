//! In-memory storage for tests and previews.

use crate::{CompetitionUpdate, StoreTransaction, TournamentStore};
use chrono::Utc;
use piste_core::{
    AthleteId, BracketConfiguration, Competition, CompetitionId, DirectEliminationBracket,
    EntityType, Phase, PhaseId, PhaseStatus, PisteError, PisteResult, Poule, PouleAssignment,
    PouleId, Registration, StorageError, Tournament, TournamentId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
struct MockState {
    tournaments: HashMap<TournamentId, Tournament>,
    competitions: HashMap<CompetitionId, Competition>,
    registrations: Vec<Registration>,
    phases: HashMap<PhaseId, Phase>,
    bracket_configurations: Vec<BracketConfiguration>,
    poules: HashMap<PouleId, Poule>,
    assignments: Vec<PouleAssignment>,
    brackets: Vec<DirectEliminationBracket>,
}

impl MockState {
    fn phases_of(&self, competition_id: CompetitionId) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self
            .phases
            .values()
            .filter(|p| p.competition_id == competition_id)
            .cloned()
            .collect();
        phases.sort_by_key(|p| p.sequence_order);
        phases
    }

    fn remove_poules_of(&mut self, phase_id: PhaseId) -> usize {
        let doomed: HashSet<PouleId> = self
            .poules
            .values()
            .filter(|p| p.phase_id == phase_id)
            .map(|p| p.poule_id)
            .collect();
        self.poules.retain(|id, _| !doomed.contains(id));
        self.assignments.retain(|a| !doomed.contains(&a.poule_id));
        doomed.len()
    }

    fn remove_brackets_of(&mut self, phase_id: PhaseId) -> usize {
        let before = self.brackets.len();
        self.brackets.retain(|b| b.phase_id != phase_id);
        before - self.brackets.len()
    }

    fn athlete_seated_in_phase(&self, phase_id: PhaseId, athlete_id: AthleteId) -> bool {
        self.assignments.iter().any(|a| {
            a.athlete_id == athlete_id
                && self
                    .poules
                    .get(&a.poule_id)
                    .is_some_and(|p| p.phase_id == phase_id)
        })
    }
}

fn insert_failed(entity_type: EntityType, reason: String) -> PisteError {
    PisteError::Storage(StorageError::InsertFailed {
        entity_type,
        reason,
    })
}

/// Mock storage implementation for testing.
///
/// Transactions take the write lock for their whole lifetime and work on a
/// staged copy of the state, which replaces the live state on commit.
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    state: Arc<RwLock<MockState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> PisteResult<RwLockReadGuard<'_, MockState>> {
        self.state
            .read()
            .map_err(|_| PisteError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> PisteResult<RwLockWriteGuard<'_, MockState>> {
        self.state
            .write()
            .map_err(|_| PisteError::Storage(StorageError::LockPoisoned))
    }

    /// Make the next commit fail, leaving the state untouched.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Insert a tournament.
    pub fn tournament_insert(&self, t: &Tournament) -> PisteResult<()> {
        let mut state = self.write()?;
        if state.tournaments.contains_key(&t.tournament_id) {
            return Err(insert_failed(
                EntityType::Tournament,
                format!("Duplicate tournament_id: {}", t.tournament_id),
            ));
        }
        state.tournaments.insert(t.tournament_id, t.clone());
        Ok(())
    }

    /// Insert a competition. Its tournament must exist.
    pub fn competition_insert(&self, c: &Competition) -> PisteResult<()> {
        let mut state = self.write()?;
        if state.competitions.contains_key(&c.competition_id) {
            return Err(insert_failed(
                EntityType::Competition,
                format!("Duplicate competition_id: {}", c.competition_id),
            ));
        }
        if !state.tournaments.contains_key(&c.tournament_id) {
            return Err(insert_failed(
                EntityType::Competition,
                format!("Unknown tournament_id: {}", c.tournament_id),
            ));
        }
        state.competitions.insert(c.competition_id, c.clone());
        Ok(())
    }

    /// Register an athlete. An athlete can only register once per competition.
    pub fn registration_insert(&self, r: &Registration) -> PisteResult<()> {
        let mut state = self.write()?;
        if !state.competitions.contains_key(&r.competition_id) {
            return Err(insert_failed(
                EntityType::Registration,
                format!("Unknown competition_id: {}", r.competition_id),
            ));
        }
        if state
            .registrations
            .iter()
            .any(|x| x.competition_id == r.competition_id && x.athlete_id == r.athlete_id)
        {
            return Err(insert_failed(
                EntityType::Registration,
                format!("Athlete {} is already registered", r.athlete_id),
            ));
        }
        state.registrations.push(r.clone());
        Ok(())
    }

    /// Simulate another writer touching the competition.
    pub fn competition_bump_version(&self, id: CompetitionId) -> PisteResult<()> {
        let mut state = self.write()?;
        let competition = state
            .competitions
            .get_mut(&id)
            .ok_or_else(|| PisteError::not_found(EntityType::Competition, id))?;
        competition.version += 1;
        competition.updated_at = Utc::now();
        Ok(())
    }

    /// Get the count of stored phases.
    pub fn phase_count(&self) -> usize {
        self.read().map(|s| s.phases.len()).unwrap_or(0)
    }

    /// Get the count of stored bracket configurations.
    pub fn bracket_configuration_count(&self) -> usize {
        self.read().map(|s| s.bracket_configurations.len()).unwrap_or(0)
    }

    /// Get the count of stored poules.
    pub fn poule_count(&self) -> usize {
        self.read().map(|s| s.poules.len()).unwrap_or(0)
    }

    /// Get the count of stored poule assignments.
    pub fn assignment_count(&self) -> usize {
        self.read().map(|s| s.assignments.len()).unwrap_or(0)
    }

    /// Get the count of stored brackets.
    pub fn bracket_count(&self) -> usize {
        self.read().map(|s| s.brackets.len()).unwrap_or(0)
    }
}

impl TournamentStore for MockStorage {
    fn tournament_get(&self, id: TournamentId) -> PisteResult<Option<Tournament>> {
        Ok(self.read()?.tournaments.get(&id).cloned())
    }

    fn competition_get(&self, id: CompetitionId) -> PisteResult<Option<Competition>> {
        Ok(self.read()?.competitions.get(&id).cloned())
    }

    fn registration_list_by_competition(
        &self,
        competition_id: CompetitionId,
    ) -> PisteResult<Vec<Registration>> {
        Ok(self
            .read()?
            .registrations
            .iter()
            .filter(|r| r.competition_id == competition_id)
            .cloned()
            .collect())
    }

    fn phase_list_by_competition(&self, competition_id: CompetitionId) -> PisteResult<Vec<Phase>> {
        Ok(self.read()?.phases_of(competition_id))
    }

    fn bracket_configuration_list_by_phase(
        &self,
        phase_id: PhaseId,
    ) -> PisteResult<Vec<BracketConfiguration>> {
        Ok(self
            .read()?
            .bracket_configurations
            .iter()
            .filter(|b| b.phase_id == phase_id)
            .cloned()
            .collect())
    }

    fn poule_list_by_phase(&self, phase_id: PhaseId) -> PisteResult<Vec<Poule>> {
        let mut poules: Vec<Poule> = self
            .read()?
            .poules
            .values()
            .filter(|p| p.phase_id == phase_id)
            .cloned()
            .collect();
        poules.sort_by_key(|p| p.number);
        Ok(poules)
    }

    fn poule_assignment_list_by_poule(&self, poule_id: PouleId) -> PisteResult<Vec<PouleAssignment>> {
        let mut seats: Vec<PouleAssignment> = self
            .read()?
            .assignments
            .iter()
            .filter(|a| a.poule_id == poule_id)
            .cloned()
            .collect();
        seats.sort_by_key(|a| a.position);
        Ok(seats)
    }

    fn bracket_list_by_phase(&self, phase_id: PhaseId) -> PisteResult<Vec<DirectEliminationBracket>> {
        Ok(self
            .read()?
            .brackets
            .iter()
            .filter(|b| b.phase_id == phase_id)
            .cloned()
            .collect())
    }

    fn begin(&self) -> PisteResult<Box<dyn StoreTransaction + '_>> {
        let guard = self.write()?;
        let staged = guard.clone();
        Ok(Box::new(MockTransaction {
            guard,
            staged,
            fail_commit: &*self.fail_next_commit,
        }))
    }
}

/// Transaction over [`MockStorage`].
struct MockTransaction<'a> {
    guard: RwLockWriteGuard<'a, MockState>,
    staged: MockState,
    fail_commit: &'a AtomicBool,
}

impl StoreTransaction for MockTransaction<'_> {
    fn competition_get(&self, id: CompetitionId) -> PisteResult<Option<Competition>> {
        Ok(self.staged.competitions.get(&id).cloned())
    }

    fn competition_update(
        &mut self,
        id: CompetitionId,
        update: CompetitionUpdate,
    ) -> PisteResult<Competition> {
        let competition = self
            .staged
            .competitions
            .get_mut(&id)
            .ok_or_else(|| PisteError::not_found(EntityType::Competition, id))?;

        if competition.version != update.expected_version {
            return Err(PisteError::Storage(StorageError::ConcurrentModification {
                entity_type: EntityType::Competition,
                id: id.into(),
                expected: update.expected_version,
                found: competition.version,
            }));
        }

        if let Some(status) = update.status {
            competition.status = status;
        }
        competition.version += 1;
        competition.updated_at = Utc::now();
        Ok(competition.clone())
    }

    fn phase_list_by_competition(&self, competition_id: CompetitionId) -> PisteResult<Vec<Phase>> {
        Ok(self.staged.phases_of(competition_id))
    }

    fn phase_delete_by_competition(&mut self, competition_id: CompetitionId) -> PisteResult<usize> {
        let doomed: Vec<PhaseId> = self
            .staged
            .phases
            .values()
            .filter(|p| p.competition_id == competition_id)
            .map(|p| p.phase_id)
            .collect();
        for phase_id in &doomed {
            self.staged.remove_poules_of(*phase_id);
            self.staged.remove_brackets_of(*phase_id);
            self.staged
                .bracket_configurations
                .retain(|b| b.phase_id != *phase_id);
            self.staged.phases.remove(phase_id);
        }
        Ok(doomed.len())
    }

    fn phase_insert(&mut self, phase: &Phase) -> PisteResult<()> {
        if self.staged.phases.contains_key(&phase.phase_id) {
            return Err(insert_failed(
                EntityType::Phase,
                format!("Duplicate phase_id: {}", phase.phase_id),
            ));
        }
        if !self.staged.competitions.contains_key(&phase.competition_id) {
            return Err(insert_failed(
                EntityType::Phase,
                format!("Unknown competition_id: {}", phase.competition_id),
            ));
        }
        if self.staged.phases.values().any(|p| {
            p.competition_id == phase.competition_id && p.sequence_order == phase.sequence_order
        }) {
            return Err(insert_failed(
                EntityType::Phase,
                format!("Duplicate sequence_order: {}", phase.sequence_order),
            ));
        }
        self.staged.phases.insert(phase.phase_id, phase.clone());
        Ok(())
    }

    fn phase_update_status(&mut self, phase_id: PhaseId, status: PhaseStatus) -> PisteResult<()> {
        let phase = self
            .staged
            .phases
            .get_mut(&phase_id)
            .ok_or_else(|| PisteError::not_found(EntityType::Phase, phase_id))?;
        phase.status = status;
        Ok(())
    }

    fn bracket_configuration_insert(&mut self, config: &BracketConfiguration) -> PisteResult<()> {
        if !self.staged.phases.contains_key(&config.phase_id) {
            return Err(insert_failed(
                EntityType::BracketConfiguration,
                format!("Unknown phase_id: {}", config.phase_id),
            ));
        }
        if self
            .staged
            .bracket_configurations
            .iter()
            .any(|b| b.bracket_configuration_id == config.bracket_configuration_id)
        {
            return Err(insert_failed(
                EntityType::BracketConfiguration,
                format!("Duplicate bracket_configuration_id: {}", config.bracket_configuration_id),
            ));
        }
        self.staged.bracket_configurations.push(config.clone());
        Ok(())
    }

    fn poule_delete_by_phase(&mut self, phase_id: PhaseId) -> PisteResult<usize> {
        Ok(self.staged.remove_poules_of(phase_id))
    }

    fn poule_insert(&mut self, poule: &Poule) -> PisteResult<()> {
        if !self.staged.phases.contains_key(&poule.phase_id) {
            return Err(insert_failed(
                EntityType::Poule,
                format!("Unknown phase_id: {}", poule.phase_id),
            ));
        }
        if self.staged.poules.contains_key(&poule.poule_id) {
            return Err(insert_failed(
                EntityType::Poule,
                format!("Duplicate poule_id: {}", poule.poule_id),
            ));
        }
        if self
            .staged
            .poules
            .values()
            .any(|p| p.phase_id == poule.phase_id && p.number == poule.number)
        {
            return Err(insert_failed(
                EntityType::Poule,
                format!("Duplicate poule number {} in phase {}", poule.number, poule.phase_id),
            ));
        }
        self.staged.poules.insert(poule.poule_id, poule.clone());
        Ok(())
    }

    fn poule_assignment_insert(&mut self, assignment: &PouleAssignment) -> PisteResult<()> {
        let phase_id = match self.staged.poules.get(&assignment.poule_id) {
            Some(poule) => poule.phase_id,
            None => {
                return Err(insert_failed(
                    EntityType::PouleAssignment,
                    format!("Unknown poule_id: {}", assignment.poule_id),
                ))
            }
        };
        if self
            .staged
            .assignments
            .iter()
            .any(|a| a.poule_id == assignment.poule_id && a.position == assignment.position)
        {
            return Err(insert_failed(
                EntityType::PouleAssignment,
                format!("Position {} is already taken", assignment.position),
            ));
        }
        if self.staged.athlete_seated_in_phase(phase_id, assignment.athlete_id) {
            return Err(insert_failed(
                EntityType::PouleAssignment,
                format!("Athlete {} already has a seat in phase {}", assignment.athlete_id, phase_id),
            ));
        }
        self.staged.assignments.push(assignment.clone());
        Ok(())
    }

    fn bracket_delete_by_phase(&mut self, phase_id: PhaseId) -> PisteResult<usize> {
        Ok(self.staged.remove_brackets_of(phase_id))
    }

    fn bracket_insert(&mut self, bracket: &DirectEliminationBracket) -> PisteResult<()> {
        if !self.staged.phases.contains_key(&bracket.phase_id) {
            return Err(insert_failed(
                EntityType::DirectEliminationBracket,
                format!("Unknown phase_id: {}", bracket.phase_id),
            ));
        }
        if !self
            .staged
            .bracket_configurations
            .iter()
            .any(|c| c.bracket_configuration_id == bracket.bracket_configuration_id)
        {
            return Err(insert_failed(
                EntityType::DirectEliminationBracket,
                format!(
                    "Unknown bracket_configuration_id: {}",
                    bracket.bracket_configuration_id
                ),
            ));
        }
        if self.staged.brackets.iter().any(|b| b.bracket_id == bracket.bracket_id) {
            return Err(insert_failed(
                EntityType::DirectEliminationBracket,
                format!("Duplicate bracket_id: {}", bracket.bracket_id),
            ));
        }
        self.staged.brackets.push(bracket.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> PisteResult<()> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(PisteError::Storage(StorageError::TransactionFailed {
                reason: "commit rejected by storage".to_string(),
            }));
        }
        let MockTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use piste_core::{OrganizationId, Weapon};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Registrations come back in the order they were inserted.
        #[test]
        fn prop_registration_order_preserved(count in 0usize..40) {
            let storage = MockStorage::new();
            let tournament = Tournament::new(OrganizationId::now_v7(), "Open");
            storage.tournament_insert(&tournament).unwrap();
            let competition = Competition::new(tournament.tournament_id, "U20", Weapon::Sabre, "Junior");
            storage.competition_insert(&competition).unwrap();

            let registrations: Vec<Registration> = (0..count)
                .map(|_| Registration::new(competition.competition_id, AthleteId::now_v7(), None))
                .collect();
            for r in &registrations {
                storage.registration_insert(r).unwrap();
            }

            let listed = storage
                .registration_list_by_competition(competition.competition_id)
                .unwrap();
            prop_assert_eq!(listed, registrations);
        }

        /// Not-found reads return None rather than an error.
        #[test]
        fn prop_not_found_returns_none(_dummy in any::<u8>()) {
            let storage = MockStorage::new();
            prop_assert!(storage.competition_get(CompetitionId::now_v7()).unwrap().is_none());
            prop_assert!(storage.tournament_get(TournamentId::now_v7()).unwrap().is_none());
        }
    }
}
