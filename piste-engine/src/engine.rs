//! Formula engine: configures formulas, generates pools and draws, and
//! drives the competition lifecycle.
//!
//! Every write operation checks, in order: caller authorization, existence
//! of the competition, and its status. All composition runs before the
//! store transaction opens, so a composer failure never reaches storage.
//! The competition version read during those checks must still match at
//! commit time.

use crate::auth::{Authorizer, CallerIdentity, RoleAuthorizer};
use crate::bracket::{compose_draw, DrawSpec};
use crate::poule::{
    check_pool_sizes, compose_poules, ensure_registered, from_precomputed, pool_count_for,
    ComposedPoule,
};
use crate::request::{
    ConfiguredFormula, ConfiguredPhase, GenerateRequest, GenerationOutcome, PhaseEntrants,
};
use crate::rng::{self, RandomSource};
use chrono::Utc;
use piste_core::{
    AthleteId, BracketConfiguration, BracketId, BracketType, Competition, CompetitionEvent,
    CompetitionId, DirectEliminationBracket, EngineConfig, Entrant, EntityType,
    FormulaDefinition, Phase, PhaseId, PhaseStatus, PisteError, PisteResult, Poule,
    PouleAssignment, PouleAssignmentId, PouleId, PouleStatus, StateConflictError, StorageError,
    ValidationError,
};
use piste_storage::{CompetitionUpdate, StoreTransaction, TournamentStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Generation and progression engine over a [`TournamentStore`].
pub struct FormulaEngine<S, A = RoleAuthorizer> {
    store: S,
    authorizer: A,
    config: EngineConfig,
}

impl<S: TournamentStore> FormulaEngine<S> {
    /// Engine with the default role-based authorization.
    pub fn new(store: S, config: EngineConfig) -> PisteResult<Self> {
        Self::with_authorizer(store, RoleAuthorizer, config)
    }
}

impl<S: TournamentStore, A: Authorizer> FormulaEngine<S, A> {
    pub fn with_authorizer(store: S, authorizer: A, config: EngineConfig) -> PisteResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            authorizer,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // FORMULA CONFIGURATION
    // ========================================================================

    /// Validate `formula` and replace the stored formula of the competition.
    ///
    /// Replacing the formula deletes every phase with its generated pools
    /// and draws.
    pub fn configure_formula(
        &self,
        caller: &CallerIdentity,
        competition_id: CompetitionId,
        formula: &FormulaDefinition,
    ) -> PisteResult<ConfiguredFormula> {
        info!(competition_id = %competition_id, phases = formula.phases.len(), "Configuring formula");
        let result = self.configure_formula_inner(caller, competition_id, formula);
        match &result {
            Ok(configured) => info!(
                competition_id = %competition_id,
                phases = configured.phases.len(),
                "Formula configured"
            ),
            Err(e) => warn!(competition_id = %competition_id, error = %e, "Formula rejected"),
        }
        result
    }

    fn configure_formula_inner(
        &self,
        caller: &CallerIdentity,
        competition_id: CompetitionId,
        formula: &FormulaDefinition,
    ) -> PisteResult<ConfiguredFormula> {
        let competition = self.guard_modification(caller, competition_id, "configure_formula")?;
        formula.validate(&self.config)?;

        let phases: Vec<ConfiguredPhase> = formula
            .phases
            .iter()
            .map(|definition| {
                let (phase, brackets) = definition.instantiate(competition_id);
                ConfiguredPhase { phase, brackets }
            })
            .collect();

        let mut tx = self.store.begin()?;
        ensure_version(&*tx, &competition)?;
        let removed = tx.phase_delete_by_competition(competition_id)?;
        debug!(competition_id = %competition_id, removed, "Removed previous formula");
        for configured in &phases {
            tx.phase_insert(&configured.phase)?;
            for bracket in &configured.brackets {
                tx.bracket_configuration_insert(bracket)?;
            }
        }
        tx.competition_update(competition_id, CompetitionUpdate::touch(competition.version))?;
        tx.commit()?;

        Ok(ConfiguredFormula {
            competition_id,
            phases,
        })
    }

    /// Read back the stored formula.
    pub fn load_formula(&self, competition_id: CompetitionId) -> PisteResult<ConfiguredFormula> {
        if self.store.competition_get(competition_id)?.is_none() {
            return Err(PisteError::not_found(EntityType::Competition, competition_id));
        }
        let phases = self
            .store
            .phase_list_by_competition(competition_id)?
            .into_iter()
            .map(|phase| {
                let brackets = self.store.bracket_configuration_list_by_phase(phase.phase_id)?;
                Ok(ConfiguredPhase { phase, brackets })
            })
            .collect::<PisteResult<Vec<_>>>()?;
        Ok(ConfiguredFormula {
            competition_id,
            phases,
        })
    }

    // ========================================================================
    // GENERATION
    // ========================================================================

    /// Regenerate every pool and draw of the competition in one transaction
    /// and move the competition to IN_PROGRESS.
    pub fn generate(
        &self,
        caller: &CallerIdentity,
        request: &GenerateRequest,
    ) -> PisteResult<GenerationOutcome> {
        let competition_id = request.competition_id;
        info!(competition_id = %competition_id, user_id = %caller.user_id, "Generation started");
        let result = self.generate_inner(caller, request);
        match &result {
            Ok(outcome) => info!(
                competition_id = %competition_id,
                poules = outcome.poules.len(),
                assignments = outcome.assignments.len(),
                brackets = outcome.brackets.len(),
                phases_updated = outcome.phases_updated,
                version = outcome.competition.version,
                "Generation committed"
            ),
            Err(e) => warn!(
                competition_id = %competition_id,
                kind = ?e.kind(),
                error = %e,
                "Generation rejected"
            ),
        }
        result
    }

    fn generate_inner(
        &self,
        caller: &CallerIdentity,
        request: &GenerateRequest,
    ) -> PisteResult<GenerationOutcome> {
        let competition_id = request.competition_id;
        let competition = self.guard_modification(caller, competition_id, "generate")?;
        let next_status = competition.status.apply(CompetitionEvent::Start)?;

        let formula = self.load_formula(competition_id)?;
        if formula.phases.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "phases".to_string(),
            }
            .into());
        }
        check_request_targets(&formula, request)?;

        let registrations: Vec<Entrant> = self
            .store
            .registration_list_by_competition(competition_id)?
            .iter()
            .map(|r| r.entrant())
            .collect();
        let registered: HashSet<AthleteId> = registrations.iter().map(|e| e.athlete_id).collect();
        let mut random = rng::resolve(request.random_seed, self.config.random_seed);

        let mut poules = Vec::new();
        let mut assignments = Vec::new();
        let mut brackets = Vec::new();

        for configured in &formula.phases {
            let phase = &configured.phase;
            let phase_input = request.phase_entrants.get(&phase.phase_id);

            if let Some(PhaseEntrants::Entrants(entrants)) = phase_input {
                ensure_registered(
                    &format!("phase_entrants[{}]", phase.phase_id),
                    entrants.iter().map(|e| e.athlete_id),
                    &registered,
                )?;
            }
            for bracket_config in &configured.brackets {
                let id = bracket_config.bracket_configuration_id;
                if let Some(entrants) = request.bracket_entrants.get(&id) {
                    ensure_registered(
                        &format!("bracket_entrants[{}]", id),
                        entrants.iter().map(|e| e.athlete_id),
                        &registered,
                    )?;
                }
            }

            if let Some(config) = phase.config.as_poule() {
                let composed = match phase_input {
                    Some(PhaseEntrants::Poules(pools)) => from_precomputed(pools, &registered)?,
                    Some(PhaseEntrants::Entrants(entrants)) => {
                        compose_poules(entrants, pool_count_for(entrants.len(), config)?)?
                    }
                    None => compose_poules(
                        &registrations,
                        pool_count_for(registrations.len(), config)?,
                    )?,
                };
                if config.pool_count.is_some() && !matches!(phase_input, Some(PhaseEntrants::Poules(_))) {
                    check_pool_sizes(&composed, self.config.min_pool_size, self.config.max_pool_size)?;
                }
                debug!(
                    phase_id = %phase.phase_id,
                    poules = composed.len(),
                    "Composed poules"
                );
                if !configured.brackets.is_empty() {
                    debug!(
                        phase_id = %phase.phase_id,
                        brackets = configured.brackets.len(),
                        "Bracket configurations of a POULE phase are not drawn"
                    );
                }
                let (phase_poules, phase_assignments) = materialize_poules(phase.phase_id, composed);
                poules.extend(phase_poules);
                assignments.extend(phase_assignments);
                continue;
            }

            let phase_entrants = match phase_input {
                Some(PhaseEntrants::Entrants(entrants)) => Some(entrants.as_slice()),
                Some(PhaseEntrants::Poules(_)) => {
                    return Err(PisteError::invalid_value(
                        format!("phase_entrants[{}]", phase.phase_id),
                        format!("pools can only be supplied for POULE phases, not {}", phase.phase_type()),
                    ))
                }
                None => None,
            };

            for bracket_config in &configured.brackets {
                let competitors = match (
                    request.bracket_entrants.get(&bracket_config.bracket_configuration_id),
                    bracket_config.bracket_type,
                ) {
                    (Some(entrants), _) => entrants.as_slice(),
                    (None, BracketType::Main) => phase_entrants.unwrap_or(registrations.as_slice()),
                    (None, other) => {
                        debug!(
                            phase_id = %phase.phase_id,
                            bracket_type = %other,
                            "No entrants supplied, bracket skipped"
                        );
                        continue;
                    }
                };
                let bracket =
                    self.draw_bracket(phase, bracket_config, competitors, request, &mut *random)?;
                debug!(
                    phase_id = %phase.phase_id,
                    bracket_type = %bracket_config.bracket_type,
                    draw_size = bracket.draw_size,
                    byes = bracket.bye_count(),
                    "Composed bracket"
                );
                brackets.push(bracket);
            }
        }

        // Everything is composed; nothing below can fail validation.
        let mut tx = self.store.begin()?;
        ensure_version(&*tx, &competition)?;

        for configured in &formula.phases {
            tx.poule_delete_by_phase(configured.phase.phase_id)?;
            tx.bracket_delete_by_phase(configured.phase.phase_id)?;
        }
        for poule in &poules {
            tx.poule_insert(poule)?;
        }
        for assignment in &assignments {
            tx.poule_assignment_insert(assignment)?;
        }
        for bracket in &brackets {
            tx.bracket_insert(bracket)?;
        }

        let mut phases_updated = 0;
        for update in &request.phase_status_updates {
            tx.phase_update_status(update.phase_id, update.status)?;
            phases_updated += 1;
        }

        let competition = tx.competition_update(
            competition_id,
            CompetitionUpdate::touch(competition.version).with_status(next_status),
        )?;
        tx.commit()?;

        Ok(GenerationOutcome {
            competition,
            poules,
            assignments,
            brackets,
            phases_updated,
        })
    }

    fn draw_bracket(
        &self,
        phase: &Phase,
        config: &BracketConfiguration,
        competitors: &[Entrant],
        request: &GenerateRequest,
        random: &mut dyn RandomSource,
    ) -> PisteResult<DirectEliminationBracket> {
        let spec = DrawSpec {
            size: config.size,
            seeding_method: config.seeding_method,
            manual_placement: request
                .manual_placements
                .get(&config.bracket_configuration_id)
                .map(Vec::as_slice),
            max_draw_size: self.config.max_draw_size,
        };
        let draw = compose_draw(competitors, &spec, random)?;
        Ok(DirectEliminationBracket {
            bracket_id: BracketId::now_v7(),
            phase_id: phase.phase_id,
            bracket_configuration_id: config.bracket_configuration_id,
            name: format!("{} - {}", phase.name, config.bracket_type.label()),
            draw_size: draw.draw_size,
            slots: draw.slots,
            created_at: Utc::now(),
        })
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Apply a lifecycle event to a competition.
    pub fn transition_competition(
        &self,
        caller: &CallerIdentity,
        competition_id: CompetitionId,
        event: CompetitionEvent,
    ) -> PisteResult<Competition> {
        let competition = self.authorize(caller, competition_id, "transition_competition")?;
        let next = competition.status.apply(event).inspect_err(|e| {
            warn!(competition_id = %competition_id, error = %e, "Transition rejected");
        })?;

        let mut tx = self.store.begin()?;
        let updated = tx.competition_update(
            competition_id,
            CompetitionUpdate::touch(competition.version).with_status(next),
        )?;
        tx.commit()?;

        info!(
            competition_id = %competition_id,
            from = %competition.status,
            to = %updated.status,
            "Competition transitioned"
        );
        Ok(updated)
    }

    // ========================================================================
    // GUARDS
    // ========================================================================

    /// Authorization first, then existence.
    fn authorize(
        &self,
        caller: &CallerIdentity,
        competition_id: CompetitionId,
        action: &str,
    ) -> PisteResult<Competition> {
        let competition = self.store.competition_get(competition_id)?;
        let owner = match &competition {
            Some(c) => self
                .store
                .tournament_get(c.tournament_id)?
                .map(|t| t.organization_id),
            None => None,
        };
        self.authorizer.authorize_write(caller, owner, action)?;
        competition.ok_or_else(|| PisteError::not_found(EntityType::Competition, competition_id))
    }

    /// Authorization, existence, then a status that still permits changes.
    fn guard_modification(
        &self,
        caller: &CallerIdentity,
        competition_id: CompetitionId,
        action: &str,
    ) -> PisteResult<Competition> {
        let competition = self.authorize(caller, competition_id, action)?;
        if !competition.status.permits_modification() {
            return Err(StateConflictError::CompetitionClosed {
                competition_id,
                status: competition.status,
            }
            .into());
        }
        Ok(competition)
    }
}

/// Reject phase and bracket references that do not belong to the formula,
/// and phase status updates that would move backwards.
fn check_request_targets(
    formula: &ConfiguredFormula,
    request: &GenerateRequest,
) -> PisteResult<()> {
    let phases: HashMap<PhaseId, &Phase> = formula
        .phases
        .iter()
        .map(|c| (c.phase.phase_id, &c.phase))
        .collect();
    let bracket_ids: HashSet<_> = formula
        .phases
        .iter()
        .flat_map(|c| c.brackets.iter().map(|b| b.bracket_configuration_id))
        .collect();

    if let Some(unknown) = request.phase_entrants.keys().find(|id| !phases.contains_key(id)) {
        return Err(PisteError::not_found(EntityType::Phase, *unknown));
    }
    if let Some(unknown) = request
        .bracket_entrants
        .keys()
        .chain(request.manual_placements.keys())
        .find(|id| !bracket_ids.contains(id))
    {
        return Err(PisteError::not_found(EntityType::BracketConfiguration, *unknown));
    }

    let mut current: HashMap<PhaseId, PhaseStatus> =
        phases.iter().map(|(id, phase)| (*id, phase.status)).collect();
    for update in &request.phase_status_updates {
        let status = current
            .get_mut(&update.phase_id)
            .ok_or_else(|| PisteError::not_found(EntityType::Phase, update.phase_id))?;
        if !status.can_transition_to(update.status) {
            return Err(StateConflictError::IllegalPhaseTransition {
                phase_id: update.phase_id,
                from: *status,
                to: update.status,
            }
            .into());
        }
        *status = update.status;
    }
    Ok(())
}

/// The transaction must still see the competition version read by the guards.
fn ensure_version(tx: &dyn StoreTransaction, competition: &Competition) -> PisteResult<()> {
    let current = tx
        .competition_get(competition.competition_id)?
        .ok_or_else(|| PisteError::not_found(EntityType::Competition, competition.competition_id))?;
    if current.version != competition.version {
        return Err(StorageError::ConcurrentModification {
            entity_type: EntityType::Competition,
            id: competition.competition_id.into(),
            expected: competition.version,
            found: current.version,
        }
        .into());
    }
    Ok(())
}

fn materialize_poules(
    phase_id: PhaseId,
    composed: Vec<ComposedPoule>,
) -> (Vec<Poule>, Vec<PouleAssignment>) {
    let now = Utc::now();
    let mut poules = Vec::with_capacity(composed.len());
    let mut assignments = Vec::new();
    for pool in composed {
        let poule = Poule {
            poule_id: PouleId::now_v7(),
            phase_id,
            number: pool.number,
            status: PouleStatus::Scheduled,
            created_at: now,
        };
        assignments.extend(pool.seats().map(|(position, athlete_id)| PouleAssignment {
            assignment_id: PouleAssignmentId::now_v7(),
            poule_id: poule.poule_id,
            athlete_id,
            position,
        }));
        poules.push(poule);
    }
    (poules, assignments)
}
