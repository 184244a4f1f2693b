//! Formula Preview Binary
//!
//! Runs a formula against an in-memory competition and prints the pools and
//! draws it produces. Entrants are seeded 1..=N in registration order.
//!
//! Usage:
//!   cargo run -p piste-engine --bin formula_preview -- formula.json 24 [seed]

use piste_core::{
    AthleteId, Competition, CompetitionStatus, EngineConfig, FormulaDefinition, OrganizationId,
    PisteError, PisteResult, Registration, SlotOccupant, Tournament, UserId, Weapon,
};
use piste_engine::{
    init_tracing, round_robin_order, CallerIdentity, FormulaEngine, GenerateRequest,
    GenerationOutcome, TelemetryConfig,
};
use piste_storage::MockStorage;

const USAGE: &str = "usage: formula_preview <formula.json> <entrant-count> [seed]";

fn main() {
    if let Err(e) = init_tracing(&TelemetryConfig::from_env()) {
        eprintln!("Failed to initialize tracing: {}", e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    match run(&args) {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => {
            eprintln!("Generation failed ({:?}): {}", e.kind(), e);
            std::process::exit(1);
        }
    }
}

fn run(args: &[String]) -> PisteResult<GenerationOutcome> {
    let json = std::fs::read_to_string(&args[0])
        .map_err(|e| PisteError::invalid_value("formula", format!("cannot read {}: {}", args[0], e)))?;
    let formula = FormulaDefinition::from_json(&json)?;
    let entrant_count: u32 = args[1]
        .parse()
        .map_err(|_| PisteError::invalid_value("entrant-count", format!("not a number: {}", args[1])))?;
    let seed = args
        .get(2)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| PisteError::invalid_value("seed", format!("not a number: {}", raw)))
        })
        .transpose()?;

    let storage = MockStorage::new();
    let tournament = Tournament::new(OrganizationId::now_v7(), "Preview");
    storage.tournament_insert(&tournament)?;
    let competition = Competition::new(tournament.tournament_id, "Preview", Weapon::Epee, "Open")
        .with_status(CompetitionStatus::RegistrationClosed);
    storage.competition_insert(&competition)?;
    for rank in 1..=entrant_count {
        storage.registration_insert(&Registration::new(
            competition.competition_id,
            AthleteId::now_v7(),
            Some(rank),
        ))?;
    }

    let engine = FormulaEngine::new(storage, EngineConfig::from_env()?)?;
    let caller = CallerIdentity::system_admin(UserId::now_v7());
    engine.configure_formula(&caller, competition.competition_id, &formula)?;

    let mut request = GenerateRequest::new(competition.competition_id);
    if let Some(seed) = seed {
        request = request.with_random_seed(seed);
    }
    engine.generate(&caller, &request)
}

fn print_outcome(outcome: &GenerationOutcome) {
    println!(
        "Competition {} is {} (version {})",
        outcome.competition.competition_id, outcome.competition.status, outcome.competition.version
    );

    for poule in &outcome.poules {
        let seats = outcome.seats_of(poule);
        println!("\nPoule {} ({} fencers)", poule.number, seats.len());
        for seat in &seats {
            println!("  {:>2}. {}", seat.position, seat.athlete_id);
        }
        let order: Vec<String> = round_robin_order(seats.len() as u32)
            .into_iter()
            .map(|(a, b)| format!("{}-{}", a, b))
            .collect();
        println!("  bouts: {}", order.join(" "));
    }

    for bracket in &outcome.brackets {
        println!(
            "\n{} (draw of {}, {} byes)",
            bracket.name,
            bracket.draw_size,
            bracket.bye_count()
        );
        for bout in bracket.first_round() {
            println!(
                "  {:>3}: {} vs {}",
                bout.number,
                describe(&bout.top.occupant),
                describe(&bout.bottom.occupant)
            );
        }
    }
}

fn describe(occupant: &SlotOccupant) -> String {
    match occupant {
        SlotOccupant::Competitor { seed, .. } => format!("seed {}", seed),
        SlotOccupant::Bye => "bye".to_string(),
    }
}
