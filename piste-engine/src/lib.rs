//! PISTE Engine - Formula Generation and Progression
//!
//! Turns a competition's formula and registrations into pools and
//! elimination draws:
//!
//! - [`poule`]: serpentine distribution of entrants into pools
//! - [`bracket`]: draw sizing, byes and seed placement
//! - [`FormulaEngine`]: guarded, all-or-nothing persistence of the results
//!   and the competition lifecycle

pub mod auth;
pub mod bracket;
mod engine;
pub mod poule;
mod request;
pub mod rng;
pub mod telemetry;

pub use auth::{Authorizer, CallerIdentity, RoleAuthorizer};
pub use bracket::{compose_draw, draw_size_for, seeding_order, ComposedDraw, DrawSpec};
pub use engine::FormulaEngine;
pub use poule::{compose_poules, round_robin_order, snake_pool_index, ComposedPoule};
pub use request::{
    ConfiguredFormula, ConfiguredPhase, GenerateRequest, GenerationOutcome, PhaseEntrants,
    PhaseStatusUpdate,
};
pub use rng::{DeterministicRng, RandomSource, SystemRng};
pub use telemetry::{init_tracing, TelemetryConfig};
