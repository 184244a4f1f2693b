//! Elimination draw composition.
//!
//! The draw size is the smallest power of two holding every competitor and
//! the configured size. Empty slots become byes. Placement depends on the
//! seeding method:
//!
//! - RANKING and SNAKE use the conventional seeding table, so the top seeds
//!   are the ones facing byes.
//! - RANDOM shuffles competitors and byes across all slots.
//! - MANUAL takes the caller's slot order verbatim after checking it.

use crate::poule::order_by_seed;
use crate::rng::RandomSource;
use piste_core::{AthleteId, DrawSlot, Entrant, SeedingMethod, SlotOccupant, ValidationError};
use std::collections::{HashMap, HashSet};

/// Parameters of one draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawSpec<'a> {
    /// Configured competitor capacity.
    pub size: u32,
    pub seeding_method: SeedingMethod,
    /// Slot order for MANUAL draws, `None` marking a bye.
    pub manual_placement: Option<&'a [Option<AthleteId>]>,
    /// Largest draw the engine accepts.
    pub max_draw_size: u32,
}

/// Draw before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDraw {
    pub draw_size: u32,
    pub slots: Vec<DrawSlot>,
}

impl ComposedDraw {
    pub fn bye_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupant.is_bye()).count()
    }
}

/// Smallest power of two at least `max(competitor_count, configured_size, 2)`.
pub fn draw_size_for(competitor_count: usize, configured_size: u32) -> usize {
    competitor_count
        .max(configured_size as usize)
        .max(2)
        .next_power_of_two()
}

/// Seed number expected in each slot of a draw, top to bottom.
///
/// Seeds 1 and 2 sit in opposite halves, 1-4 in different quarters, and
/// every first-round pairing adds up to `draw_size + 1`.
pub fn seeding_order(draw_size: usize) -> Vec<u32> {
    let mut order = vec![1u32];
    while order.len() < draw_size {
        let mirror = 2 * order.len() as u32 + 1;
        order = order.iter().flat_map(|&seed| [seed, mirror - seed]).collect();
    }
    order
}

/// Place `competitors` into a draw.
pub fn compose_draw(
    competitors: &[Entrant],
    spec: &DrawSpec<'_>,
    rng: &mut dyn RandomSource,
) -> Result<ComposedDraw, ValidationError> {
    if competitors.is_empty() {
        return Err(ValidationError::InsufficientEntrants {
            required: 1,
            available: 0,
        });
    }

    let draw_size = draw_size_for(competitors.len(), spec.size);
    if draw_size > spec.max_draw_size as usize {
        return Err(ValidationError::InvalidValue {
            field: "draw_size".to_string(),
            reason: format!(
                "{} competitors need a draw of {}, above the maximum of {}",
                competitors.len(),
                draw_size,
                spec.max_draw_size
            ),
        });
    }

    let ranked = order_by_seed(competitors);
    let mut seen = HashSet::new();
    if let Some(duplicate) = ranked.iter().find(|e| !seen.insert(e.athlete_id)) {
        return Err(ValidationError::ConstraintViolation {
            constraint: "unique_competitor".to_string(),
            reason: format!("athlete {} appears more than once", duplicate.athlete_id),
        });
    }

    let occupants = match spec.seeding_method {
        SeedingMethod::Ranking | SeedingMethod::Snake => place_by_table(&ranked, draw_size),
        SeedingMethod::Random => place_randomly(&ranked, draw_size, rng),
        SeedingMethod::Manual => {
            let placement = spec.manual_placement.ok_or_else(|| {
                ValidationError::MalformedPlacement {
                    reason: "MANUAL seeding requires a slot placement".to_string(),
                }
            })?;
            place_manually(&ranked, draw_size, placement)?
        }
    };

    Ok(ComposedDraw {
        draw_size: draw_size as u32,
        slots: (1u32..)
            .zip(occupants)
            .map(|(position, occupant)| DrawSlot { position, occupant })
            .collect(),
    })
}

fn competitor(ranked: &[Entrant], rank: usize) -> SlotOccupant {
    SlotOccupant::Competitor {
        athlete_id: ranked[rank].athlete_id,
        seed: rank as u32 + 1,
    }
}

fn place_by_table(ranked: &[Entrant], draw_size: usize) -> Vec<SlotOccupant> {
    seeding_order(draw_size)
        .into_iter()
        .map(|seed| {
            let rank = seed as usize - 1;
            if rank < ranked.len() {
                competitor(ranked, rank)
            } else {
                SlotOccupant::Bye
            }
        })
        .collect()
}

fn place_randomly(
    ranked: &[Entrant],
    draw_size: usize,
    rng: &mut dyn RandomSource,
) -> Vec<SlotOccupant> {
    let mut occupants = vec![SlotOccupant::Bye; draw_size];
    for (rank, slot) in rng.permutation(draw_size).into_iter().take(ranked.len()).enumerate() {
        occupants[slot] = competitor(ranked, rank);
    }
    occupants
}

fn place_manually(
    ranked: &[Entrant],
    draw_size: usize,
    placement: &[Option<AthleteId>],
) -> Result<Vec<SlotOccupant>, ValidationError> {
    if placement.len() != draw_size {
        return Err(ValidationError::MalformedPlacement {
            reason: format!(
                "placement has {} slots, the draw has {}",
                placement.len(),
                draw_size
            ),
        });
    }

    let seeds: HashMap<AthleteId, u32> = ranked
        .iter()
        .zip(1u32..)
        .map(|(entrant, seed)| (entrant.athlete_id, seed))
        .collect();
    let mut placed = HashSet::new();
    let mut occupants = Vec::with_capacity(draw_size);

    for slot in placement {
        let occupant = match slot {
            None => SlotOccupant::Bye,
            Some(athlete_id) => {
                let seed = *seeds.get(athlete_id).ok_or_else(|| {
                    ValidationError::MalformedPlacement {
                        reason: format!("athlete {} is not a competitor in this draw", athlete_id),
                    }
                })?;
                if !placed.insert(*athlete_id) {
                    return Err(ValidationError::MalformedPlacement {
                        reason: format!("athlete {} is placed twice", athlete_id),
                    });
                }
                SlotOccupant::Competitor {
                    athlete_id: *athlete_id,
                    seed,
                }
            }
        };
        occupants.push(occupant);
    }

    if placed.len() != ranked.len() {
        let missing = ranked
            .iter()
            .filter(|e| !placed.contains(&e.athlete_id))
            .count();
        return Err(ValidationError::MalformedPlacement {
            reason: format!("{} competitors are missing from the placement", missing),
        });
    }
    Ok(occupants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::DeterministicRng;

    fn field(count: u32) -> Vec<Entrant> {
        (1..=count)
            .map(|seed| Entrant::seeded(AthleteId::now_v7(), seed))
            .collect()
    }

    fn spec(size: u32, seeding_method: SeedingMethod) -> DrawSpec<'static> {
        DrawSpec {
            size,
            seeding_method,
            manual_placement: None,
            max_draw_size: 256,
        }
    }

    #[test]
    fn test_seeding_order_table() {
        assert_eq!(seeding_order(2), vec![1, 2]);
        assert_eq!(seeding_order(4), vec![1, 4, 2, 3]);
        assert_eq!(seeding_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn test_draw_size_for() {
        assert_eq!(draw_size_for(12, 16), 16);
        assert_eq!(draw_size_for(17, 16), 32);
        assert_eq!(draw_size_for(5, 2), 8);
        assert_eq!(draw_size_for(1, 0), 2);
    }

    #[test]
    fn test_twelve_in_sixteen_byes_go_to_top_seeds() {
        let competitors = field(12);
        let draw = compose_draw(
            &competitors,
            &spec(16, SeedingMethod::Ranking),
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap();

        assert_eq!(draw.draw_size, 16);
        assert_eq!(draw.bye_count(), 4);
        for pair in draw.slots.chunks_exact(2) {
            if let Some(bye_opponent) = match (pair[0].occupant, pair[1].occupant) {
                (SlotOccupant::Competitor { seed, .. }, SlotOccupant::Bye)
                | (SlotOccupant::Bye, SlotOccupant::Competitor { seed, .. }) => Some(seed),
                _ => None,
            } {
                assert!(bye_opponent <= 4, "seed {} got a bye", bye_opponent);
            }
        }
    }

    #[test]
    fn test_random_draw_is_reproducible_with_seed() {
        let competitors = field(11);
        let a = compose_draw(
            &competitors,
            &spec(8, SeedingMethod::Random),
            &mut DeterministicRng::from_seed(5),
        )
        .unwrap();
        let b = compose_draw(
            &competitors,
            &spec(8, SeedingMethod::Random),
            &mut DeterministicRng::from_seed(5),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.draw_size, 16);
        assert_eq!(a.bye_count(), 5);
    }

    #[test]
    fn test_manual_placement_verbatim() {
        let competitors = field(3);
        let placement = vec![
            Some(competitors[2].athlete_id),
            Some(competitors[0].athlete_id),
            None,
            Some(competitors[1].athlete_id),
        ];
        let draw = compose_draw(
            &competitors,
            &DrawSpec {
                manual_placement: Some(&placement),
                ..spec(4, SeedingMethod::Manual)
            },
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap();
        let order: Vec<Option<AthleteId>> =
            draw.slots.iter().map(|s| s.occupant.athlete_id()).collect();
        assert_eq!(order, placement);
        assert_eq!(
            draw.slots[0].occupant,
            SlotOccupant::Competitor {
                athlete_id: competitors[2].athlete_id,
                seed: 3
            }
        );
    }

    #[test]
    fn test_manual_without_placement_rejected() {
        let err = compose_draw(
            &field(4),
            &spec(4, SeedingMethod::Manual),
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPlacement { .. }));
    }

    #[test]
    fn test_manual_wrong_slot_count_rejected() {
        let competitors = field(2);
        let placement = vec![Some(competitors[0].athlete_id), Some(competitors[1].athlete_id), None];
        let err = compose_draw(
            &competitors,
            &DrawSpec {
                manual_placement: Some(&placement),
                ..spec(2, SeedingMethod::Manual)
            },
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPlacement { .. }));
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = compose_draw(
            &[],
            &spec(8, SeedingMethod::Ranking),
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InsufficientEntrants { .. }));
    }

    #[test]
    fn test_draw_above_maximum_rejected() {
        let err = compose_draw(
            &field(9),
            &DrawSpec {
                max_draw_size: 8,
                ..spec(8, SeedingMethod::Ranking)
            },
            &mut DeterministicRng::from_seed(0),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }
}
