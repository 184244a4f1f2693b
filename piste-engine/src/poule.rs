//! Pool composition.
//!
//! Entrants are ranked by seed and dealt into pools in serpentine order:
//! seeds `0..P` go left to right, the next `P` right to left, and so on.
//! Pool sizes never differ by more than one.

use piste_core::{AthleteId, Entrant, PoulePhaseConfig, ValidationError};
use std::collections::HashSet;

/// One pool before it is persisted. Seat `n` is `athletes[n - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPoule {
    /// 1-based pool number.
    pub number: u32,
    pub athletes: Vec<AthleteId>,
}

impl ComposedPoule {
    pub fn size(&self) -> usize {
        self.athletes.len()
    }

    /// Athletes with their 1-based seat positions.
    pub fn seats(&self) -> impl Iterator<Item = (u32, AthleteId)> + '_ {
        (1u32..).zip(self.athletes.iter().copied())
    }
}

/// Stable ranking: seeded entrants by ascending seed, then unseeded entrants
/// in their original order.
pub fn order_by_seed(entrants: &[Entrant]) -> Vec<Entrant> {
    let mut ranked = entrants.to_vec();
    ranked.sort_by_key(|e| (e.seed.is_none(), e.seed));
    ranked
}

/// Number of pools for `entrant_count` entrants.
///
/// An explicit `pool_count` wins; otherwise `ceil(entrants / target)`.
/// Pools from an explicit count are checked by [`check_pool_sizes`].
pub fn pool_count_for(
    entrant_count: usize,
    config: &PoulePhaseConfig,
) -> Result<usize, ValidationError> {
    let count = match config.pool_count {
        Some(explicit) => explicit as usize,
        None => {
            if config.target_pool_size == 0 {
                return Err(ValidationError::InvalidValue {
                    field: "target_pool_size".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            entrant_count.div_ceil(config.target_pool_size as usize)
        }
    };
    if count == 0 {
        return Err(ValidationError::InsufficientEntrants {
            required: 1,
            available: entrant_count,
        });
    }
    Ok(count)
}

/// Pool index (0-based) of the entrant ranked `rank` (0-based) among `pool_count` pools.
pub fn snake_pool_index(rank: usize, pool_count: usize) -> usize {
    let row = rank / pool_count;
    let column = rank % pool_count;
    if row % 2 == 0 {
        column
    } else {
        pool_count - 1 - column
    }
}

/// Deal entrants into `pool_count` pools using serpentine seeding.
pub fn compose_poules(
    entrants: &[Entrant],
    pool_count: usize,
) -> Result<Vec<ComposedPoule>, ValidationError> {
    if pool_count == 0 {
        return Err(ValidationError::InvalidValue {
            field: "pool_count".to_string(),
            reason: "at least one pool is required".to_string(),
        });
    }
    if entrants.len() < pool_count {
        return Err(ValidationError::InsufficientEntrants {
            required: pool_count,
            available: entrants.len(),
        });
    }
    ensure_unique(entrants.iter().map(|e| e.athlete_id))?;

    let mut poules: Vec<ComposedPoule> = (1..=pool_count as u32)
        .map(|number| ComposedPoule {
            number,
            athletes: Vec::new(),
        })
        .collect();

    for (rank, entrant) in order_by_seed(entrants).into_iter().enumerate() {
        poules[snake_pool_index(rank, pool_count)]
            .athletes
            .push(entrant.athlete_id);
    }
    Ok(poules)
}

/// Accept pools computed by the caller after checking their shape.
///
/// Every pool must be non-empty, no athlete may sit twice and every athlete
/// must be registered.
pub fn from_precomputed(
    pools: &[Vec<AthleteId>],
    registered: &HashSet<AthleteId>,
) -> Result<Vec<ComposedPoule>, ValidationError> {
    if pools.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "poules".to_string(),
        });
    }
    for (index, pool) in pools.iter().enumerate() {
        if pool.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("poules[{index}]"),
                reason: "a pool needs at least one athlete".to_string(),
            });
        }
        ensure_registered(&format!("poules[{index}]"), pool.iter().copied(), registered)?;
    }
    ensure_unique(pools.iter().flatten().copied())?;

    Ok(pools
        .iter()
        .zip(1u32..)
        .map(|(athletes, number)| ComposedPoule {
            number,
            athletes: athletes.clone(),
        })
        .collect())
}

/// Reject athletes outside the competition's registrations.
pub fn ensure_registered(
    field: &str,
    athletes: impl IntoIterator<Item = AthleteId>,
    registered: &HashSet<AthleteId>,
) -> Result<(), ValidationError> {
    match athletes.into_iter().find(|a| !registered.contains(a)) {
        Some(stranger) => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("athlete {} is not registered in this competition", stranger),
        }),
        None => Ok(()),
    }
}

/// Every pool must hold between `min_size` and `max_size` fencers.
///
/// Only needed for an explicit pool count; sizes derived from the target
/// never exceed the target.
pub fn check_pool_sizes(
    pools: &[ComposedPoule],
    min_size: u32,
    max_size: u32,
) -> Result<(), ValidationError> {
    let allowed = min_size as usize..=max_size as usize;
    match pools.iter().find(|p| !allowed.contains(&p.size())) {
        Some(pool) => Err(ValidationError::InvalidValue {
            field: "pool_count".to_string(),
            reason: format!(
                "pool {} would seat {} fencers, outside the allowed range {}..={}",
                pool.number,
                pool.size(),
                min_size,
                max_size
            ),
        }),
        None => Ok(()),
    }
}

/// Bout order inside a pool of `size` seats, by seat number.
///
/// Circle method: seat 1 stays fixed while the others rotate, so every pair
/// meets exactly once and nobody fences two rounds ahead of the rest. With
/// an odd size one seat rests each round.
pub fn round_robin_order(size: u32) -> Vec<(u32, u32)> {
    if size < 2 {
        return Vec::new();
    }
    let seats = if size % 2 == 0 { size } else { size + 1 };
    let mut ring: Vec<u32> = (2..=seats).collect();
    let mut bouts = Vec::with_capacity((size * (size - 1) / 2) as usize);

    for _ in 1..seats {
        let lineup: Vec<u32> = std::iter::once(1).chain(ring.iter().copied()).collect();
        for i in 0..lineup.len() / 2 {
            let (a, b) = (lineup[i], lineup[lineup.len() - 1 - i]);
            if a <= size && b <= size {
                bouts.push((a.min(b), a.max(b)));
            }
        }
        ring.rotate_right(1);
    }
    bouts
}

fn ensure_unique(athletes: impl Iterator<Item = AthleteId>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for athlete in athletes {
        if !seen.insert(athlete) {
            return Err(ValidationError::ConstraintViolation {
                constraint: "unique_entrant".to_string(),
                reason: format!("athlete {} appears more than once", athlete),
            });
        }
    }
    Ok(())
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every pair of seats meets exactly once.
        #[test]
        fn prop_round_robin_covers_every_pair(size in 2u32..12) {
            let bouts = round_robin_order(size);
            let unique: HashSet<(u32, u32)> = bouts.iter().copied().collect();
            prop_assert_eq!(bouts.len() as u32, size * (size - 1) / 2);
            prop_assert_eq!(unique.len(), bouts.len());
            for (a, b) in bouts {
                prop_assert!(a < b && b <= size);
            }
        }
    }
}
