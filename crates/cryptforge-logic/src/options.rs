//! Dungeon choices offered between runs.
//!
//! A [`DungeonOption`] is authored data: a name, the reward for clearing it,
//! and a room-count range. Picking one produces a [`DungeonRun`] whose room
//! count becomes the target handed to the session controller.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::DungeonProgress;

/// Number of choices shown to the player.
pub const OFFER_SLOTS: usize = 3;

/// Stat a dungeon reward improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    PlayerHealth,
    PlayerArmour,
    PlayerMovementSpeed,
    PlayerCooldownReduction,
    GlobalDamage,
    GlobalAttackSpeed,
    LifeRegenAdd,
    LifeRegenRate,
}

/// Reward granted for clearing a dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub name: String,
    pub kind: UpgradeKind,
    pub value: f32,
}

/// An authored dungeon choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonOption {
    pub name: String,
    pub upgrade: Upgrade,
    pub room_count_min: u32,
    pub room_count_max: u32,
    #[serde(default)]
    pub is_boss: bool,
}

/// A chosen dungeon with its rolled room count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonRun {
    pub dungeon_name: String,
    pub upgrade: Upgrade,
    pub room_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("boss dungeon is available but no boss option is configured")]
    NoBossOption,
    #[error("no dungeon options are configured")]
    NoOptions,
    #[error("option `{name}` has room range {min}..={max}")]
    InvalidRoomRange { name: String, min: u32, max: u32 },
}

/// Pick the option indices to show, one per slot.
///
/// With the boss dungeon open every slot shows the boss option. Otherwise up
/// to [`OFFER_SLOTS`] distinct regular options are drawn without replacement.
pub fn offer_dungeons<R: Rng + ?Sized>(
    options: &[DungeonOption],
    progress: &DungeonProgress,
    rng: &mut R,
) -> Result<Vec<usize>, OptionError> {
    if progress.is_boss_dungeon_available() {
        let boss = options
            .iter()
            .position(|o| o.is_boss)
            .ok_or(OptionError::NoBossOption)?;
        return Ok(vec![boss; OFFER_SLOTS]);
    }

    let mut available: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.is_boss)
        .map(|(i, _)| i)
        .collect();
    if available.is_empty() {
        return Err(OptionError::NoOptions);
    }
    if available.len() <= OFFER_SLOTS {
        return Ok(available);
    }

    let mut picked = Vec::with_capacity(OFFER_SLOTS);
    for _ in 0..OFFER_SLOTS {
        let i = rng.gen_range(0..available.len());
        picked.push(available.remove(i));
    }
    Ok(picked)
}

/// Roll a concrete run for `option`; room count is uniform in the inclusive range.
pub fn choose_dungeon<R: Rng + ?Sized>(
    option: &DungeonOption,
    rng: &mut R,
) -> Result<DungeonRun, OptionError> {
    if option.room_count_min == 0 || option.room_count_min > option.room_count_max {
        return Err(OptionError::InvalidRoomRange {
            name: option.name.clone(),
            min: option.room_count_min,
            max: option.room_count_max,
        });
    }
    Ok(DungeonRun {
        dungeon_name: option.name.clone(),
        upgrade: option.upgrade.clone(),
        room_count: rng.gen_range(option.room_count_min..=option.room_count_max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn option(name: &str, boss: bool) -> DungeonOption {
        DungeonOption {
            name: name.into(),
            upgrade: Upgrade {
                name: format!("{name} reward"),
                kind: UpgradeKind::GlobalDamage,
                value: 0.1,
            },
            room_count_min: 8,
            room_count_max: 14,
            is_boss: boss,
        }
    }

    #[test]
    fn offers_three_distinct_regular_options() {
        let options: Vec<_> = (0..6)
            .map(|i| option(&format!("D{i}"), i == 2))
            .collect();
        let progress = DungeonProgress::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let offered = offer_dungeons(&options, &progress, &mut rng).unwrap();
            assert_eq!(offered.len(), OFFER_SLOTS);
            let unique: HashSet<_> = offered.iter().collect();
            assert_eq!(unique.len(), OFFER_SLOTS);
            assert!(!offered.contains(&2), "boss option offered early");
        }
    }

    #[test]
    fn few_options_are_all_offered() {
        let options = vec![option("A", false), option("B", false)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let offered = offer_dungeons(&options, &DungeonProgress::default(), &mut rng).unwrap();
        assert_eq!(offered, vec![0, 1]);
    }

    #[test]
    fn boss_fills_every_slot_when_available() {
        let options = vec![option("A", false), option("Throne", true)];
        let mut progress = DungeonProgress::new(1);
        progress.complete_dungeon(None);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let offered = offer_dungeons(&options, &progress, &mut rng).unwrap();
        assert_eq!(offered, vec![1, 1, 1]);
    }

    #[test]
    fn missing_boss_option_is_an_error() {
        let options = vec![option("A", false)];
        let mut progress = DungeonProgress::new(1);
        progress.complete_dungeon(None);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            offer_dungeons(&options, &progress, &mut rng),
            Err(OptionError::NoBossOption)
        );
    }

    #[test]
    fn room_count_within_range() {
        let opt = option("A", false);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let run = choose_dungeon(&opt, &mut rng).unwrap();
            assert!((8..=14).contains(&run.room_count));
            seen.insert(run.room_count);
        }
        assert!(seen.contains(&8) && seen.contains(&14), "range ends reachable");
    }

    #[test]
    fn inverted_range_rejected() {
        let mut opt = option("A", false);
        opt.room_count_min = 9;
        opt.room_count_max = 3;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(matches!(
            choose_dungeon(&opt, &mut rng),
            Err(OptionError::InvalidRoomRange { .. })
        ));
    }
}
