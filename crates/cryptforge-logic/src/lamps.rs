//! Wall lamp placement for finished layouts.
//!
//! Runs after the layout-ready signal. Lamps go along the four walls of a
//! module's bounds, away from doorways and from each other, and only where
//! the injected [`FloorQuery`] finds solid floor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use thiserror::Error;

use crate::math::{Aabb, Vec3};

/// Lamp tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LampConfig {
    pub min_distance_between_lamps: f32,
    pub wall_offset: f32,
    pub max_lamps_per_room: u32,
    pub max_lamps_per_hallway: u32,
    pub placement_probability: f32,
    pub height_offset: f32,
    /// Bounds scale applied before choosing wall positions.
    pub bounds_scale: f32,
    /// Attempts allowed per requested lamp.
    pub attempts_per_lamp: u32,
    pub floor_samples: u32,
    pub floor_sample_radius: f32,
    pub min_floor_hit_fraction: f32,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            min_distance_between_lamps: 2.0,
            wall_offset: 0.5,
            max_lamps_per_room: 4,
            max_lamps_per_hallway: 2,
            placement_probability: 0.8,
            height_offset: 0.0,
            bounds_scale: 0.9,
            attempts_per_lamp: 20,
            floor_samples: 5,
            floor_sample_radius: 0.5,
            min_floor_hit_fraction: 0.6,
        }
    }
}

/// Lamp configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LampConfigError {
    #[error("placement probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f32),
    #[error("bounds scale {0} is outside (0, 1]")]
    BoundsScaleOutOfRange(f32),
    #[error("min distance between lamps {0} is negative")]
    NegativeSpacing(f32),
    #[error("wall offset {0} is negative")]
    NegativeWallOffset(f32),
    #[error("floor sample radius {0} is negative")]
    NegativeSampleRadius(f32),
    #[error("min floor hit fraction {0} is outside [0, 1]")]
    HitFractionOutOfRange(f32),
}

/// Validate a lamp config, returning all errors found.
pub fn validate_lamp_config(config: &LampConfig) -> Vec<LampConfigError> {
    let mut errors = Vec::new();

    if !(0.0..=1.0).contains(&config.placement_probability) {
        errors.push(LampConfigError::ProbabilityOutOfRange(
            config.placement_probability,
        ));
    }
    if !(config.bounds_scale > 0.0 && config.bounds_scale <= 1.0) {
        errors.push(LampConfigError::BoundsScaleOutOfRange(config.bounds_scale));
    }
    if !(config.min_distance_between_lamps >= 0.0) {
        errors.push(LampConfigError::NegativeSpacing(
            config.min_distance_between_lamps,
        ));
    }
    if !(config.wall_offset >= 0.0) {
        errors.push(LampConfigError::NegativeWallOffset(config.wall_offset));
    }
    if !(config.floor_sample_radius >= 0.0) {
        errors.push(LampConfigError::NegativeSampleRadius(
            config.floor_sample_radius,
        ));
    }
    if !(0.0..=1.0).contains(&config.min_floor_hit_fraction) {
        errors.push(LampConfigError::HitFractionOutOfRange(
            config.min_floor_hit_fraction,
        ));
    }

    errors
}

/// Answers "is there floor under (x, z), and at what height?".
pub trait FloorQuery {
    fn floor_height(&self, x: f32, z: f32) -> Option<f32>;
}

/// A flat floor covering a set of boxes, at each box's `min.y`.
#[derive(Debug, Clone, Default)]
pub struct BoxFloor {
    pub areas: Vec<Aabb>,
}

impl FloorQuery for BoxFloor {
    fn floor_height(&self, x: f32, z: f32) -> Option<f32> {
        self.areas
            .iter()
            .filter(|b| x >= b.min.x && x <= b.max.x && z >= b.min.z && z <= b.max.z)
            .map(|b| b.min.y)
            .reduce(f32::max)
    }
}

/// What the planner needs to know about one module.
#[derive(Debug, Clone)]
pub struct LampSite {
    /// World bounds of the module geometry (unshrunk).
    pub bounds: Aabb,
    /// World positions of the module's connectors.
    pub doorways: Vec<Vec3>,
    pub is_hallway: bool,
}

/// A planned lamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LampPlacement {
    pub position: Vec3,
    /// Direction the lamp faces (away from its wall, into the module).
    pub facing: Vec3,
}

/// Plan lamps for one module.
pub fn plan_lamps<R: Rng + ?Sized>(
    site: &LampSite,
    config: &LampConfig,
    floor: &dyn FloorQuery,
    rng: &mut R,
) -> Vec<LampPlacement> {
    let max_lamps = if site.is_hallway {
        config.max_lamps_per_hallway
    } else {
        config.max_lamps_per_room
    };
    if max_lamps == 0 {
        return Vec::new();
    }

    let bounds = site.bounds.scaled(config.bounds_scale);
    let center = bounds.center();
    let ext = bounds.extents();
    let off = config.wall_offset;

    let wanted = rng.gen_range(1..=max_lamps) as usize;
    let max_attempts = (wanted as u32).saturating_mul(config.attempts_per_lamp);
    let mut placed: Vec<LampPlacement> = Vec::with_capacity(wanted);
    let mut attempts = 0;

    while placed.len() < wanted && attempts < max_attempts {
        attempts += 1;

        if rng.gen::<f32>() > config.placement_probability {
            continue;
        }

        let along_x = span(rng, ext.x - off);
        let along_z = span(rng, ext.z - off);
        let (offset, facing) = match rng.gen_range(0..4) {
            0 => (Vec3::new(along_x, 0.0, ext.z - off), Vec3::new(0.0, 0.0, -1.0)),
            1 => (Vec3::new(ext.x - off, 0.0, along_z), Vec3::new(-1.0, 0.0, 0.0)),
            2 => (Vec3::new(along_x, 0.0, -ext.z + off), Vec3::new(0.0, 0.0, 1.0)),
            _ => (Vec3::new(-ext.x + off, 0.0, along_z), Vec3::new(1.0, 0.0, 0.0)),
        };
        let candidate = Vec3::new(center.x + offset.x, center.y, center.z + offset.z);

        if !clear_of_others(candidate, &placed, &site.doorways, config) {
            continue;
        }
        let Some(floor_y) = floor_under(candidate, floor, config) else {
            continue;
        };

        placed.push(LampPlacement {
            position: Vec3::new(candidate.x, floor_y + config.height_offset, candidate.z),
            facing,
        });
    }

    placed
}

/// Uniform in `[-half, half)`, collapsing to 0 when the wall is too short.
fn span<R: Rng + ?Sized>(rng: &mut R, half: f32) -> f32 {
    if half > 0.0 {
        rng.gen_range(-half..half)
    } else {
        0.0
    }
}

fn clear_of_others(
    candidate: Vec3,
    placed: &[LampPlacement],
    doorways: &[Vec3],
    config: &LampConfig,
) -> bool {
    let min = config.min_distance_between_lamps;
    if placed.iter().any(|l| l.position.distance(&candidate) < min) {
        return false;
    }
    // Doorway spacing ignores height.
    let flat = candidate.flatten();
    !doorways
        .iter()
        .any(|d| d.flatten().distance(&flat) < min * 1.5)
}

/// Center must hit and enough of the sample ring must hit.
fn floor_under(candidate: Vec3, floor: &dyn FloorQuery, config: &LampConfig) -> Option<f32> {
    let center_y = floor.floor_height(candidate.x, candidate.z)?;
    if config.floor_samples == 0 {
        return Some(center_y);
    }
    let hits = (0..config.floor_samples)
        .filter(|i| {
            let angle = *i as f32 * (TAU / config.floor_samples as f32);
            let x = candidate.x + angle.cos() * config.floor_sample_radius;
            let z = candidate.z + angle.sin() * config.floor_sample_radius;
            floor.floor_height(x, z).is_some()
        })
        .count();
    let fraction = hits as f32 / config.floor_samples as f32;
    (fraction >= config.min_floor_hit_fraction).then_some(center_y)
}
