//! Module catalog: authored templates and random instantiation.
//!
//! Templates are plain data loaded from JSON (`data/module_catalog.json`).
//! Instantiating one yields a fresh [`ModuleInstance`] at the origin with all
//! connectors open; no state is shared between instances.

use cryptforge_logic::math::{Aabb, Vec3};
use cryptforge_logic::rng::choose;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{ConnectorPoint, ModuleInstance, ModuleRole};

/// The catalog shipped with the generator.
pub const STANDARD_CATALOG_JSON: &str = include_str!("../../../../data/module_catalog.json");

/// Authored connector: local position and outward forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub name: String,
    pub position: Vec3,
    pub forward: Vec3,
}

/// Authored module: geometry parts plus ordered connectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    pub name: String,
    /// Local-space boxes making up the visual geometry
    #[serde(default)]
    pub parts: Vec<Aabb>,
    #[serde(default)]
    pub connectors: Vec<ConnectorSpec>,
}

impl ModuleTemplate {
    pub fn instantiate(&self, role: ModuleRole) -> ModuleInstance {
        let connectors = self
            .connectors
            .iter()
            .map(|c| ConnectorPoint::new(c.name.clone(), c.position, c.forward))
            .collect();
        ModuleInstance::new(self.name.clone(), role, self.parts.clone(), connectors)
    }
}

/// All templates available to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleCatalog {
    #[serde(default)]
    pub rooms: Vec<ModuleTemplate>,
    #[serde(default)]
    pub hallways: Vec<ModuleTemplate>,
    #[serde(default)]
    pub boss_room: Option<ModuleTemplate>,
    #[serde(default)]
    pub wall_cap: Option<ModuleTemplate>,
}

/// Catalog loading or composition problem.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no room templates")]
    NoRooms,
    #[error("catalog has no hallway templates")]
    NoHallways,
    #[error("catalog has no boss room template")]
    MissingBossRoom,
    #[error("catalog has no wall cap template")]
    MissingWallCap,
    #[error("boss room `{name}` is misconfigured: {reason}")]
    MalformedBossRoom { name: String, reason: String },
}

impl ModuleCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The built-in catalog.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_json(STANDARD_CATALOG_JSON)
    }

    /// Templates drawn from for `role`.
    pub fn templates(&self, role: ModuleRole) -> &[ModuleTemplate] {
        match role {
            ModuleRole::Normal => &self.rooms,
            ModuleRole::Hallway => &self.hallways,
            ModuleRole::Boss => self.boss_room.as_slice(),
        }
    }

    /// Uniformly pick a template for `role` and instantiate it.
    pub fn instantiate<R: Rng + ?Sized>(&self, role: ModuleRole, rng: &mut R) -> Option<ModuleInstance> {
        choose(rng, self.templates(role)).map(|t| t.instantiate(role))
    }

    /// Templates a session cannot run without.
    ///
    /// Boss sessions need the boss room and the wall cap; normal sessions need
    /// rooms, hallways and the wall cap.
    pub fn check_required(&self, boss_mode: bool) -> Vec<CatalogError> {
        let mut errors = Vec::new();
        if boss_mode {
            match &self.boss_room {
                Some(boss) => {
                    if let Err(e) = check_boss_template(boss) {
                        errors.push(e);
                    }
                }
                None => errors.push(CatalogError::MissingBossRoom),
            }
        } else {
            if self.rooms.is_empty() {
                errors.push(CatalogError::NoRooms);
            }
            if self.hallways.is_empty() {
                errors.push(CatalogError::NoHallways);
            }
        }
        if self.wall_cap.is_none() {
            errors.push(CatalogError::MissingWallCap);
        }
        errors
    }
}

/// Boss room composition check: named, with at least one non-degenerate part.
pub fn check_boss_template(template: &ModuleTemplate) -> Result<(), CatalogError> {
    let malformed = |reason: &str| CatalogError::MalformedBossRoom {
        name: template.name.clone(),
        reason: reason.to_string(),
    };
    if template.name.trim().is_empty() {
        return Err(malformed("template has no name"));
    }
    if template.parts.is_empty() {
        return Err(malformed("template has no geometry"));
    }
    if template.parts.iter().any(Aabb::is_degenerate) {
        return Err(malformed("template has a zero-sized part"));
    }
    Ok(())
}
