//! Layout snapshots: engine-free copies of finished layouts.
//!
//! Uses bincode for compact saves and serde_json for inspection dumps.
//! Entities are replaced by dense ids (placement order, rooms first), so a
//! snapshot can be validated or diffed without the arena.

use cryptforge_logic::config::GenerationConfig;
use cryptforge_logic::graph::ConnectorGraph;
use cryptforge_logic::math::{Aabb, Pose, Vec3};
use cryptforge_logic::validation::{
    connector_links, validate_all, ConnectorState, LayoutExpectations, ModuleFootprint,
    ValidationError,
};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::ModuleRole;
use crate::layout::DungeonLayout;

/// Version number for snapshot format (increment when format changes)
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub seed: Option<u64>,
    pub target_room_count: u32,
    pub attempts: u32,
    pub start: Option<u32>,
    pub modules: Vec<ModuleRecord>,
    pub caps: Vec<CapRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: u32,
    pub template: String,
    pub role: ModuleRole,
    pub pose: Pose,
    pub bounds: Aabb,
    pub geometry: Aabb,
    pub connectors: Vec<ConnectorRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub name: String,
    pub position: Vec3,
    pub forward: Vec3,
    pub connected: bool,
    pub capped: bool,
    /// (module id, connector index)
    pub peer: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapRecord {
    pub module: u32,
    pub connector: u32,
    pub template: String,
    pub position: Vec3,
    pub forward: Vec3,
}

/// Errors that can occur while capturing, saving or loading snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("module {0:?} is missing a component")]
    MissingComponent(Entity),
    #[error("entity {0:?} is not a placed module")]
    UnknownModule(Entity),
}

impl LayoutSnapshot {
    /// Copy a layout out of its arena.
    pub fn capture(layout: &DungeonLayout, seed: Option<u64>) -> Result<Self, SnapshotError> {
        let ids: HashMap<Entity, u32> = layout
            .modules()
            .enumerate()
            .map(|(i, e)| (e, i as u32))
            .collect();
        let id_of = |e: Entity| ids.get(&e).copied().ok_or(SnapshotError::UnknownModule(e));

        let mut modules = Vec::with_capacity(ids.len());
        for entity in layout.modules() {
            let module = layout
                .module(entity)
                .ok_or(SnapshotError::MissingComponent(entity))?;
            let footprint = layout
                .footprint(entity)
                .ok_or(SnapshotError::MissingComponent(entity))?;
            let connectors = layout
                .connectors(entity)
                .ok_or(SnapshotError::MissingComponent(entity))?;

            let mut records = Vec::with_capacity(connectors.len());
            for c in connectors.iter() {
                let peer = match c.peer {
                    Some(p) => Some((id_of(p.module)?, p.index as u32)),
                    None => None,
                };
                records.push(ConnectorRecord {
                    name: c.name.clone(),
                    position: c.position,
                    forward: c.forward,
                    connected: c.connected,
                    capped: c.is_capped(),
                    peer,
                });
            }

            modules.push(ModuleRecord {
                id: id_of(entity)?,
                template: module.template.clone(),
                role: module.role,
                pose: module.pose,
                bounds: footprint.bounds,
                geometry: footprint.geometry,
                connectors: records,
            });
        }

        let mut caps = Vec::with_capacity(layout.caps().len());
        for &entity in layout.caps() {
            let cap = layout
                .cap(entity)
                .ok_or(SnapshotError::MissingComponent(entity))?;
            caps.push(CapRecord {
                module: id_of(cap.owner.module)?,
                connector: cap.owner.index as u32,
                template: cap.template.clone(),
                position: cap.position,
                forward: cap.forward,
            });
        }

        Ok(Self {
            version: SNAPSHOT_VERSION,
            seed,
            target_room_count: layout.target_room_count(),
            attempts: layout.attempts,
            start: layout.start().map(id_of).transpose()?,
            modules,
            caps,
        })
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize_from(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn count_role(&self, role: ModuleRole) -> usize {
        self.modules.iter().filter(|m| m.role == role).count()
    }

    pub fn footprints(&self) -> Vec<ModuleFootprint> {
        self.modules
            .iter()
            .map(|m| ModuleFootprint {
                id: m.id,
                role: m.role.to_string(),
                bounds: m.bounds,
                is_start: self.start == Some(m.id),
            })
            .collect()
    }

    pub fn connector_states(&self) -> Vec<ConnectorState> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.connectors.iter().enumerate().map(move |(i, c)| ConnectorState {
                    module: m.id,
                    index: i as u32,
                    position: c.position,
                    connected: c.connected,
                    capped: c.capped,
                    peer: c.peer,
                })
            })
            .collect()
    }

    /// Module adjacency through connected connector pairs.
    pub fn graph(&self) -> ConnectorGraph {
        ConnectorGraph::from_links(
            self.modules.iter().map(|m| m.id),
            &connector_links(&self.connector_states()),
        )
    }

    /// Hops from the start to the nearest module of `role`.
    pub fn depth_of(&self, role: ModuleRole) -> Option<u32> {
        let dist = self.graph().distances_from(self.start?);
        self.modules
            .iter()
            .filter(|m| m.role == role)
            .filter_map(|m| dist.get(&m.id).copied())
            .min()
    }

    pub fn validate(&self, config: &GenerationConfig, boss_mode: bool) -> Vec<ValidationError> {
        let expect = LayoutExpectations {
            overlap_margin: config.overlap_margin,
            target_room_count: self.target_room_count,
            acceptance_ratio: config.acceptance_ratio,
            link_tolerance: config.loop_closure_distance,
            boss_mode,
        };
        validate_all(&self.footprints(), &self.connector_states(), &expect)
    }
}

/// Capture `layout` and run every layout check against it.
pub fn validate_layout(
    layout: &DungeonLayout,
    config: &GenerationConfig,
    boss_mode: bool,
) -> Result<Vec<ValidationError>, SnapshotError> {
    Ok(LayoutSnapshot::capture(layout, None)?.validate(config, boss_mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ModuleCatalog;
    use crate::session::{DungeonSession, ImmediateBaker, SessionRequest};

    fn finished(seed: u64, request: SessionRequest) -> DungeonSession {
        let config = GenerationConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let mut session =
            DungeonSession::new(ModuleCatalog::standard().unwrap(), config, ImmediateBaker::default());
        session.start(&request).unwrap();
        session
    }

    #[test]
    fn capture_mirrors_layout() {
        let session = finished(12, SessionRequest::normal(10));
        let layout = session.layout().unwrap();
        let snap = LayoutSnapshot::capture(layout, session.seed()).unwrap();
        assert_eq!(snap.module_count(), layout.module_count());
        assert_eq!(snap.caps.len(), layout.caps().len());
        assert_eq!(snap.start, Some(0));
        assert_eq!(snap.seed, Some(12));
        assert_eq!(snap.count_role(ModuleRole::Hallway), layout.hallways().len());
    }

    #[test]
    fn save_load_preserves_snapshot() {
        let session = finished(13, SessionRequest::normal(8));
        let snap = LayoutSnapshot::capture(session.layout().unwrap(), session.seed()).unwrap();
        let mut buf = Vec::new();
        snap.save(&mut buf).unwrap();
        let loaded = LayoutSnapshot::load(buf.as_slice()).unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn version_mismatch_rejected() {
        let session = finished(14, SessionRequest::boss());
        let mut snap = LayoutSnapshot::capture(session.layout().unwrap(), None).unwrap();
        snap.version = 99;
        let mut buf = Vec::new();
        snap.save(&mut buf).unwrap();
        assert!(matches!(
            LayoutSnapshot::load(buf.as_slice()),
            Err(SnapshotError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[test]
    fn json_dump_names_templates() {
        let session = finished(15, SessionRequest::boss());
        let json = LayoutSnapshot::capture(session.layout().unwrap(), None)
            .unwrap()
            .to_json()
            .unwrap();
        assert!(json.contains("boss_chamber"));
        assert!(json.contains("\"Boss\""));
    }

    #[test]
    fn successful_layouts_validate_clean() {
        let session = finished(16, SessionRequest::normal(12));
        let errors = validate_layout(session.layout().unwrap(), session.config(), false).unwrap();
        assert!(errors.is_empty(), "{errors:?}");

        let boss = finished(16, SessionRequest::boss());
        let errors = validate_layout(boss.layout().unwrap(), boss.config(), true).unwrap();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn depth_of_start_role_is_zero() {
        let session = finished(17, SessionRequest::normal(10));
        let snap = LayoutSnapshot::capture(session.layout().unwrap(), None).unwrap();
        assert_eq!(snap.depth_of(ModuleRole::Normal), Some(0));
        if snap.count_role(ModuleRole::Boss) > 0 {
            assert!(snap.depth_of(ModuleRole::Boss).unwrap() >= 1);
        }
        assert_eq!(snap.graph().unreachable_from(0), Vec::<u32>::new());
    }
}
