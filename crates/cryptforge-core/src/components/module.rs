//! Module components and unplaced module candidates.

use cryptforge_logic::math::{Aabb, Pose, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::connector::{ConnectorPoint, Connectors};

/// Role tag of a placed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleRole {
    Normal,
    Hallway,
    Boss,
}

impl ModuleRole {
    /// Rooms (normal or boss) as opposed to hallways.
    pub fn is_room(self) -> bool {
        !matches!(self, ModuleRole::Hallway)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModuleRole::Normal => "Normal",
            ModuleRole::Hallway => "Hallway",
            ModuleRole::Boss => "Boss",
        }
    }
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Module component - a placed room or hallway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Catalog template this module was instantiated from
    pub template: String,
    pub role: ModuleRole,
    pub pose: Pose,
}

/// World-space volumes of a placed module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Shrunk bounds used for overlap tests
    pub bounds: Aabb,
    /// Unshrunk union of the module's geometry parts
    pub geometry: Aabb,
}

/// A module that has been instantiated but not accepted into a layout.
///
/// Candidates are plain values. Rejecting one drops it without touching
/// anything already placed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInstance {
    pub template: String,
    pub role: ModuleRole,
    pub pose: Pose,
    /// Local-space geometry parts
    pub parts: Vec<Aabb>,
    pub connectors: Vec<ConnectorPoint>,
}

impl ModuleInstance {
    /// Fresh instance at the origin with every connector open.
    pub fn new(
        template: impl Into<String>,
        role: ModuleRole,
        parts: Vec<Aabb>,
        connectors: Vec<ConnectorPoint>,
    ) -> Self {
        let mut instance = Self {
            template: template.into(),
            role,
            pose: Pose::IDENTITY,
            parts,
            connectors,
        };
        instance.set_pose(Pose::IDENTITY);
        instance
    }

    /// Move the module, carrying its connectors along.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        for c in &mut self.connectors {
            c.position = pose.transform_point(c.local_position);
            c.forward = pose.transform_direction(c.local_forward);
        }
    }

    /// World-space union of the geometry parts.
    ///
    /// A module without parts occupies a unit cube at its pivot.
    pub fn geometry_bounds(&self) -> Aabb {
        let mut parts = self.parts.iter().map(|p| p.transformed(&self.pose));
        match parts.next() {
            Some(first) => parts.fold(first, |acc, b| acc.union(&b)),
            None => Aabb::from_center_size(self.pose.position, Vec3::ONE),
        }
    }

    /// Bounds used for overlap tests: geometry scaled by `shrink`.
    ///
    /// The unit-cube fallback is not shrunk.
    pub fn world_bounds(&self, shrink: f32) -> Aabb {
        if self.parts.is_empty() {
            self.geometry_bounds()
        } else {
            self.geometry_bounds().scaled(shrink)
        }
    }

    pub fn footprint(&self, shrink: f32) -> Footprint {
        Footprint {
            bounds: self.world_bounds(shrink),
            geometry: self.geometry_bounds(),
        }
    }

    pub fn open_connector_indices(&self) -> Vec<usize> {
        self.connectors
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.connected)
            .map(|(i, _)| i)
            .collect()
    }

    /// Components to spawn when this candidate is accepted.
    pub fn into_components(self, shrink: f32) -> (Module, Footprint, Connectors) {
        let footprint = self.footprint(shrink);
        (
            Module {
                template: self.template,
                role: self.role,
                pose: self.pose,
            },
            footprint,
            Connectors(self.connectors),
        )
    }
}
