//! Connector components: attachment points and wall caps.

use cryptforge_logic::math::Vec3;
use hecs::Entity;

/// Handle to one connector: owning module entity plus its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorRef {
    pub module: Entity,
    pub index: usize,
}

/// An oriented attachment point on a module.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPoint {
    /// Unique within the owning module
    pub name: String,
    pub local_position: Vec3,
    pub local_forward: Vec3,
    /// World position (valid once the owning module has a pose)
    pub position: Vec3,
    /// World forward (outward from the module)
    pub forward: Vec3,
    pub connected: bool,
    /// Connector on the neighbouring module this one is joined to
    pub peer: Option<ConnectorRef>,
    /// Wall cap sealing this connector
    pub cap: Option<Entity>,
}

impl ConnectorPoint {
    pub fn new(name: impl Into<String>, local_position: Vec3, local_forward: Vec3) -> Self {
        Self {
            name: name.into(),
            local_position,
            local_forward,
            position: local_position,
            forward: local_forward,
            connected: false,
            peer: None,
            cap: None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.connected
    }

    pub fn is_capped(&self) -> bool {
        self.cap.is_some()
    }
}

/// Connectors component - the ordered connector list of a placed module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connectors(pub Vec<ConnectorPoint>);

impl Connectors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ConnectorPoint> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ConnectorPoint> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConnectorPoint> {
        self.0.iter()
    }

    pub fn has_open(&self) -> bool {
        self.0.iter().any(ConnectorPoint::is_open)
    }

    pub fn open_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_open())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Wall cap component - seals an unused connector
#[derive(Debug, Clone, PartialEq)]
pub struct WallCap {
    pub owner: ConnectorRef,
    /// Catalog template used for the cap
    pub template: String,
    pub position: Vec3,
    /// Faces outward along the capped connector's forward
    pub forward: Vec3,
}
