//! The dungeon layout aggregate: module arena plus placement order.
//!
//! Placed modules and wall caps are entities in a `hecs::World` owned by the
//! layout. Discarding a layout clears the world, which drops every module,
//! connector list and cap in one step.

use hecs::{Entity, World};

use crate::components::{
    ConnectorPoint, ConnectorRef, Connectors, Footprint, Module, ModuleInstance, ModuleRole, WallCap,
};

/// Placed modules of one generation attempt.
pub struct DungeonLayout {
    world: World,
    rooms: Vec<Entity>,
    hallways: Vec<Entity>,
    caps: Vec<Entity>,
    start: Option<Entity>,
    target_room_count: u32,
    /// Growth attempts spent building this layout
    pub attempts: u32,
}

impl Default for DungeonLayout {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DungeonLayout {
    pub fn new(target_room_count: u32) -> Self {
        Self {
            world: World::new(),
            rooms: Vec::new(),
            hallways: Vec::new(),
            caps: Vec::new(),
            start: None,
            target_room_count,
            attempts: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Placed rooms (normal and boss) in acceptance order.
    pub fn rooms(&self) -> &[Entity] {
        &self.rooms
    }

    pub fn hallways(&self) -> &[Entity] {
        &self.hallways
    }

    pub fn caps(&self) -> &[Entity] {
        &self.caps
    }

    pub fn start(&self) -> Option<Entity> {
        self.start
    }

    pub fn target_room_count(&self) -> u32 {
        self.target_room_count
    }

    /// Rooms plus hallways.
    pub fn module_count(&self) -> usize {
        self.rooms.len() + self.hallways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.module_count() == 0
    }

    /// Live entities in the arena, caps included.
    pub fn entity_count(&self) -> u32 {
        self.world.len()
    }

    /// Rooms then hallways, each in acceptance order.
    pub fn modules(&self) -> impl Iterator<Item = Entity> + '_ {
        self.rooms.iter().chain(self.hallways.iter()).copied()
    }

    pub fn modules_with_role(&self, role: ModuleRole) -> Vec<Entity> {
        self.modules()
            .filter(|&e| self.module(e).is_some_and(|m| m.role == role))
            .collect()
    }

    pub fn module(&self, entity: Entity) -> Option<hecs::Ref<'_, Module>> {
        self.world.get::<&Module>(entity).ok()
    }

    pub fn footprint(&self, entity: Entity) -> Option<Footprint> {
        self.world.get::<&Footprint>(entity).ok().map(|f| *f)
    }

    pub fn connectors(&self, entity: Entity) -> Option<hecs::Ref<'_, Connectors>> {
        self.world.get::<&Connectors>(entity).ok()
    }

    pub fn connector(&self, at: ConnectorRef) -> Option<ConnectorPoint> {
        self.connectors(at.module)?.get(at.index).cloned()
    }

    pub fn cap(&self, entity: Entity) -> Option<hecs::Ref<'_, WallCap>> {
        self.world.get::<&WallCap>(entity).ok()
    }

    /// Accept a candidate: spawn it and append it to the matching list.
    ///
    /// The first module placed becomes the start.
    pub fn place(&mut self, candidate: ModuleInstance, bounds_shrink: f32) -> Entity {
        let role = candidate.role;
        let entity = self.world.spawn(candidate.into_components(bounds_shrink));
        if role.is_room() {
            self.rooms.push(entity);
        } else {
            self.hallways.push(entity);
        }
        if self.start.is_none() {
            self.start = Some(entity);
        }
        entity
    }

    /// Mark two connectors connected and point them at each other.
    ///
    /// A connector that already has a peer keeps it; loop closure can join a
    /// connector twice. Returns false (changing nothing) if either connector
    /// does not exist.
    pub fn link(&mut self, a: ConnectorRef, b: ConnectorRef) -> bool {
        if self.connector(a).is_none() || self.connector(b).is_none() {
            return false;
        }
        for (this, other) in [(a, b), (b, a)] {
            if let Ok(mut connectors) = self.world.get::<&mut Connectors>(this.module) {
                if let Some(c) = connectors.get_mut(this.index) {
                    c.connected = true;
                    c.peer.get_or_insert(other);
                }
            }
        }
        true
    }

    /// Spawn a wall cap and attach it to its connector.
    pub fn attach_cap(&mut self, cap: WallCap) -> Option<Entity> {
        let owner = cap.owner;
        self.connector(owner)?;
        let entity = self.world.spawn((cap,));
        if let Ok(mut connectors) = self.world.get::<&mut Connectors>(owner.module) {
            if let Some(c) = connectors.get_mut(owner.index) {
                c.cap = Some(entity);
            }
        }
        self.caps.push(entity);
        Some(entity)
    }

    /// Release every module and cap, keeping the target.
    pub fn clear(&mut self) {
        self.world.clear();
        self.rooms.clear();
        self.hallways.clear();
        self.caps.clear();
        self.start = None;
        self.attempts = 0;
    }

    /// Clear and retarget.
    pub fn reset(&mut self, target_room_count: u32) {
        self.clear();
        self.target_room_count = target_room_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptforge_logic::math::{Aabb, Vec3};

    fn cell(role: ModuleRole) -> ModuleInstance {
        ModuleInstance::new(
            "cell",
            role,
            vec![Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 3.0, 2.0))],
            vec![
                ConnectorPoint::new("n", Vec3::new(0.0, 0.0, 2.0), Vec3::FORWARD),
                ConnectorPoint::new("s", Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -1.0)),
            ],
        )
    }

    #[test]
    fn first_placed_is_start_and_lists_follow_role() {
        let mut layout = DungeonLayout::new(5);
        let a = layout.place(cell(ModuleRole::Normal), 0.95);
        let h = layout.place(cell(ModuleRole::Hallway), 0.95);
        let b = layout.place(cell(ModuleRole::Boss), 0.95);
        assert_eq!(layout.start(), Some(a));
        assert_eq!(layout.rooms(), &[a, b]);
        assert_eq!(layout.hallways(), &[h]);
        assert_eq!(layout.module_count(), 3);
        assert_eq!(layout.modules().collect::<Vec<_>>(), vec![a, b, h]);
        assert_eq!(layout.modules_with_role(ModuleRole::Boss), vec![b]);
    }

    #[test]
    fn link_is_symmetric() {
        let mut layout = DungeonLayout::new(2);
        let a = layout.place(cell(ModuleRole::Normal), 0.95);
        let b = layout.place(cell(ModuleRole::Hallway), 0.95);
        let ra = ConnectorRef { module: a, index: 0 };
        let rb = ConnectorRef { module: b, index: 1 };
        assert!(layout.link(ra, rb));
        assert_eq!(layout.connector(ra).unwrap().peer, Some(rb));
        assert_eq!(layout.connector(rb).unwrap().peer, Some(ra));
        assert!(layout.connector(rb).unwrap().connected);
        assert!(!layout.connector(ConnectorRef { module: b, index: 0 }).unwrap().connected);
    }

    #[test]
    fn second_link_keeps_first_peer() {
        let mut layout = DungeonLayout::new(3);
        let a = layout.place(cell(ModuleRole::Normal), 0.95);
        let b = layout.place(cell(ModuleRole::Normal), 0.95);
        let c = layout.place(cell(ModuleRole::Hallway), 0.95);
        let ra = ConnectorRef { module: a, index: 0 };
        let rb = ConnectorRef { module: b, index: 1 };
        let rc = ConnectorRef { module: c, index: 1 };
        assert!(layout.link(ra, rb));
        assert!(layout.link(rb, rc));
        assert_eq!(layout.connector(rb).unwrap().peer, Some(ra));
        assert_eq!(layout.connector(rc).unwrap().peer, Some(rb));
        assert!(layout.connector(rc).unwrap().connected);
    }

    #[test]
    fn link_to_missing_connector_changes_nothing() {
        let mut layout = DungeonLayout::new(1);
        let a = layout.place(cell(ModuleRole::Normal), 0.95);
        let ra = ConnectorRef { module: a, index: 0 };
        assert!(!layout.link(ra, ConnectorRef { module: a, index: 9 }));
        assert!(!layout.connector(ra).unwrap().connected);
    }

    #[test]
    fn clear_releases_everything() {
        let mut layout = DungeonLayout::new(3);
        let a = layout.place(cell(ModuleRole::Normal), 0.95);
        let owner = ConnectorRef { module: a, index: 1 };
        let cap = layout
            .attach_cap(WallCap {
                owner,
                template: "wall".into(),
                position: Vec3::ZERO,
                forward: Vec3::FORWARD,
            })
            .unwrap();
        assert_eq!(layout.connector(owner).unwrap().cap, Some(cap));
        assert_eq!(layout.entity_count(), 2);

        layout.clear();
        assert_eq!(layout.entity_count(), 0);
        assert!(layout.is_empty());
        assert!(layout.caps().is_empty());
        assert_eq!(layout.start(), None);
        assert_eq!(layout.target_room_count(), 3);
        assert!(layout.module(a).is_none());
    }
}
