//! Dungeon growth - attaches hallways and rooms to open connectors
//!
//! One build seeds a room at the origin, then repeatedly picks a room with an
//! open connector, hangs a hallway off it and tries to put a room on every
//! remaining hallway exit. Candidates that overlap or cannot be aligned are
//! dropped; they never touch the layout. The build ends when the module quota
//! is met, the attempt budget runs out, or no room has an open connector, and
//! always finishes with a reconcile pass.

use cryptforge_logic::config::GenerationConfig;
use cryptforge_logic::rng::choose;
use hecs::Entity;
use rand::Rng;

use crate::components::{ConnectorPoint, ConnectorRef, ModuleRole};
use crate::generation::align::align_to;
use crate::generation::catalog::{CatalogError, ModuleCatalog};
use crate::generation::reconcile::{ConnectorReconciler, ReconcileReport};
use crate::layout::DungeonLayout;
use crate::spatial::SpatialIndex;

/// Why the growth loop stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GrowthEnd {
    QuotaMet,
    #[default]
    AttemptsExhausted,
    /// No placed room had an open connector left
    NoOpenConnectors,
}

/// Counters from one build. Placement conflicts end up here, not in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub attempts: u32,
    pub rooms_placed: u32,
    pub hallways_placed: u32,
    /// Hallway candidates with no connectors
    pub malformed_hallways: u32,
    /// Room candidates with no connectors
    pub rooms_without_connectors: u32,
    pub alignment_failures: u32,
    pub hallway_overlaps: u32,
    pub room_overlaps: u32,
    pub end: GrowthEnd,
    pub reconcile: ReconcileReport,
}

/// Grows one layout from a catalog.
pub struct DungeonGraphBuilder<'a> {
    catalog: &'a ModuleCatalog,
    config: &'a GenerationConfig,
    spatial: SpatialIndex,
}

impl<'a> DungeonGraphBuilder<'a> {
    pub fn new(catalog: &'a ModuleCatalog, config: &'a GenerationConfig) -> Self {
        Self {
            catalog,
            config,
            spatial: SpatialIndex::new(config.overlap_margin),
        }
    }

    /// Build into `layout` (cleared first) toward its target module count.
    pub fn build<R: Rng + ?Sized>(
        &self,
        layout: &mut DungeonLayout,
        rng: &mut R,
    ) -> Result<BuildReport, CatalogError> {
        let wall_cap = self
            .catalog
            .wall_cap
            .as_ref()
            .ok_or(CatalogError::MissingWallCap)?;
        layout.clear();

        let seed_room = self
            .catalog
            .instantiate(ModuleRole::Normal, rng)
            .ok_or(CatalogError::NoRooms)?;
        layout.place(seed_room, self.config.bounds_shrink);

        let mut report = BuildReport {
            rooms_placed: 1,
            ..Default::default()
        };
        let end = self.grow(layout, rng, &mut report);
        report.end = end;

        let reconciler = ConnectorReconciler::new(
            wall_cap,
            self.config.loop_closure_distance,
            self.config.cap_inset,
        );
        report.reconcile = reconciler.reconcile(layout);
        layout.attempts = report.attempts;

        log::debug!(
            "Build finished ({:?}): {} rooms, {} hallways in {} attempts, {} loops closed, {} caps",
            report.end,
            report.rooms_placed,
            report.hallways_placed,
            report.attempts,
            report.reconcile.loops_closed,
            report.reconcile.caps_placed
        );
        Ok(report)
    }

    fn grow<R: Rng + ?Sized>(
        &self,
        layout: &mut DungeonLayout,
        rng: &mut R,
        report: &mut BuildReport,
    ) -> GrowthEnd {
        let target = layout.target_room_count();
        let max_attempts = self.config.max_growth_attempts(target);
        loop {
            if layout.module_count() >= target as usize {
                return GrowthEnd::QuotaMet;
            }
            if report.attempts >= max_attempts {
                return GrowthEnd::AttemptsExhausted;
            }
            report.attempts += 1;
            if !self.grow_once(layout, rng, report) {
                return GrowthEnd::NoOpenConnectors;
            }
        }
    }

    /// One growth step. Returns false when no room has an open connector.
    fn grow_once<R: Rng + ?Sized>(
        &self,
        layout: &mut DungeonLayout,
        rng: &mut R,
        report: &mut BuildReport,
    ) -> bool {
        let shrink = self.config.bounds_shrink;

        let growable: Vec<Entity> = layout
            .rooms()
            .iter()
            .copied()
            .filter(|&e| layout.connectors(e).is_some_and(|c| c.has_open()))
            .collect();
        let Some(&room) = choose(rng, &growable) else {
            return false;
        };
        let open = layout
            .connectors(room)
            .map(|c| c.open_indices())
            .unwrap_or_default();
        let Some(&from_index) = choose(rng, &open) else {
            return true;
        };
        let from_ref = ConnectorRef {
            module: room,
            index: from_index,
        };
        let Some(from) = layout.connector(from_ref) else {
            return true;
        };

        // Hallway
        let Some(mut hallway) = self.catalog.instantiate(ModuleRole::Hallway, rng) else {
            report.malformed_hallways += 1;
            return true;
        };
        let Some(&entry) = hallway.open_connector_indices().first() else {
            log::debug!("Hallway `{}` has no connectors, discarding", hallway.template);
            report.malformed_hallways += 1;
            return true;
        };
        if let Err(e) = align_to(&from, &mut hallway, entry) {
            log::debug!("Hallway `{}` not aligned: {e}", hallway.template);
            report.alignment_failures += 1;
            return true;
        }
        if self.spatial.overlaps(layout, &hallway.world_bounds(shrink)) {
            report.hallway_overlaps += 1;
            return true;
        }

        let exits: Vec<(usize, ConnectorPoint)> = hallway
            .connectors
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != entry)
            .map(|(i, c)| (i, c.clone()))
            .collect();
        let hall = layout.place(hallway, shrink);
        layout.link(
            from_ref,
            ConnectorRef {
                module: hall,
                index: entry,
            },
        );
        report.hallways_placed += 1;

        // Rooms off each exit
        let target = layout.target_room_count() as usize;
        for (exit_index, exit) in exits {
            if layout.module_count() >= target {
                break;
            }
            let Some(mut candidate) = self.catalog.instantiate(ModuleRole::Normal, rng) else {
                break;
            };
            if layout.module_count() + 1 == target {
                candidate.role = ModuleRole::Boss;
            }

            let open = candidate.open_connector_indices();
            let Some(&room_entry) = choose(rng, &open) else {
                report.rooms_without_connectors += 1;
                continue;
            };
            if let Err(e) = align_to(&exit, &mut candidate, room_entry) {
                log::debug!("Room `{}` not aligned: {e}", candidate.template);
                report.alignment_failures += 1;
                continue;
            }
            if self.spatial.overlaps(layout, &candidate.world_bounds(shrink)) {
                report.room_overlaps += 1;
                continue;
            }

            let placed = layout.place(candidate, shrink);
            layout.link(
                ConnectorRef {
                    module: hall,
                    index: exit_index,
                },
                ConnectorRef {
                    module: placed,
                    index: room_entry,
                },
            );
            report.rooms_placed += 1;
        }
        true
    }
}
