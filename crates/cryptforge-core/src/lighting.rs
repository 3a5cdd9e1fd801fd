//! Wall lamps for a finished layout.
//!
//! Meant to run from a layout-ready listener. Each module becomes a
//! [`LampSite`] and is planned independently; the floor comes from the
//! caller so an engine can answer with real raycasts.

use cryptforge_logic::lamps::{plan_lamps, BoxFloor, FloorQuery, LampConfig, LampPlacement, LampSite};
use hecs::Entity;
use rand::Rng;

use crate::components::ModuleRole;
use crate::layout::DungeonLayout;

/// Lamps planned for one module.
#[derive(Debug, Clone)]
pub struct ModuleLamps {
    pub module: Entity,
    pub lamps: Vec<LampPlacement>,
}

/// Lamp site for a placed module, or `None` if it is not in the layout.
pub fn lamp_site(layout: &DungeonLayout, module: Entity) -> Option<LampSite> {
    let footprint = layout.footprint(module)?;
    let role = layout.module(module)?.role;
    let doorways = layout
        .connectors(module)?
        .iter()
        .map(|c| c.position)
        .collect();
    Some(LampSite {
        bounds: footprint.geometry,
        doorways,
        is_hallway: role == ModuleRole::Hallway,
    })
}

/// Floor made of every module's geometry bounds.
pub fn layout_floor(layout: &DungeonLayout) -> BoxFloor {
    BoxFloor {
        areas: layout
            .modules()
            .filter_map(|m| layout.footprint(m))
            .map(|f| f.geometry)
            .collect(),
    }
}

/// Plan lamps for every module, rooms first then hallways.
pub fn plan_layout_lamps<R: Rng + ?Sized>(
    layout: &DungeonLayout,
    config: &LampConfig,
    floor: &dyn FloorQuery,
    rng: &mut R,
) -> Vec<ModuleLamps> {
    let planned: Vec<ModuleLamps> = layout
        .modules()
        .filter_map(|module| {
            let site = lamp_site(layout, module)?;
            Some(ModuleLamps {
                module,
                lamps: plan_lamps(&site, config, floor, rng),
            })
        })
        .collect();

    let total: usize = planned.iter().map(|m| m.lamps.len()).sum();
    log::debug!("Planned {total} lamps across {} modules", planned.len());
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ModuleCatalog;
    use crate::session::{DungeonSession, ImmediateBaker, SessionRequest};
    use cryptforge_logic::config::GenerationConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn finished(seed: u64) -> DungeonSession {
        let config = GenerationConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let mut session =
            DungeonSession::new(ModuleCatalog::standard().unwrap(), config, ImmediateBaker::default());
        session.start(&SessionRequest::normal(10)).unwrap();
        session
    }

    #[test]
    fn every_module_gets_a_plan() {
        let session = finished(40);
        let layout = session.layout().unwrap();
        let floor = layout_floor(layout);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let planned = plan_layout_lamps(layout, &LampConfig::default(), &floor, &mut rng);
        assert_eq!(planned.len(), layout.module_count());

        let config = LampConfig::default();
        for entry in &planned {
            let is_hallway = layout.module(entry.module).unwrap().role == ModuleRole::Hallway;
            let max = if is_hallway {
                config.max_lamps_per_hallway
            } else {
                config.max_lamps_per_room
            };
            assert!(entry.lamps.len() <= max as usize);
        }
    }

    #[test]
    fn lamps_stay_inside_their_module() {
        let session = finished(41);
        let layout = session.layout().unwrap();
        let floor = layout_floor(layout);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for entry in plan_layout_lamps(layout, &LampConfig::default(), &floor, &mut rng) {
            let geometry = layout.footprint(entry.module).unwrap().geometry;
            for lamp in &entry.lamps {
                assert!(geometry.contains(&lamp.position));
            }
        }
    }

    #[test]
    fn site_lists_every_connector() {
        let session = finished(42);
        let layout = session.layout().unwrap();
        let start = layout.start().unwrap();
        let site = lamp_site(layout, start).unwrap();
        assert_eq!(site.doorways.len(), layout.connectors(start).unwrap().len());
        assert!(!site.is_hallway);
    }

    #[test]
    fn floor_covers_the_start_room() {
        let session = finished(43);
        let layout = session.layout().unwrap();
        let floor = layout_floor(layout);
        assert_eq!(floor.areas.len(), layout.module_count());
        assert_eq!(floor.floor_height(0.0, 0.0), Some(0.0));
    }
}
