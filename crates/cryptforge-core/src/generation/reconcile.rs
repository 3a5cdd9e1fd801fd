//! Loop closure and capping of leftover connectors.

use cryptforge_logic::math::{look_up_vector, Vec3};
use hecs::Entity;

use crate::components::{ConnectorRef, WallCap};
use crate::generation::catalog::ModuleTemplate;
use crate::layout::DungeonLayout;

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub open_before: usize,
    pub loops_closed: usize,
    pub caps_placed: usize,
}

/// Seals a layout after growth: coincident open connectors are joined, every
/// other open connector gets a wall cap.
pub struct ConnectorReconciler<'a> {
    wall_cap: &'a ModuleTemplate,
    /// Open connectors closer than this are joined
    pub loop_closure_distance: f32,
    /// Distance a cap is pushed down along the connector's up vector
    pub cap_inset: f32,
}

impl<'a> ConnectorReconciler<'a> {
    pub fn new(wall_cap: &'a ModuleTemplate, loop_closure_distance: f32, cap_inset: f32) -> Self {
        Self {
            wall_cap,
            loop_closure_distance,
            cap_inset,
        }
    }

    /// Close loops, then cap whatever is still open.
    ///
    /// Open connectors are scanned rooms first, then hallways, each in
    /// placement order. Every connector is joined to the first later
    /// connector in range, even if either was already joined earlier in the
    /// pass, so a cluster of coincident doorways is joined as a chain and
    /// none of it is capped.
    pub fn reconcile(&self, layout: &mut DungeonLayout) -> ReconcileReport {
        let open = open_connectors(layout, layout.modules().collect::<Vec<_>>().as_slice());
        let mut joined = vec![false; open.len()];
        let mut report = ReconcileReport {
            open_before: open.len(),
            ..Default::default()
        };

        for i in 0..open.len() {
            let Some(j) = ((i + 1)..open.len())
                .find(|&j| open[i].1.distance(&open[j].1) < self.loop_closure_distance)
            else {
                continue;
            };
            layout.link(open[i].0, open[j].0);
            joined[i] = true;
            joined[j] = true;
            report.loops_closed += 1;
            log::debug!(
                "Closed loop between connector {} of {:?} and connector {} of {:?}",
                open[i].0.index,
                open[i].0.module,
                open[j].0.index,
                open[j].0.module
            );
        }

        let leftovers: Vec<ConnectorRef> = open
            .iter()
            .zip(&joined)
            .filter(|(_, &j)| !j)
            .map(|((at, _), _)| *at)
            .collect();
        report.caps_placed = self.cap_each(layout, &leftovers);
        report
    }

    /// Cap every open connector of `modules` without attempting loop closure.
    pub fn cap_open(&self, layout: &mut DungeonLayout, modules: &[Entity]) -> usize {
        let open: Vec<ConnectorRef> = open_connectors(layout, modules)
            .into_iter()
            .map(|(at, _)| at)
            .collect();
        self.cap_each(layout, &open)
    }

    fn cap_each(&self, layout: &mut DungeonLayout, connectors: &[ConnectorRef]) -> usize {
        let mut placed = 0;
        for &at in connectors {
            let Some(point) = layout.connector(at) else {
                continue;
            };
            let cap = WallCap {
                owner: at,
                template: self.wall_cap.name.clone(),
                position: point.position - look_up_vector(point.forward) * self.cap_inset,
                forward: point.forward,
            };
            if layout.attach_cap(cap).is_some() {
                placed += 1;
            }
        }
        placed
    }
}

/// Unconnected connectors of `modules`, in module then connector order.
fn open_connectors(layout: &DungeonLayout, modules: &[Entity]) -> Vec<(ConnectorRef, Vec3)> {
    let mut open = Vec::new();
    for &module in modules {
        let Some(connectors) = layout.connectors(module) else {
            continue;
        };
        for (index, c) in connectors.iter().enumerate() {
            if c.is_open() && !c.is_capped() {
                open.push((ConnectorRef { module, index }, c.position));
            }
        }
    }
    open
}
