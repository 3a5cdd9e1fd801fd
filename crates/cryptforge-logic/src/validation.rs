//! Post-generation checks for finished layouts.
//!
//! Pure functions over plain module/connector records; each returns every
//! problem it finds instead of stopping at the first. The core crate turns a
//! captured layout into these records and runs [`validate_all`].

use std::collections::{HashMap, HashSet};

use crate::graph::{ConnectorGraph, ConnectorLink};
use crate::math::{Aabb, Vec3};

/// Minimal module data needed for validation.
#[derive(Debug, Clone)]
pub struct ModuleFootprint {
    pub id: u32,
    /// Role name, used in messages only.
    pub role: String,
    /// Overlap-test bounds (already shrunk).
    pub bounds: Aabb,
    pub is_start: bool,
}

/// Minimal connector data needed for validation.
#[derive(Debug, Clone)]
pub struct ConnectorState {
    pub module: u32,
    pub index: u32,
    pub position: Vec3,
    pub connected: bool,
    pub capped: bool,
    /// Module and connector index this connector is linked to.
    pub peer: Option<(u32, u32)>,
}

/// A layout validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Inputs for [`validate_all`] beyond the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct LayoutExpectations {
    pub overlap_margin: f32,
    pub target_room_count: u32,
    pub acceptance_ratio: f32,
    /// Largest allowed gap between linked connectors
    pub link_tolerance: f32,
    /// Boss layouts hold exactly one module and skip the quota check.
    pub boss_mode: bool,
}

// ── A. Structure ────────────────────────────────────────────────────────

/// Exactly one module must be flagged as the start.
pub fn check_single_start(modules: &[ModuleFootprint]) -> Vec<ValidationError> {
    let starts: Vec<u32> = modules.iter().filter(|m| m.is_start).map(|m| m.id).collect();
    if starts.len() == 1 {
        return Vec::new();
    }
    vec![ValidationError {
        category: "structure",
        severity: Severity::Error,
        message: format!("Expected exactly one start module, found {starts:?}"),
    }]
}

/// Boss layouts contain a single module and nothing else.
pub fn check_boss_exclusivity(modules: &[ModuleFootprint]) -> Vec<ValidationError> {
    if modules.len() == 1 {
        return Vec::new();
    }
    vec![ValidationError {
        category: "structure",
        severity: Severity::Error,
        message: format!("Boss layout holds {} modules instead of 1", modules.len()),
    }]
}

// ── B. Connectivity ─────────────────────────────────────────────────────

/// Links made of connected connectors and their peers.
///
/// A connector joined twice during loop closure only records its first
/// peer, so links are read from both ends. Each pair appears once.
pub fn connector_links(connectors: &[ConnectorState]) -> Vec<ConnectorLink> {
    let mut seen = HashSet::new();
    connectors
        .iter()
        .filter(|c| c.connected)
        .filter_map(|c| {
            let peer = c.peer?;
            let fresh = seen.insert(link_key((c.module, c.index), peer));
            fresh.then_some(ConnectorLink {
                module_a: c.module,
                module_b: peer.0,
            })
        })
        .collect()
}

fn link_key(a: (u32, u32), b: (u32, u32)) -> ((u32, u32), (u32, u32)) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Every module must be reachable from the start through connected pairs.
pub fn check_connectivity(
    modules: &[ModuleFootprint],
    connectors: &[ConnectorState],
) -> Vec<ValidationError> {
    let Some(start) = modules.iter().find(|m| m.is_start) else {
        return Vec::new(); // caught by the start check
    };
    let graph = ConnectorGraph::from_links(modules.iter().map(|m| m.id), &connector_links(connectors));
    graph
        .unreachable_from(start.id)
        .into_iter()
        .map(|id| ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: format!("Module #{id} is not reachable from start module #{}", start.id),
        })
        .collect()
}

/// Connected connectors must name a peer, and that peer must be connected.
pub fn check_peer_symmetry(connectors: &[ConnectorState]) -> Vec<ValidationError> {
    let by_key: HashMap<(u32, u32), &ConnectorState> =
        connectors.iter().map(|c| ((c.module, c.index), c)).collect();

    let mut errors = Vec::new();
    for c in connectors.iter().filter(|c| c.connected) {
        let Some(peer_key) = c.peer else {
            errors.push(ValidationError {
                category: "connectivity",
                severity: Severity::Error,
                message: format!(
                    "Connector {}:{} is connected without a peer",
                    c.module, c.index
                ),
            });
            continue;
        };
        if !by_key.get(&peer_key).is_some_and(|p| p.connected) {
            errors.push(ValidationError {
                category: "connectivity",
                severity: Severity::Error,
                message: format!(
                    "Connector {}:{} links to {}:{} which is not connected",
                    c.module, c.index, peer_key.0, peer_key.1
                ),
            });
        }
    }
    errors
}

// ── C. Geometry ─────────────────────────────────────────────────────────

/// No two modules may intersect once one of them is inflated by `margin`.
pub fn check_module_overlaps(modules: &[ModuleFootprint], margin: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..modules.len() {
        for j in (i + 1)..modules.len() {
            let a = &modules[i];
            let b = &modules[j];
            if a.bounds.expanded(margin).intersects(&b.bounds) {
                errors.push(ValidationError {
                    category: "module_overlap",
                    severity: Severity::Error,
                    message: format!(
                        "{} #{} and {} #{} overlap (margin {margin})",
                        a.role, a.id, b.role, b.id
                    ),
                });
            }
        }
    }
    errors
}

/// Linked connectors should sit at the same spot.
pub fn check_linked_positions(connectors: &[ConnectorState], tolerance: f32) -> Vec<ValidationError> {
    let by_key: HashMap<(u32, u32), &ConnectorState> =
        connectors.iter().map(|c| ((c.module, c.index), c)).collect();
    let mut seen = HashSet::new();

    connectors
        .iter()
        .filter(|c| c.connected)
        .filter_map(|c| {
            let key = c.peer?;
            let peer = by_key.get(&key)?;
            if !seen.insert(link_key((c.module, c.index), key)) {
                return None;
            }
            let gap = c.position.distance(&peer.position);
            (gap > tolerance).then(|| ValidationError {
                category: "connectivity",
                severity: Severity::Warning,
                message: format!(
                    "Linked connectors {}:{} and {}:{} are {gap:.2} apart",
                    c.module, c.index, key.0, key.1
                ),
            })
        })
        .collect()
}

// ── D. Sealing ──────────────────────────────────────────────────────────

/// Every connector must be connected or capped.
pub fn check_open_connectors(connectors: &[ConnectorState]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for c in connectors {
        if !c.connected && !c.capped {
            errors.push(ValidationError {
                category: "open_connector",
                severity: Severity::Error,
                message: format!(
                    "Connector {}:{} at ({:.1}, {:.1}, {:.1}) is open",
                    c.module, c.index, c.position.x, c.position.y, c.position.z
                ),
            });
        } else if c.connected && c.capped {
            errors.push(ValidationError {
                category: "open_connector",
                severity: Severity::Warning,
                message: format!("Connector {}:{} is both connected and capped", c.module, c.index),
            });
        }
    }
    errors
}

// ── E. Quota ────────────────────────────────────────────────────────────

/// Module count must reach `ratio × target`.
pub fn check_quota(module_count: usize, target: u32, ratio: f32) -> Vec<ValidationError> {
    let needed = target as f32 * ratio;
    if module_count as f32 >= needed {
        return Vec::new();
    }
    vec![ValidationError {
        category: "quota",
        severity: Severity::Error,
        message: format!("{module_count} modules placed, at least {needed:.1} required for target {target}"),
    }]
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all layout validations and return combined results.
pub fn validate_all(
    modules: &[ModuleFootprint],
    connectors: &[ConnectorState],
    expect: &LayoutExpectations,
) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_single_start(modules));
    if expect.boss_mode {
        all.extend(check_boss_exclusivity(modules));
    } else {
        all.extend(check_quota(
            modules.len(),
            expect.target_room_count,
            expect.acceptance_ratio,
        ));
    }
    all.extend(check_connectivity(modules, connectors));
    all.extend(check_peer_symmetry(connectors));
    all.extend(check_module_overlaps(modules, expect.overlap_margin));
    all.extend(check_linked_positions(connectors, expect.link_tolerance));
    all.extend(check_open_connectors(connectors));
    all
}
