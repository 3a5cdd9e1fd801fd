//! Integration tests for full dungeon sessions.
//!
//! Exercises: SessionRequest → DungeonGraphBuilder → ConnectorReconciler
//! → NavMeshBaker → layout-ready listeners → snapshot validation
//!
//! Everything runs headless with the immediate baker.

use std::cell::Cell;
use std::rc::Rc;

use cryptforge_core::components::{ConnectorPoint, ConnectorRef, ModuleInstance, ModuleRole};
use cryptforge_core::generation::{ConnectorReconciler, ModuleCatalog, ModuleTemplate};
use cryptforge_core::layout::DungeonLayout;
use cryptforge_core::session::{
    DungeonSession, ImmediateBaker, SessionError, SessionRequest, SessionState,
};
use cryptforge_core::snapshot::{validate_layout, LayoutSnapshot};
use cryptforge_logic::config::GenerationConfig;
use cryptforge_logic::math::{Aabb, Pose, Vec3, Yaw};
use cryptforge_logic::options::{choose_dungeon, DungeonOption, Upgrade, UpgradeKind};
use cryptforge_logic::progress::DungeonProgress;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ── Helpers ────────────────────────────────────────────────────────────

fn seeded(seed: u64) -> GenerationConfig {
    GenerationConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

fn session_with(catalog: ModuleCatalog, seed: u64) -> DungeonSession {
    DungeonSession::new(catalog, seeded(seed), ImmediateBaker::default())
}

fn standard_session(seed: u64) -> DungeonSession {
    session_with(ModuleCatalog::standard().unwrap(), seed)
}

/// Attach a counter that goes up every time the layout-ready signal fires.
fn ready_counter(session: &mut DungeonSession) -> Rc<Cell<u32>> {
    let fired = Rc::new(Cell::new(0));
    let handle = fired.clone();
    session.on_layout_ready(move || handle.set(handle.get() + 1));
    fired
}

/// Only the one-door room and the straight hallway: growth dies after a
/// single hallway.
fn starved_catalog() -> ModuleCatalog {
    let standard = ModuleCatalog::standard().unwrap();
    ModuleCatalog {
        rooms: standard
            .rooms
            .iter()
            .filter(|t| t.name == "dead_end_room")
            .cloned()
            .collect(),
        hallways: standard
            .hallways
            .iter()
            .filter(|t| t.name == "straight_hallway")
            .cloned()
            .collect(),
        ..standard
    }
}

fn assert_sealed(layout: &DungeonLayout) {
    for module in layout.modules().collect::<Vec<_>>() {
        for c in layout.connectors(module).unwrap().iter() {
            assert!(c.connected || c.is_capped(), "open connector on {module:?}");
        }
    }
}

// ── Normal sessions ────────────────────────────────────────────────────

#[test]
fn normal_session_reaches_success() {
    let mut session = standard_session(100);
    let fired = ready_counter(&mut session);

    let summary = session.start(&SessionRequest::normal(10)).unwrap();
    assert_eq!(session.state(), SessionState::Success);
    assert!(summary.attempts >= 1 && summary.attempts <= 10);
    assert!(summary.module_count >= 7);
    assert!(summary.ready);
    assert_eq!(fired.get(), 1);

    let layout = session.layout().unwrap();
    let start = layout.start().unwrap();
    assert_eq!(layout.module(start).unwrap().role, ModuleRole::Normal);
    assert_eq!(layout.module_count(), summary.module_count);
    assert_sealed(layout);
}

#[test]
fn ready_fires_once_per_session() {
    let mut session = standard_session(101);
    let fired = ready_counter(&mut session);

    session.start(&SessionRequest::normal(8)).unwrap();
    assert!(session.poll());
    assert!(session.poll());
    assert_eq!(fired.get(), 1);
    assert_eq!(session.baker().bakes, 1);

    session.reset();
    session.start(&SessionRequest::normal(8)).unwrap();
    assert_eq!(fired.get(), 2);
    assert_eq!(session.baker().bakes, 2);
}

#[test]
fn default_room_count_applies_without_target() {
    let mut session = standard_session(102);
    let summary = session
        .start(&SessionRequest {
            room_count: None,
            boss_mode: false,
        })
        .unwrap();
    assert_eq!(session.layout().unwrap().target_room_count(), 20);
    assert!(summary.module_count >= 14);
}

#[test]
fn same_seed_reproduces_layout() {
    let capture = |seed| {
        let mut session = standard_session(seed);
        session.start(&SessionRequest::normal(15)).unwrap();
        LayoutSnapshot::capture(session.layout().unwrap(), session.seed()).unwrap()
    };
    assert_eq!(capture(103), capture(103));
}

// ── Boss sessions ──────────────────────────────────────────────────────

#[test]
fn boss_session_places_one_capped_room() {
    let mut session = standard_session(200);
    let fired = ready_counter(&mut session);

    let summary = session.start(&SessionRequest::boss()).unwrap();
    assert!(summary.boss_mode);
    assert_eq!(summary.attempts, 1);
    assert_eq!(fired.get(), 1);

    let layout = session.layout().unwrap();
    assert_eq!(layout.module_count(), 1);
    assert!(layout.hallways().is_empty());
    let boss = layout.start().unwrap();
    assert_eq!(layout.module(boss).unwrap().role, ModuleRole::Boss);
    assert_eq!(layout.module(boss).unwrap().pose, Pose::IDENTITY);
    assert_sealed(layout);
    assert_eq!(layout.caps().len(), layout.connectors(boss).unwrap().len());
}

#[test]
fn progress_unlocks_boss_session() {
    let option = DungeonOption {
        name: "crypt".into(),
        upgrade: Upgrade {
            name: "Thick Skin".into(),
            kind: UpgradeKind::PlayerArmour,
            value: 5.0,
        },
        room_count_min: 8,
        room_count_max: 12,
        is_boss: false,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut progress = DungeonProgress::new(2);

    for _ in 0..2 {
        let run = choose_dungeon(&option, &mut rng).unwrap();
        let request = SessionRequest::from_progress(&progress, Some(&run));
        assert!(!request.boss_mode);
        assert_eq!(request.room_count, Some(run.room_count));

        let mut session = standard_session(run.room_count as u64);
        session.start(&request).unwrap();
        assert!(session.layout().unwrap().module_count() as f32 >= run.room_count as f32 * 0.7);
        progress.complete_dungeon(Some(&run));
    }

    let request = SessionRequest::from_progress(&progress, None);
    assert!(request.boss_mode);
    let mut session = standard_session(7);
    session.start(&request).unwrap();
    assert!(session.is_boss_mode());
    assert_eq!(session.layout().unwrap().module_count(), 1);
}

// ── Faulty catalogs ────────────────────────────────────────────────────

#[test]
fn malformed_hallway_in_mix_still_converges() {
    let mut catalog = ModuleCatalog::standard().unwrap();
    catalog.hallways.push(ModuleTemplate {
        name: "collapsed_hallway".into(),
        parts: vec![Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 4.0, 4.0))],
        connectors: Vec::new(),
    });

    let mut wasted = 0;
    for seed in 300..305 {
        let mut session = session_with(catalog.clone(), seed);
        session.start(&SessionRequest::normal(10)).unwrap();
        assert_eq!(session.state(), SessionState::Success);
        wasted += session
            .reports()
            .iter()
            .map(|r| r.malformed_hallways)
            .sum::<u32>();
    }
    assert!(wasted > 0, "malformed hallway never drawn");
}

#[test]
fn starved_catalog_fails_after_every_attempt() {
    let mut session = session_with(starved_catalog(), 400);
    let fired = ready_counter(&mut session);

    let err = session.start(&SessionRequest::normal(100)).unwrap_err();
    match err {
        SessionError::Exhausted { attempts, best, .. } => {
            assert_eq!(attempts, 10);
            assert!(best < 70);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.reports().len(), 10);
    assert_eq!(session.allocated_entities(), 0);
    assert!(session.layout().is_none());
    assert!(!session.poll());
    assert_eq!(fired.get(), 0);
    assert_eq!(session.baker().bakes, 0);
}

#[test]
fn boss_mode_without_boss_template_aborts() {
    let catalog = ModuleCatalog {
        boss_room: None,
        ..ModuleCatalog::standard().unwrap()
    };
    let mut session = session_with(catalog, 401);
    assert!(matches!(
        session.start(&SessionRequest::boss()),
        Err(SessionError::Catalog(_))
    ));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.allocated_entities(), 0);
}

// ── Loop closure ───────────────────────────────────────────────────────

fn corridor_cell(x: f32) -> ModuleInstance {
    let mut cell = ModuleInstance::new(
        "corridor_cell",
        ModuleRole::Normal,
        vec![Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 4.0, 2.0))],
        vec![
            ConnectorPoint::new("east", Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ConnectorPoint::new("west", Vec3::new(-2.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)),
        ],
    );
    cell.set_pose(Pose::new(Vec3::new(x, 0.0, 0.0), Yaw::IDENTITY));
    cell
}

#[test]
fn coincident_dead_ends_close_instead_of_capping() {
    let catalog = ModuleCatalog::standard().unwrap();
    let wall_cap = catalog.wall_cap.as_ref().unwrap();
    let mut layout = DungeonLayout::new(2);
    let a = layout.place(corridor_cell(0.0), 0.95);
    // a.east at x = 2.0, b.west at x = 2.6
    let b = layout.place(corridor_cell(4.6), 0.95);

    let report = ConnectorReconciler::new(wall_cap, 1.0, 0.1).reconcile(&mut layout);
    assert_eq!(report.loops_closed, 1);
    assert_eq!(report.caps_placed, 2);

    let a_east = layout.connector(ConnectorRef { module: a, index: 0 }).unwrap();
    let b_west = layout.connector(ConnectorRef { module: b, index: 1 }).unwrap();
    assert!(a_east.connected && b_west.connected);
    assert!(!a_east.is_capped() && !b_west.is_capped());
    assert_sealed(&layout);
}

// ── Layout properties ──────────────────────────────────────────────────

#[test]
fn finished_layouts_pass_validation() {
    for seed in 500..510 {
        let mut session = standard_session(seed);
        session.start(&SessionRequest::normal(12)).unwrap();
        let errors = validate_layout(session.layout().unwrap(), session.config(), false).unwrap();
        assert!(errors.is_empty(), "seed {seed}: {errors:?}");
    }
}

#[test]
fn snapshot_round_trip_keeps_validation() {
    let mut session = standard_session(600);
    session.start(&SessionRequest::normal(10)).unwrap();
    let snap = LayoutSnapshot::capture(session.layout().unwrap(), session.seed()).unwrap();

    let mut buf = Vec::new();
    snap.save(&mut buf).unwrap();
    let loaded = LayoutSnapshot::load(buf.as_slice()).unwrap();
    assert!(loaded.validate(session.config(), false).is_empty());
    assert_eq!(loaded.graph().reachable_from(0).len(), loaded.module_count());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sessions_succeed_clean_or_fail_clean(seed in any::<u64>(), target in 3u32..=20) {
        let mut session = standard_session(seed);
        match session.start(&SessionRequest::normal(target)) {
            Ok(summary) => {
                let layout = session.layout().unwrap();
                prop_assert!(summary.module_count as f32 >= target as f32 * 0.7);
                let errors = validate_layout(layout, session.config(), false).unwrap();
                prop_assert!(errors.is_empty(), "{:?}", errors);
            }
            Err(SessionError::Exhausted { .. }) => {
                prop_assert_eq!(session.allocated_entities(), 0);
                prop_assert!(session.layout().is_none());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
