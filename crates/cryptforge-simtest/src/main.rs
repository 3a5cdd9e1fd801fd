//! CryptForge Headless Generation Harness
//!
//! Runs dungeon sessions against the module catalog and checks every
//! finished layout. Runs entirely in-process with an immediate nav mesh baker.
//!
//! Usage:
//!   cargo run -p cryptforge-simtest
//!   cargo run -p cryptforge-simtest -- --verbose --sessions 50 --rooms 30
//!   cargo run -p cryptforge-simtest -- --seed 7 --dump layout.json

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use cryptforge_core::components::{ConnectorPoint, ConnectorRef, ModuleInstance, ModuleRole};
use cryptforge_core::generation::{ConnectorReconciler, ModuleCatalog, ModuleTemplate};
use cryptforge_core::layout::DungeonLayout;
use cryptforge_core::lighting::{layout_floor, plan_layout_lamps};
use cryptforge_core::session::{DungeonSession, ImmediateBaker, SessionError, SessionRequest};
use cryptforge_core::snapshot::LayoutSnapshot;
use cryptforge_logic::config::{validate_config, GenerationConfig};
use cryptforge_logic::lamps::{validate_lamp_config, LampConfig};
use cryptforge_logic::math::{Aabb, Pose, Vec3, Yaw};
use cryptforge_logic::options::{
    choose_dungeon, offer_dungeons, DungeonOption, Upgrade, UpgradeKind, OFFER_SLOTS,
};
use cryptforge_logic::progress::{DungeonProgress, ProgressEvent};
use cryptforge_logic::validation::Severity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(about = "Generate dungeons headlessly and validate every layout")]
struct Args {
    /// Print every check, not just failures
    #[arg(long)]
    verbose: bool,

    /// Base seed; session `i` uses `seed + i`
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Normal sessions to run in the sweep
    #[arg(long, default_value_t = 20)]
    sessions: u32,

    /// Target room count for the sweep
    #[arg(long, default_value_t = 20)]
    rooms: u32,

    /// Catalog JSON to use instead of the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Generation config JSON to use instead of the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the first successful layout and the sweep stats as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct SweepStats {
    sessions: u32,
    succeeded: u32,
    failed: u32,
    total_builds: u32,
    min_modules: usize,
    max_modules: usize,
    mean_modules: f32,
    loops_closed: usize,
    caps_placed: usize,
}

#[derive(Serialize)]
struct Dump<'a> {
    stats: &'a SweepStats,
    layout: Option<&'a LayoutSnapshot>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Only our own crates log, to stderr.
    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Warn
        },
        simplelog::ConfigBuilder::new()
            .set_target_level(simplelog::LevelFilter::Off)
            .set_location_level(simplelog::LevelFilter::Off)
            .add_filter_allow_str("cryptforge")
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let catalog = match &args.catalog {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            ModuleCatalog::from_json(&json)?
        }
        None => ModuleCatalog::standard()?,
    };
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GenerationConfig::from_json(&json)?
        }
        None => GenerationConfig::default(),
    };

    println!("=== CryptForge Generation Harness ===\n");

    let mut results = Vec::new();

    // 1. Catalog and config
    results.extend(validate_catalog(&catalog, &config, args.verbose));

    // 2. Normal session sweep
    let (sweep, stats, first_layout) = sweep_sessions(&catalog, &config, &args);
    results.extend(sweep);

    // 3. Boss session
    results.extend(validate_boss_session(&catalog, &config, args.seed));

    // 4. Faulty catalogs
    results.extend(validate_faulty_catalogs(&catalog, &config, args.seed));

    // 5. Loop closure
    results.extend(validate_loop_closure(&catalog));

    // 6. Progress and dungeon options
    results.extend(validate_progress(&catalog, &config, args.seed, args.verbose));

    // 7. Lighting
    results.extend(validate_lighting(&catalog, &config, args.seed));

    if let Some(path) = &args.dump {
        let dump = Dump {
            stats: &stats,
            layout: first_layout.as_ref(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&dump)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("\nWrote {}", path.display());
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn new_session(catalog: &ModuleCatalog, config: &GenerationConfig, seed: u64) -> DungeonSession {
    let config = GenerationConfig {
        seed: Some(seed),
        ..config.clone()
    };
    DungeonSession::new(catalog.clone(), config, ImmediateBaker::default())
}

fn open_connector_count(layout: &DungeonLayout) -> usize {
    layout
        .modules()
        .filter_map(|m| layout.connectors(m))
        .map(|c| c.iter().filter(|p| !p.connected && !p.is_capped()).count())
        .sum()
}

// ── 1. Catalog & Config ─────────────────────────────────────────────────

fn validate_catalog(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Catalog & Config ---");
    let mut results = Vec::new();

    let config_errors = validate_config(config);
    results.push(TestResult::new(
        "config_valid",
        config_errors.is_empty(),
        if config_errors.is_empty() {
            "generation config passes validation".to_string()
        } else {
            format!("{config_errors:?}")
        },
    ));

    for boss_mode in [false, true] {
        let missing = catalog.check_required(boss_mode);
        results.push(TestResult::new(
            if boss_mode {
                "catalog_boss_requirements"
            } else {
                "catalog_normal_requirements"
            },
            missing.is_empty(),
            if missing.is_empty() {
                "all required templates present".to_string()
            } else {
                missing
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            },
        ));
    }

    // Rooms without connectors can never grow the layout
    let dead: Vec<&str> = catalog
        .rooms
        .iter()
        .filter(|t| t.connectors.is_empty())
        .map(|t| t.name.as_str())
        .collect();
    results.push(TestResult::new(
        "catalog_rooms_have_connectors",
        dead.is_empty(),
        if dead.is_empty() {
            format!("{} room templates", catalog.rooms.len())
        } else {
            format!("rooms without connectors: {}", dead.join(", "))
        },
    ));

    // Hallways attach by their first connector
    let no_entry: Vec<&str> = catalog
        .hallways
        .iter()
        .filter(|t| t.connectors.first().is_none())
        .map(|t| t.name.as_str())
        .collect();
    results.push(TestResult::new(
        "catalog_hallways_have_entry",
        no_entry.is_empty(),
        if no_entry.is_empty() {
            format!("{} hallway templates", catalog.hallways.len())
        } else {
            format!("hallways without an entry: {}", no_entry.join(", "))
        },
    ));

    // Connector forwards must be horizontal for yaw-only alignment
    let vertical: Vec<String> = catalog
        .rooms
        .iter()
        .chain(&catalog.hallways)
        .chain(&catalog.boss_room)
        .flat_map(|t| {
            t.connectors
                .iter()
                .filter(|c| Yaw::from_direction(c.forward).is_none())
                .map(move |c| format!("{}.{}", t.name, c.name))
        })
        .collect();
    results.push(TestResult::new(
        "catalog_horizontal_connectors",
        vertical.is_empty(),
        if vertical.is_empty() {
            "every connector faces sideways".to_string()
        } else {
            format!("vertical connectors: {}", vertical.join(", "))
        },
    ));

    if verbose {
        println!("  Templates:");
        for t in catalog.rooms.iter().chain(&catalog.hallways).chain(&catalog.boss_room) {
            println!(
                "    {:18} {} parts, {} connectors",
                t.name,
                t.parts.len(),
                t.connectors.len()
            );
        }
    }

    results
}

// ── 2. Normal Session Sweep ─────────────────────────────────────────────

fn sweep_sessions(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    args: &Args,
) -> (Vec<TestResult>, SweepStats, Option<LayoutSnapshot>) {
    println!("--- Normal Sessions ({} x {} rooms) ---", args.sessions, args.rooms);
    let mut results = Vec::new();
    let mut stats = SweepStats {
        sessions: args.sessions,
        min_modules: usize::MAX,
        ..Default::default()
    };
    let mut first_layout = None;
    let mut module_total = 0usize;
    let mut validation_failures = Vec::new();
    let mut quota_failures = Vec::new();
    let mut leaks = Vec::new();
    let mut unexpected = Vec::new();

    for i in 0..args.sessions {
        let seed = args.seed.wrapping_add(i as u64);
        let mut session = new_session(catalog, config, seed);
        let outcome = session.start(&SessionRequest::normal(args.rooms));
        stats.total_builds += session.reports().len() as u32;

        match outcome {
            Ok(summary) => {
                stats.succeeded += 1;
                module_total += summary.module_count;
                stats.min_modules = stats.min_modules.min(summary.module_count);
                stats.max_modules = stats.max_modules.max(summary.module_count);
                if let Some(last) = session.reports().last() {
                    stats.loops_closed += last.reconcile.loops_closed;
                    stats.caps_placed += last.reconcile.caps_placed;
                }

                if !config.meets_quota(summary.module_count, args.rooms) {
                    quota_failures.push(seed);
                }
                let Some(layout) = session.layout() else {
                    unexpected.push(format!("seed {seed}: success without layout"));
                    continue;
                };
                match LayoutSnapshot::capture(layout, Some(seed)) {
                    Ok(snapshot) => {
                        let errors: Vec<_> = snapshot
                            .validate(config, false)
                            .into_iter()
                            .filter(|e| e.severity == Severity::Error)
                            .collect();
                        if !errors.is_empty() {
                            validation_failures.push(format!("seed {seed}: {}", errors[0].message));
                        }
                        if first_layout.is_none() {
                            first_layout = Some(snapshot);
                        }
                    }
                    Err(e) => unexpected.push(format!("seed {seed}: {e}")),
                }
            }
            Err(SessionError::Exhausted { best, .. }) => {
                stats.failed += 1;
                log::warn!("Seed {seed} exhausted its attempts (best {best})");
                if session.allocated_entities() != 0 {
                    leaks.push(seed);
                }
            }
            Err(e) => unexpected.push(format!("seed {seed}: {e}")),
        }
    }

    if stats.succeeded > 0 {
        stats.mean_modules = module_total as f32 / stats.succeeded as f32;
    } else {
        stats.min_modules = 0;
    }

    results.push(TestResult::new(
        "sweep_no_unexpected_errors",
        unexpected.is_empty(),
        if unexpected.is_empty() {
            "every session succeeded or exhausted".to_string()
        } else {
            unexpected.join("; ")
        },
    ));
    results.push(TestResult::new(
        "sweep_success_rate",
        stats.succeeded * 10 >= args.sessions * 9,
        format!(
            "{}/{} sessions succeeded in {} builds",
            stats.succeeded, args.sessions, stats.total_builds
        ),
    ));
    results.push(TestResult::new(
        "sweep_quota_lower_bound",
        quota_failures.is_empty(),
        format!(
            "modules per layout {}..={} (mean {:.1}), quota {:.1}",
            stats.min_modules,
            stats.max_modules,
            stats.mean_modules,
            args.rooms as f32 * config.acceptance_ratio
        ),
    ));
    results.push(TestResult::new(
        "sweep_layouts_validate",
        validation_failures.is_empty(),
        if validation_failures.is_empty() {
            "connected, sealed and overlap-free".to_string()
        } else {
            validation_failures.join("; ")
        },
    ));
    results.push(TestResult::new(
        "sweep_failed_sessions_release_modules",
        leaks.is_empty(),
        format!("{} failed sessions, leaks on seeds {leaks:?}", stats.failed),
    ));

    if args.verbose {
        println!(
            "  Loops closed: {}, caps placed: {}",
            stats.loops_closed, stats.caps_placed
        );
    }

    (results, stats, first_layout)
}

// ── 3. Boss Session ─────────────────────────────────────────────────────

fn validate_boss_session(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    seed: u64,
) -> Vec<TestResult> {
    println!("--- Boss Session ---");
    let mut results = Vec::new();

    let mut session = new_session(catalog, config, seed);
    if let Err(e) = session.start(&SessionRequest::boss()) {
        results.push(TestResult::new("boss_session_starts", false, e.to_string()));
        return results;
    }
    let Some(layout) = session.layout() else {
        results.push(TestResult::new("boss_session_starts", false, "no layout"));
        return results;
    };

    let roles: Vec<ModuleRole> = layout
        .modules()
        .filter_map(|m| layout.module(m).map(|module| module.role))
        .collect();
    results.push(TestResult::new(
        "boss_single_module",
        roles == [ModuleRole::Boss],
        format!("roles {roles:?}"),
    ));
    results.push(TestResult::new(
        "boss_sealed",
        open_connector_count(layout) == 0,
        format!("{} caps placed", layout.caps().len()),
    ));
    results.push(TestResult::new(
        "boss_ready_signal",
        session.is_ready(),
        format!("{} bakes requested", session.baker().bakes),
    ));

    results
}

// ── 4. Faulty Catalogs ──────────────────────────────────────────────────

fn validate_faulty_catalogs(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    seed: u64,
) -> Vec<TestResult> {
    println!("--- Faulty Catalogs ---");
    let mut results = Vec::new();

    // A hallway with no connectors mixed into the catalog
    let mut broken = catalog.clone();
    broken.hallways.push(ModuleTemplate {
        name: "collapsed_hallway".into(),
        parts: vec![Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 4.0, 4.0))],
        connectors: Vec::new(),
    });
    let mut converged = 0;
    let mut wasted = 0;
    for i in 0..5 {
        let mut session = new_session(&broken, config, seed.wrapping_add(1000 + i));
        if session.start(&SessionRequest::normal(10)).is_ok() {
            converged += 1;
        }
        wasted += session
            .reports()
            .iter()
            .map(|r| r.malformed_hallways)
            .sum::<u32>();
    }
    results.push(TestResult::new(
        "malformed_hallway_converges",
        converged == 5,
        format!("{converged}/5 sessions succeeded, {wasted} attempts wasted"),
    ));

    // One-door rooms and straight hallways cannot reach a large target
    let starved = ModuleCatalog {
        rooms: catalog
            .rooms
            .iter()
            .filter(|t| t.connectors.len() == 1)
            .cloned()
            .collect(),
        hallways: catalog
            .hallways
            .iter()
            .filter(|t| t.connectors.len() == 2)
            .take(1)
            .cloned()
            .collect(),
        ..catalog.clone()
    };
    if starved.rooms.is_empty() || starved.hallways.is_empty() {
        results.push(TestResult::new(
            "starved_catalog_fails",
            true,
            "skipped: catalog has no one-door room",
        ));
        return results;
    }
    let mut session = new_session(&starved, config, seed);
    let outcome = session.start(&SessionRequest::normal(100));
    let exhausted = matches!(
        outcome,
        Err(SessionError::Exhausted { attempts, .. }) if attempts == config.max_session_attempts
    );
    results.push(TestResult::new(
        "starved_catalog_fails",
        exhausted && session.reports().len() as u32 == config.max_session_attempts,
        format!("{} builds, outcome {:?}", session.reports().len(), outcome.err()),
    ));
    results.push(TestResult::new(
        "starved_catalog_cleans_up",
        session.allocated_entities() == 0 && session.layout().is_none() && !session.is_ready(),
        format!("{} entities left", session.allocated_entities()),
    ));

    results
}

// ── 5. Loop Closure ─────────────────────────────────────────────────────

fn validate_loop_closure(catalog: &ModuleCatalog) -> Vec<TestResult> {
    println!("--- Loop Closure ---");
    let mut results = Vec::new();

    let Some(wall_cap) = &catalog.wall_cap else {
        results.push(TestResult::new("loop_closure", false, "no wall cap template"));
        return results;
    };

    let cell = |x: f32| {
        let mut m = ModuleInstance::new(
            "test_cell",
            ModuleRole::Normal,
            vec![Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 4.0, 2.0))],
            vec![
                ConnectorPoint::new("east", Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
                ConnectorPoint::new("west", Vec3::new(-2.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)),
            ],
        );
        m.set_pose(Pose::new(Vec3::new(x, 0.0, 0.0), Yaw::IDENTITY));
        m
    };

    let mut layout = DungeonLayout::new(2);
    let a = layout.place(cell(0.0), 0.95);
    let b = layout.place(cell(4.5), 0.95);
    let report = ConnectorReconciler::new(wall_cap, 1.0, 0.1).reconcile(&mut layout);

    let joined = [
        ConnectorRef { module: a, index: 0 },
        ConnectorRef { module: b, index: 1 },
    ]
    .iter()
    .all(|&at| {
        layout
            .connector(at)
            .is_some_and(|c| c.connected && !c.is_capped())
    });
    results.push(TestResult::new(
        "loop_closure_joins_dead_ends",
        joined && report.loops_closed == 1,
        format!("{} loops closed", report.loops_closed),
    ));
    results.push(TestResult::new(
        "loop_closure_caps_rest",
        report.caps_placed == 2 && open_connector_count(&layout) == 0,
        format!("{} caps placed", report.caps_placed),
    ));

    results
}

// ── 6. Progress & Options ───────────────────────────────────────────────

fn validate_progress(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    seed: u64,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Progress & Options ---");
    let mut results = Vec::new();

    let option = |name: &str, kind: UpgradeKind, min: u32, max: u32, is_boss: bool| DungeonOption {
        name: name.into(),
        upgrade: Upgrade {
            name: format!("{name} reward"),
            kind,
            value: 0.1,
        },
        room_count_min: min,
        room_count_max: max,
        is_boss,
    };
    let options = vec![
        option("ossuary", UpgradeKind::PlayerHealth, 8, 12, false),
        option("flooded_vault", UpgradeKind::GlobalDamage, 10, 14, false),
        option("bone_gallery", UpgradeKind::PlayerArmour, 12, 16, false),
        option("sunken_chapel", UpgradeKind::LifeRegenAdd, 8, 10, false),
        option("throne_of_ash", UpgradeKind::GlobalAttackSpeed, 1, 1, true),
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut progress = DungeonProgress::default();
    let mut regular_runs = 0;
    let mut boss_unlocked = false;
    let mut upgrades = 0;
    let mut problems = Vec::new();

    while !progress.is_boss_dungeon_available() && regular_runs < 10 {
        let offered = match offer_dungeons(&options, &progress, &mut rng) {
            Ok(offered) => offered,
            Err(e) => {
                problems.push(e.to_string());
                break;
            }
        };
        if offered.len() != OFFER_SLOTS || offered.iter().any(|&i| options[i].is_boss) {
            problems.push(format!("bad regular offer {offered:?}"));
        }
        let run = match choose_dungeon(&options[offered[0]], &mut rng) {
            Ok(run) => run,
            Err(e) => {
                problems.push(e.to_string());
                break;
            }
        };

        let request = SessionRequest::from_progress(&progress, Some(&run));
        let mut session = new_session(catalog, config, seed.wrapping_add(regular_runs));
        match session.start(&request) {
            Ok(summary) if verbose => println!(
                "  {} ({} rooms): {} modules",
                run.dungeon_name, run.room_count, summary.module_count
            ),
            Ok(_) => {}
            Err(e) => problems.push(format!("{}: {e}", run.dungeon_name)),
        }

        for event in progress.complete_dungeon(Some(&run)) {
            match event {
                ProgressEvent::BossDungeonAvailable => boss_unlocked = true,
                ProgressEvent::UpgradeGranted(_) => upgrades += 1,
                ProgressEvent::BossDungeonCompleted => problems.push("boss completed early".into()),
            }
        }
        regular_runs += 1;
    }

    results.push(TestResult::new(
        "progress_regular_runs",
        problems.is_empty() && upgrades == regular_runs,
        if problems.is_empty() {
            format!("{regular_runs} runs, {upgrades} upgrades granted")
        } else {
            problems.join("; ")
        },
    ));
    results.push(TestResult::new(
        "progress_boss_unlock",
        boss_unlocked && regular_runs == u64::from(progress.dungeons_needed_for_boss()),
        format!("boss unlocked after {regular_runs} dungeons"),
    ));

    let boss_offer = offer_dungeons(&options, &progress, &mut rng).unwrap_or_default();
    results.push(TestResult::new(
        "progress_boss_offer",
        boss_offer.len() == OFFER_SLOTS && boss_offer.iter().all(|&i| options[i].is_boss),
        format!("offered {boss_offer:?}"),
    ));

    let request = SessionRequest::from_progress(&progress, None);
    let mut session = new_session(catalog, config, seed);
    let boss_ok = request.boss_mode
        && session.start(&request).is_ok()
        && session.layout().is_some_and(|l| l.module_count() == 1);
    let completed = progress
        .complete_dungeon(None)
        .contains(&ProgressEvent::BossDungeonCompleted);
    results.push(TestResult::new(
        "progress_boss_session",
        boss_ok && completed,
        format!("boss mode {}, boss completed {completed}", request.boss_mode),
    ));

    results
}

// ── 7. Lighting ─────────────────────────────────────────────────────────

fn validate_lighting(
    catalog: &ModuleCatalog,
    config: &GenerationConfig,
    seed: u64,
) -> Vec<TestResult> {
    println!("--- Lighting ---");
    let mut results = Vec::new();

    let mut session = new_session(catalog, config, seed);
    if let Err(e) = session.start(&SessionRequest::normal(12)) {
        results.push(TestResult::new("lighting_layout", false, e.to_string()));
        return results;
    }
    let Some(layout) = session.layout() else {
        results.push(TestResult::new("lighting_layout", false, "no layout"));
        return results;
    };

    let lamp_config = LampConfig::default();
    let config_errors = validate_lamp_config(&lamp_config);
    results.push(TestResult::new(
        "lighting_config_valid",
        config_errors.is_empty(),
        format!("{config_errors:?}"),
    ));
    let floor = layout_floor(layout);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let planned = plan_layout_lamps(layout, &lamp_config, &floor, &mut rng);

    let total: usize = planned.iter().map(|m| m.lamps.len()).sum();
    results.push(TestResult::new(
        "lighting_every_module_planned",
        planned.len() == layout.module_count() && total > 0,
        format!("{total} lamps across {} modules", planned.len()),
    ));

    let outside: usize = planned
        .iter()
        .filter_map(|m| layout.footprint(m.module).map(|f| (f.geometry, &m.lamps)))
        .map(|(geometry, lamps)| lamps.iter().filter(|l| !geometry.contains(&l.position)).count())
        .sum();
    results.push(TestResult::new(
        "lighting_lamps_inside_modules",
        outside == 0,
        format!("{outside} lamps outside their module"),
    ));

    results
}
