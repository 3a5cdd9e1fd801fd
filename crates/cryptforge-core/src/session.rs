//! Dungeon session control: mode selection, whole-build retries, bake handoff.
//!
//! A session runs once per dungeon entry. Normal sessions rebuild the layout
//! from scratch until one reaches the acceptance quota or the retry budget is
//! spent; boss sessions place the single boss room. A successful layout is
//! handed to the [`NavMeshBaker`], and once the bake completes every
//! registered listener is told the layout is ready, exactly once.
//!
//! ```
//! use cryptforge_core::generation::ModuleCatalog;
//! use cryptforge_core::session::{DungeonSession, ImmediateBaker, SessionRequest};
//! use cryptforge_logic::config::GenerationConfig;
//!
//! let catalog = ModuleCatalog::standard().unwrap();
//! let config = GenerationConfig { seed: Some(11), ..Default::default() };
//! let mut session = DungeonSession::new(catalog, config, ImmediateBaker::default());
//! session.start(&SessionRequest::normal(10)).unwrap();
//! assert!(session.is_ready());
//! assert!(session.layout().is_some());
//! ```

use cryptforge_logic::config::{validate_config, ConfigError, GenerationConfig};
use cryptforge_logic::options::DungeonRun;
use cryptforge_logic::progress::DungeonProgress;
use cryptforge_logic::rng::session_rng;
use rand::Rng;
use thiserror::Error;

use crate::components::ModuleRole;
use crate::generation::{
    BuildReport, CatalogError, ConnectorReconciler, DungeonGraphBuilder, ModuleCatalog,
};
use crate::layout::DungeonLayout;

// ── Nav mesh handoff ────────────────────────────────────────────────────

/// Progress of a requested bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeStatus {
    Pending,
    Complete,
}

#[derive(Debug, Error)]
pub enum BakeError {
    #[error("nav mesh bake rejected: {0}")]
    Rejected(String),
}

/// External navigation-mesh baker.
///
/// `request_bake` is called once per successful layout; `poll` is called
/// until it reports [`BakeStatus::Complete`].
pub trait NavMeshBaker {
    fn request_bake(&mut self, layout: &DungeonLayout) -> Result<(), BakeError>;
    fn poll(&mut self) -> BakeStatus;
}

/// Baker that completes on the first poll.
#[derive(Debug, Default)]
pub struct ImmediateBaker {
    /// Bakes requested so far
    pub bakes: u32,
    /// Module count of the last layout handed over
    pub last_module_count: usize,
    /// Bake requested and not yet polled
    pub pending: bool,
}

impl NavMeshBaker for ImmediateBaker {
    fn request_bake(&mut self, layout: &DungeonLayout) -> Result<(), BakeError> {
        self.bakes += 1;
        self.last_module_count = layout.module_count();
        self.pending = true;
        Ok(())
    }

    fn poll(&mut self) -> BakeStatus {
        self.pending = false;
        BakeStatus::Complete
    }
}

// ── Requests and state ──────────────────────────────────────────────────

/// Per-session inputs supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRequest {
    /// Target module count; `None` uses the configured default
    pub room_count: Option<u32>,
    pub boss_mode: bool,
}

impl SessionRequest {
    pub fn normal(room_count: u32) -> Self {
        Self {
            room_count: Some(room_count),
            boss_mode: false,
        }
    }

    pub fn boss() -> Self {
        Self {
            room_count: None,
            boss_mode: true,
        }
    }

    /// Boss mode once the boss dungeon is open, even after it is cleared;
    /// room count from the chosen run.
    pub fn from_progress(progress: &DungeonProgress, run: Option<&DungeonRun>) -> Self {
        Self {
            room_count: run.map(|r| r.room_count),
            boss_mode: progress.is_boss_dungeon_available(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Building { attempt: u32 },
    Retrying { attempt: u32 },
    Success,
    Failed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already started; reset it first")]
    AlreadyStarted,
    #[error("invalid generation config: {0:?}")]
    Config(Vec<ConfigError>),
    #[error("target room count must be at least 1")]
    ZeroTarget,
    #[error("catalog is missing required templates: {0:?}")]
    Catalog(Vec<CatalogError>),
    #[error("no layout reached {needed:.1} modules in {attempts} attempts (best was {best})")]
    Exhausted {
        attempts: u32,
        needed: f32,
        best: usize,
    },
    #[error(transparent)]
    Bake(#[from] BakeError),
}

/// Result of a successful start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub seed: u64,
    pub boss_mode: bool,
    /// Builds run (1 in boss mode)
    pub attempts: u32,
    pub module_count: usize,
    /// Whether the ready signal has already fired
    pub ready: bool,
}

// ── Session ─────────────────────────────────────────────────────────────

/// Drives one dungeon session from request to layout-ready signal.
pub struct DungeonSession<B: NavMeshBaker = ImmediateBaker> {
    catalog: ModuleCatalog,
    config: GenerationConfig,
    baker: B,
    state: SessionState,
    layout: DungeonLayout,
    reports: Vec<BuildReport>,
    seed: Option<u64>,
    boss_mode: bool,
    bake_pending: bool,
    ready_fired: bool,
    listeners: Vec<Box<dyn FnMut()>>,
}

impl<B: NavMeshBaker> DungeonSession<B> {
    pub fn new(catalog: ModuleCatalog, config: GenerationConfig, baker: B) -> Self {
        Self {
            catalog,
            config,
            baker,
            state: SessionState::Idle,
            layout: DungeonLayout::default(),
            reports: Vec::new(),
            seed: None,
            boss_mode: false,
            bake_pending: false,
            ready_fired: false,
            listeners: Vec::new(),
        }
    }

    /// Register a zero-argument "layout ready" listener.
    ///
    /// Listeners stay registered across [`reset`](Self::reset).
    pub fn on_layout_ready(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run the session. Blocks only for generation; the bake may still be
    /// pending when this returns (see [`poll`](Self::poll)).
    pub fn start(&mut self, request: &SessionRequest) -> Result<SessionSummary, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        let config_errors = validate_config(&self.config);
        if !config_errors.is_empty() {
            log::error!("Generation config rejected: {config_errors:?}");
            self.state = SessionState::Failed;
            return Err(SessionError::Config(config_errors));
        }

        let missing = self.catalog.check_required(request.boss_mode);
        if !missing.is_empty() {
            for e in &missing {
                log::error!("Dungeon session aborted: {e}");
            }
            self.state = SessionState::Failed;
            return Err(SessionError::Catalog(missing));
        }

        let (mut rng, seed) = session_rng(self.config.seed);
        self.seed = Some(seed);
        self.boss_mode = request.boss_mode;

        let attempts = if request.boss_mode {
            log::info!("Dungeon session starting in boss mode (seed {seed})");
            self.place_boss_room()?;
            1
        } else {
            let target = request.room_count.unwrap_or(self.config.default_room_count);
            if target == 0 {
                self.state = SessionState::Failed;
                return Err(SessionError::ZeroTarget);
            }
            log::info!("Dungeon session starting: target {target} modules (seed {seed})");
            self.build_with_retries(target, &mut rng)?
        };

        if let Err(e) = self.baker.request_bake(&self.layout) {
            log::warn!("Dungeon session failed: {e}");
            self.fail();
            return Err(e.into());
        }
        self.bake_pending = true;
        let ready = self.poll();

        Ok(SessionSummary {
            seed,
            boss_mode: self.boss_mode,
            attempts,
            module_count: self.layout.module_count(),
            ready,
        })
    }

    /// Check on the bake; fires the ready signal when it completes.
    ///
    /// Returns whether the layout is ready.
    pub fn poll(&mut self) -> bool {
        if self.ready_fired {
            return true;
        }
        if self.state != SessionState::Success || !self.bake_pending {
            return false;
        }
        match self.baker.poll() {
            BakeStatus::Pending => false,
            BakeStatus::Complete => {
                self.bake_pending = false;
                self.ready_fired = true;
                log::info!(
                    "Dungeon layout ready: {} rooms, {} hallways, {} caps",
                    self.layout.rooms().len(),
                    self.layout.hallways().len(),
                    self.layout.caps().len()
                );
                for listener in &mut self.listeners {
                    listener();
                }
                true
            }
        }
    }

    fn place_boss_room(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Building { attempt: 1 };
        self.layout.reset(1);

        let (Some(boss), Some(wall_cap)) = (&self.catalog.boss_room, &self.catalog.wall_cap) else {
            self.state = SessionState::Failed;
            return Err(SessionError::Catalog(self.catalog.check_required(true)));
        };
        let room = self
            .layout
            .place(boss.instantiate(ModuleRole::Boss), self.config.bounds_shrink);
        let caps = ConnectorReconciler::new(
            wall_cap,
            self.config.loop_closure_distance,
            self.config.cap_inset,
        )
        .cap_open(&mut self.layout, &[room]);

        log::info!("Boss room `{}` placed with {caps} capped connectors", boss.name);
        self.state = SessionState::Success;
        Ok(())
    }

    fn build_with_retries<R: Rng + ?Sized>(
        &mut self,
        target: u32,
        rng: &mut R,
    ) -> Result<u32, SessionError> {
        let builder = DungeonGraphBuilder::new(&self.catalog, &self.config);
        let max = self.config.max_session_attempts;
        let mut best = 0;

        for attempt in 1..=max {
            self.state = SessionState::Building { attempt };
            self.layout.reset(target);
            let report = match builder.build(&mut self.layout, rng) {
                Ok(report) => report,
                Err(e) => {
                    log::error!("Dungeon session aborted: {e}");
                    self.layout.clear();
                    self.state = SessionState::Failed;
                    return Err(SessionError::Catalog(vec![e]));
                }
            };
            self.reports.push(report);

            let placed = self.layout.module_count();
            best = best.max(placed);
            if self.config.meets_quota(placed, target) {
                log::info!("Layout accepted on attempt {attempt}: {placed}/{target} modules");
                self.state = SessionState::Success;
                return Ok(attempt);
            }

            log::info!("Attempt {attempt}/{max} placed {placed}/{target} modules, retrying");
            self.state = SessionState::Retrying { attempt };
            self.layout.clear();
        }

        let needed = target as f32 * self.config.acceptance_ratio;
        log::warn!("Dungeon session failed: {max} attempts, best {best}/{target} modules");
        self.fail();
        Err(SessionError::Exhausted {
            attempts: max,
            needed,
            best,
        })
    }

    fn fail(&mut self) {
        self.layout.clear();
        self.bake_pending = false;
        self.state = SessionState::Failed;
    }

    /// Drop the layout and return to `Idle`. Listeners are kept.
    pub fn reset(&mut self) {
        self.layout.clear();
        self.reports.clear();
        self.state = SessionState::Idle;
        self.seed = None;
        self.boss_mode = false;
        self.bake_pending = false;
        self.ready_fired = false;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The finished layout; only available after a successful session.
    pub fn layout(&self) -> Option<&DungeonLayout> {
        (self.state == SessionState::Success).then_some(&self.layout)
    }

    pub fn is_ready(&self) -> bool {
        self.ready_fired
    }

    pub fn is_boss_mode(&self) -> bool {
        self.boss_mode
    }

    /// Seed used by the current session.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// One report per build run in this session.
    pub fn reports(&self) -> &[BuildReport] {
        &self.reports
    }

    /// Live entities held by the session's arena.
    pub fn allocated_entities(&self) -> u32 {
        self.layout.entity_count()
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn baker(&self) -> &B {
        &self.baker
    }

    pub fn baker_mut(&mut self) -> &mut B {
        &mut self.baker
    }
}
