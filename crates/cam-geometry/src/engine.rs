//! `Engine`: the core's one stateful entry point (spec §5, §6).
//!
//! Replaces the source system's `window.globalCurveRegistry` and ambient
//! `PCBCAMConfig` with an explicit context a caller owns and passes calls
//! through (§9 REDESIGN FLAGS), grounded on `cadhy_cad::shape::Shape`'s
//! discipline of documenting its threading invariant inline rather than
//! leaving it implicit, and on the teacher's `OnceLock`-backed
//! `GLOBAL_CONFIG` (`cadhy_cad::config`) for the one-shot init shape — swapped
//! for an explicit state field and `async fn` since our init can fail and is
//! re-checked on every call (`ensure_ready`) rather than read once.
//!
//! The engine is single-threaded cooperative (spec §5): every public call is
//! `async fn` for API stability against a future solver needing real
//! asynchronous init, but `geo`/`geo-buf` are synchronous pure-Rust, so
//! nothing here actually suspends. A caller awaits each call in turn; there
//! is no internal locking because there is no concurrent access to guard
//! against.

use std::collections::HashMap;

use crate::boolean::{self, FuseResult};
use crate::config::{EngineConfig, FillRule};
use crate::error::{CamGeometryError, CamResult, Warning};
use crate::offset;
use crate::primitives::{Path, Primitive};
use crate::registry::{CurveRegistry, RegistryStats};

const SLOT_FUSED_GEOMETRY: &str = "fusedGeometry";
const SLOT_PREPROCESSED_GEOMETRY: &str = "preprocessedGeometry";

/// Content fingerprint of an input primitive set (spec §3.5/§4.D), grounded
/// on `bubbasadiq-Qutlas-dt/wasm/geometry-kernel`'s `hashing.rs`. Hashes each
/// primitive's scaled integer bounds and polarity tag in order, so the same
/// set fused twice at the same scale produces the same fingerprint without
/// re-running tessellation just to compute it.
fn content_fingerprint(primitives: &[Primitive], scale: i64) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for primitive in primitives {
        let bounds = primitive.bounds();
        for v in [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y] {
            hasher.update(&((v * scale as f64).round() as i64).to_le_bytes());
        }
        hasher.update(&[primitive.properties().polarity as u8]);
    }
    hasher.finalize()
}

/// `Uninit -> Initializing -> Ready | Failed` (spec §5 "Scheduling model").
/// `Failed` is terminal; a caller that hits it must build a new `Engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninit,
    Initializing,
    Ready,
    Failed,
}

/// Scoped acquisition for an in-flight solver call (spec §5 "Resource
/// acquisition": "every solver object...is acquired inside a scoped
/// acquisition that releases on all exit paths"). Decrements
/// `Engine::active_handles` on drop regardless of whether the call that
/// created it returned `Ok` or propagated an error with `?`.
struct ResolverGuard<'a> {
    active: &'a mut usize,
}

impl<'a> ResolverGuard<'a> {
    fn new(active: &'a mut usize) -> Self {
        *active += 1;
        Self { active }
    }
}

impl Drop for ResolverGuard<'_> {
    fn drop(&mut self) {
        *self.active -= 1;
    }
}

/// The core's single stateful object (spec §6 "External interfaces"). Not
/// `Clone`; callers share it the same way they'd share any owned resource
/// with an explicit lifetime, rather than reaching for interior mutability
/// a single-threaded engine has no use for.
pub struct Engine {
    state: EngineState,
    config: EngineConfig,
    registry: CurveRegistry,
    cache: HashMap<String, Vec<Path>>,
    active_handles: usize,
    fused_fingerprint: Option<blake3::Hash>,
    /// The input to the most recent `fuse()` call. When it was a single
    /// analytically-offsettable primitive, `generate_offset` tries §4.E.1's
    /// fast path against it directly instead of the tessellated `Path` —
    /// the only way a plain `Rectangle`'s sharp corners can come back
    /// rounded, since rectangles register no curve for the general buffer-
    /// and-recover path to match against.
    last_fuse_primitives: Vec<Primitive>,
    /// Warnings raised at `initialize` time (currently only a tangency
    /// epsilon clamp) that have no call of their own to ride along with —
    /// spliced onto the front of the next `fuse()`'s warnings instead of
    /// being silently dropped.
    pending_warnings: Vec<Warning>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            state: EngineState::Uninit,
            config: EngineConfig::default(),
            registry: CurveRegistry::new(),
            cache: HashMap::new(),
            active_handles: 0,
            fused_fingerprint: None,
            last_fuse_primitives: Vec::new(),
            pending_warnings: Vec::new(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Every public entry but `initialize` itself calls this first (spec §5
    /// "Suspension points"). Cheap and synchronous since there's nothing
    /// left to await once `Ready` — the one real suspension point is
    /// `initialize`.
    fn ensure_ready(&self) -> CamResult<()> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Uninit | EngineState::Initializing => Err(CamGeometryError::SolverUnavailable("engine has not completed initialize()".to_string())),
            EngineState::Failed => Err(CamGeometryError::SolverUnavailable("engine failed to initialize; construct a new Engine".to_string())),
        }
    }

    /// One-shot init (spec §6). Idempotent once `Ready`; validates `config`
    /// before committing it, transitioning to `Failed` on an invalid scale
    /// rather than leaving the engine stuck `Initializing`. A `tangency_epsilon`
    /// outside `[10, 1000]` isn't fatal the way a bad scale is — it's clamped
    /// into range and recorded as a pending `Warning::TangencyEpsilonClamped`,
    /// surfaced on the next `fuse()` call.
    pub async fn initialize(&mut self, mut config: EngineConfig) -> CamResult<()> {
        if self.state == EngineState::Ready {
            return Ok(());
        }
        self.state = EngineState::Initializing;

        let clamped_scale = crate::config::clamp_scale(config.scale);
        if clamped_scale != config.scale {
            self.state = EngineState::Failed;
            return Err(CamGeometryError::InvalidConfig(format!("scale {} is outside the supported range [1000, 1000000]", config.scale)));
        }

        let clamped_epsilon = crate::config::clamp_tangency_epsilon(config.tangency_epsilon);
        if clamped_epsilon != config.tangency_epsilon {
            tracing::warn!(requested = config.tangency_epsilon, clamped = clamped_epsilon, "tangency epsilon out of range, clamping");
            self.pending_warnings.push(Warning::TangencyEpsilonClamped {
                requested: config.tangency_epsilon as f64,
                clamped: clamped_epsilon as f64,
            });
            config.tangency_epsilon = clamped_epsilon;
        }

        tracing::info!(scale = config.scale, fill_rule = ?config.fill_rule, "initializing CAM geometry engine");
        self.config = config;
        self.state = EngineState::Ready;
        Ok(())
    }

    /// `fuse(primitives[], options)` (spec §6). Caches its result under
    /// `"fusedGeometry"`, keyed on a content fingerprint of the input set so
    /// an identical call (same primitives, same scale) returns the cached
    /// geometry instead of re-running the solver.
    pub async fn fuse(&mut self, primitives: &[Primitive], fill_rule: FillRule) -> CamResult<FuseResult> {
        self.ensure_ready()?;
        let fingerprint = content_fingerprint(primitives, self.config.scale);
        if self.fused_fingerprint == Some(fingerprint) {
            if let Some(cached) = self.cache.get(SLOT_FUSED_GEOMETRY) {
                tracing::debug!("fuse cache hit");
                return Ok(FuseResult {
                    paths: cached.clone(),
                    warnings: Vec::new(),
                });
            }
        }

        let _guard = ResolverGuard::new(&mut self.active_handles);
        let mut result = boolean::fuse(primitives, fill_rule, &self.config, &mut self.registry)?;
        result.warnings.splice(0..0, self.pending_warnings.drain(..));
        tracing::debug!(paths = result.paths.len(), warnings = result.warnings.len(), "fuse complete");
        self.cache.insert(SLOT_FUSED_GEOMETRY.to_string(), result.paths.clone());
        self.fused_fingerprint = Some(fingerprint);
        self.last_fuse_primitives = primitives.to_vec();
        Ok(result)
    }

    /// `prepare_offset(fused[])` (spec §6). The general offset path doesn't
    /// need extra precomputation beyond the fused geometry itself — the
    /// scale/buffer work happens inside `generate_offset` — so the
    /// "preprocessed handle" here is the fused set, cached under
    /// `"preprocessedGeometry"` and returned for the caller to thread
    /// through to `generate_offset`.
    pub async fn prepare_offset(&mut self, fused: &[Path]) -> CamResult<Vec<Path>> {
        self.ensure_ready()?;
        if fused.is_empty() {
            return Err(CamGeometryError::InvalidPrimitive("prepare_offset called with no fused geometry".to_string()));
        }
        let _guard = ResolverGuard::new(&mut self.active_handles);
        let preprocessed = fused.to_vec();
        self.cache.insert(SLOT_PREPROCESSED_GEOMETRY.to_string(), preprocessed.clone());
        Ok(preprocessed)
    }

    /// `generate_offset(preprocessed, distance, options)` (spec §6). Runs
    /// every preprocessed path through [`crate::offset::generate_offset`]
    /// and flattens the results.
    pub async fn generate_offset(&mut self, preprocessed: &[Path], stepover: f64, passes: u32) -> CamResult<Vec<Path>> {
        self.ensure_ready()?;
        let _guard = ResolverGuard::new(&mut self.active_handles);

        let preprocessed_is_current_fuse = self.cache.get(SLOT_PREPROCESSED_GEOMETRY).map(|c| c.as_slice() == preprocessed).unwrap_or(false);
        if preprocessed_is_current_fuse {
            if let [original] = self.last_fuse_primitives.as_slice() {
                if let Some(result) = offset::generate_offset_analytic(original, stepover, passes, &self.config, &mut self.registry)? {
                    tracing::debug!(paths = result.len(), "generate_offset used the analytic fast path");
                    return Ok(result);
                }
            }
        }

        let mut result = Vec::new();
        for path in preprocessed {
            result.extend(offset::generate_offset(path, stepover, passes, &self.config, &mut self.registry)?);
        }
        tracing::debug!(paths = result.len(), "generate_offset complete");
        Ok(result)
    }

    /// `get_cached(slot_name)` (spec §6): `"preprocessedGeometry"` or
    /// `"fusedGeometry"`; any other name returns `None` rather than an
    /// error, matching the spec's "stored primitives or null".
    pub fn get_cached(&self, slot_name: &str) -> Option<&Vec<Path>> {
        self.cache.get(slot_name)
    }

    /// `get_arc_reconstruction_stats()` (spec §6).
    pub fn get_arc_reconstruction_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// `cleanup()` (spec §6, §5 "a reference count is maintained for the
    /// engine itself; `destroy()` is idempotent"). Clears every cache slot
    /// and the curve registry, returning how many primitives/curves were
    /// released. Calling it twice in a row is safe and returns `0` the
    /// second time.
    pub fn cleanup(&mut self) -> usize {
        let cached: usize = self.cache.values().map(|v| v.len()).sum();
        let registered = self.registry.stats().size;
        self.cache.clear();
        self.registry.clear();
        self.active_handles = 0;
        self.fused_fingerprint = None;
        cached + registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Circle, Polarity, Properties};
    use cam_core::Point;

    fn dark_circle(radius: f64) -> Primitive {
        Primitive::Circle(Circle::new(Point::ZERO, radius, Properties::new(Polarity::Dark)).unwrap())
    }

    #[tokio::test]
    async fn calls_before_initialize_are_rejected() {
        let mut engine = Engine::new();
        let result = engine.fuse(&[dark_circle(1.0)], FillRule::NonZero).await;
        assert!(matches!(result, Err(CamGeometryError::SolverUnavailable(_))));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let mut engine = Engine::new();
        engine.initialize(EngineConfig::default()).await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
        engine.initialize(EngineConfig::default()).await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn invalid_scale_fails_the_engine() {
        let mut engine = Engine::new();
        let mut config = EngineConfig::default();
        config.scale = 1;
        let result = engine.initialize(config).await;
        assert!(result.is_err());
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[tokio::test]
    async fn out_of_range_tangency_epsilon_is_clamped_and_warned() {
        let mut engine = Engine::new();
        let mut config = EngineConfig::default();
        config.tangency_epsilon = 5_000;
        engine.initialize(config).await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);

        let result = engine.fuse(&[dark_circle(1.0)], FillRule::NonZero).await.unwrap();
        assert!(result.warnings.iter().any(|w| matches!(w, Warning::TangencyEpsilonClamped { .. })));
    }

    #[tokio::test]
    async fn full_fuse_prepare_offset_round_trip() {
        let mut engine = Engine::new();
        engine.initialize(EngineConfig::default()).await.unwrap();

        let fused = engine.fuse(&[dark_circle(5.0)], FillRule::NonZero).await.unwrap().paths;
        assert_eq!(fused.len(), 1);
        assert_eq!(engine.get_cached("fusedGeometry").unwrap().len(), 1);

        let preprocessed = engine.prepare_offset(&fused).await.unwrap();
        assert_eq!(engine.get_cached("preprocessedGeometry").unwrap().len(), 1);

        let offset_paths = engine.generate_offset(&preprocessed, 1.0, 1).await.unwrap();
        assert_eq!(offset_paths.len(), 1);

        let stats = engine.get_arc_reconstruction_stats();
        assert!(stats.curves_registered > 0);

        let released = engine.cleanup();
        assert!(released > 0);
        assert_eq!(engine.cleanup(), 0);
    }

    #[tokio::test]
    async fn prepare_offset_rejects_empty_input() {
        let mut engine = Engine::new();
        engine.initialize(EngineConfig::default()).await.unwrap();
        let result = engine.prepare_offset(&[]).await;
        assert!(matches!(result, Err(CamGeometryError::InvalidPrimitive(_))));
    }

    #[tokio::test]
    async fn get_cached_of_unknown_slot_is_none() {
        let mut engine = Engine::new();
        engine.initialize(EngineConfig::default()).await.unwrap();
        assert!(engine.get_cached("not-a-real-slot").is_none());
    }

    #[tokio::test]
    async fn fusing_the_same_primitives_twice_hits_the_cache() {
        let mut engine = Engine::new();
        engine.initialize(EngineConfig::default()).await.unwrap();

        let first = engine.fuse(&[dark_circle(3.0)], FillRule::NonZero).await.unwrap().paths;
        let registered_after_first = engine.get_arc_reconstruction_stats().curves_registered;

        let second = engine.fuse(&[dark_circle(3.0)], FillRule::NonZero).await.unwrap().paths;
        assert_eq!(first, second);
        assert_eq!(engine.get_arc_reconstruction_stats().curves_registered, registered_after_first);
    }
}
