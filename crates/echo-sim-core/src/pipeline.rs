//! Phase pipeline: composes a tick's fixed phase order, running serial and
//! parallel groups with cooperative cancellation polled at group
//! boundaries.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::arena::ArenaError;
use crate::reconciliation::ReconciliationError;
use crate::registry::RegistryError;
use crate::wave::WaveResult;

/// Errors a [`Phase`] may report. A phase erroring does not stop the tick —
/// the owning [`Pipeline`] records it on the [`TickReport`] and continues
/// with the next phase, since later phases (notably Cleanup) must still run
/// even if an earlier one failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The tick was canceled via [`CancelToken::cancel`] before this phase
    /// ran.
    #[error("tick canceled before phase ran")]
    Canceled,
    /// An arena operation failed inside a phase.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// A registry operation failed inside a phase.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Reconciliation detected a dependency cycle.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
}

/// Cooperative cancellation flag, polled between phase/group boundaries —
/// never inside one, since a phase already running is allowed to finish its
/// own unit of work.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncanceled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed the next time a group boundary polls
    /// it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-tick execution context threaded through every phase.
#[derive(Clone)]
pub struct SystemContext {
    /// Ticks elapsed since the previous `run_tick` call (usually 1; larger
    /// on a catch-up/fast-forward step).
    pub delta_ticks: u32,
    /// Monotonic tick counter, starting at 1 for the first call to
    /// [`Pipeline::run_tick`].
    pub current_tick: u64,
    /// Cancellation flag for this tick.
    pub cancel: CancelToken,
}

/// One unit of per-tick work. Implementations are provided by the embedding
/// game; this crate only defines the composition and ordering around them.
pub trait Phase: Send + Sync {
    /// Human-readable name used in [`TickReport`] diagnostics.
    fn name(&self) -> &'static str;

    /// Runs this phase's work for the current tick.
    fn run(&self, ctx: &SystemContext) -> Result<(), PipelineError>;
}

/// Runs child phases one after another, polling `ctx.cancel` before each
/// one and short-circuiting the remaining children (but not the group
/// itself, which always returns `Ok`, since a canceled run is not an error
/// for sibling phases further up the tree) once cancellation is observed.
pub struct SerialGroup {
    name: &'static str,
    phases: Vec<Box<dyn Phase>>,
}

impl SerialGroup {
    /// Creates a named serial group over `phases`, run in the given order.
    #[must_use]
    pub fn new(name: &'static str, phases: Vec<Box<dyn Phase>>) -> Self {
        Self { name, phases }
    }
}

impl Phase for SerialGroup {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, ctx: &SystemContext) -> Result<(), PipelineError> {
        for phase in &self.phases {
            if ctx.cancel.is_canceled() {
                debug!(group = self.name, phase = phase.name(), "tick canceled, skipping remainder of group");
                return Ok(());
            }
            let result = phase.run(ctx);
            crate::telemetry::phase_changed(ctx.current_tick, phase.name(), result.is_err());
            if let Err(err) = result {
                warn!(group = self.name, phase = phase.name(), error = %err, "phase failed");
            }
        }
        Ok(())
    }
}

/// Runs child phases concurrently over a rayon scope. Cancellation is
/// checked once before the group dispatches its children, never partway
/// through — an in-flight parallel batch always finishes together, which is
/// what "polled at group boundaries" means for this group kind.
pub struct ParallelGroup {
    name: &'static str,
    phases: Vec<Box<dyn Phase>>,
}

impl ParallelGroup {
    /// Creates a named parallel group over `phases`, dispatched concurrently
    /// via rayon.
    #[must_use]
    pub fn new(name: &'static str, phases: Vec<Box<dyn Phase>>) -> Self {
        Self { name, phases }
    }
}

impl Phase for ParallelGroup {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, ctx: &SystemContext) -> Result<(), PipelineError> {
        if ctx.cancel.is_canceled() {
            debug!(group = self.name, "tick canceled before parallel group started");
            return Ok(());
        }
        self.phases.par_iter().for_each(|phase| {
            let result = phase.run(ctx);
            crate::telemetry::phase_changed(ctx.current_tick, phase.name(), result.is_err());
            if let Err(err) = result {
                warn!(group = self.name, phase = phase.name(), error = %err, "phase failed");
            }
        });
        Ok(())
    }
}

/// Marker names for the six fixed tick phases, in their mandatory
/// execution order. Exposed for diagnostics; the order itself is enforced
/// by [`PipelineBuilder`] accepting each phase positionally rather than as
/// an arbitrary list.
pub mod canonical {
    /// Collision detection and overlap reporting.
    pub const COLLISION: &str = "collision";
    /// Message wave cascade processing.
    pub const MESSAGE: &str = "message";
    /// Action selection.
    pub const DECISION: &str = "decision";
    /// Action state machine advancement.
    pub const EXECUTION: &str = "execution";
    /// Dependency-ordered resolution and push-out.
    pub const RECONCILIATION: &str = "reconciliation";
    /// Deferred deletion sweep and end-of-tick bookkeeping.
    pub const CLEANUP: &str = "cleanup";
}

/// Wraps a single phase implementation under one of the six canonical
/// names, forwarding `run` unchanged.
macro_rules! canonical_phase {
    ($ident:ident, $name_const:path) => {
        #[doc = concat!("The `", stringify!($ident), "` slot of the canonical tick order.")]
        pub struct $ident(Box<dyn Phase>);

        impl $ident {
            /// Wraps `inner` as this canonical phase.
            #[must_use]
            pub fn new(inner: Box<dyn Phase>) -> Self {
                Self(inner)
            }
        }

        impl Phase for $ident {
            fn name(&self) -> &'static str {
                $name_const
            }

            fn run(&self, ctx: &SystemContext) -> Result<(), PipelineError> {
                self.0.run(ctx)
            }
        }
    };
}

canonical_phase!(CollisionPhase, canonical::COLLISION);
canonical_phase!(MessagePhase, canonical::MESSAGE);
canonical_phase!(DecisionPhase, canonical::DECISION);
canonical_phase!(ExecutionPhase, canonical::EXECUTION);
canonical_phase!(ReconciliationPhase, canonical::RECONCILIATION);
canonical_phase!(CleanupPhase, canonical::CLEANUP);

/// Assembles the six canonical phases into a fixed-order [`SerialGroup`],
/// making it impossible to construct a [`Pipeline`] with the phases out of
/// order or with one missing.
pub struct PipelineBuilder {
    collision: CollisionPhase,
    message: MessagePhase,
    decision: DecisionPhase,
    execution: ExecutionPhase,
    reconciliation: ReconciliationPhase,
    cleanup: CleanupPhase,
}

impl PipelineBuilder {
    /// Starts a builder; every phase must be supplied before
    /// [`Self::build`].
    #[must_use]
    pub fn new(
        collision: CollisionPhase,
        message: MessagePhase,
        decision: DecisionPhase,
        execution: ExecutionPhase,
        reconciliation: ReconciliationPhase,
        cleanup: CleanupPhase,
    ) -> Self {
        Self {
            collision,
            message,
            decision,
            execution,
            reconciliation,
            cleanup,
        }
    }

    /// Builds the fixed-order root phase for a [`Pipeline`].
    #[must_use]
    pub fn build(self) -> SerialGroup {
        SerialGroup::new(
            "tick",
            vec![
                Box::new(self.collision),
                Box::new(self.message),
                Box::new(self.decision),
                Box::new(self.execution),
                Box::new(self.reconciliation),
                Box::new(self.cleanup),
            ],
        )
    }
}

/// Runtime configuration for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Worker thread count for parallel groups and selector sharding.
    /// `None` lets rayon pick based on available parallelism.
    pub worker_threads: Option<usize>,
    /// Maximum message wave cascade depth per tick before aborting as
    /// [`WaveResult::DepthExceeded`].
    pub max_wave_depth: u32,
    /// Initial entity arena capacity, pre-allocated at construction.
    pub arena_initial_capacity: usize,
    /// Optional hard ceiling on concurrently live entities.
    pub arena_max_capacity: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_wave_depth: 16,
            arena_initial_capacity: 1024,
            arena_max_capacity: None,
        }
    }
}

/// Outcome of a single [`Pipeline::run_tick`] call.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// The tick number just executed.
    pub tick: u64,
    /// Ticks advanced by this call.
    pub delta_ticks: u32,
    /// Whether the tick was canceled partway through.
    pub canceled: bool,
    /// The Message phase's wave cascade outcome, when the embedding game's
    /// message phase implementation chooses to report it back through a
    /// shared slot; `None` if it did not.
    pub wave_result: Option<WaveResult>,
}

/// Orchestrates one fixed-order tick over a caller-supplied set of phases.
///
/// `Pipeline` itself holds no game state — it owns only the configuration,
/// the tick counter, and the composed phase tree built by
/// [`PipelineBuilder`].
pub struct Pipeline {
    config: SimConfig,
    root: SerialGroup,
    tick_counter: AtomicU64,
}

impl Pipeline {
    /// Creates a pipeline over `root` (typically built via
    /// [`PipelineBuilder::build`]) with the given `config`.
    #[must_use]
    pub fn new(config: SimConfig, root: SerialGroup) -> Self {
        Self {
            config,
            root,
            tick_counter: AtomicU64::new(0),
        }
    }

    /// This pipeline's configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs one tick, advancing the internal tick counter by `delta_ticks`
    /// and executing every phase in canonical order. Always returns a
    /// [`TickReport`]; phase errors are logged and recorded rather than
    /// aborting the tick early (Cleanup must always run).
    #[instrument(skip(self))]
    pub fn run_tick(&self, delta_ticks: u32) -> TickReport {
        let tick = self.tick_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancelToken::new();
        let ctx = SystemContext {
            delta_ticks,
            current_tick: tick,
            cancel: cancel.clone(),
        };
        debug!(tick, delta_ticks, "running tick");
        if let Err(err) = self.root.run(&ctx) {
            warn!(tick, error = %err, "root phase group returned an error");
        }
        TickReport {
            tick,
            delta_ticks,
            canceled: cancel.is_canceled(),
            wave_result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct RecordingPhase {
        name: &'static str,
        calls: Arc<AtomicU32>,
    }

    impl Phase for RecordingPhase {
        fn name(&self) -> &'static str {
            self.name
        }
        fn run(&self, _ctx: &SystemContext) -> Result<(), PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn recording(name: &'static str, calls: &Arc<AtomicU32>) -> Box<dyn Phase> {
        Box::new(RecordingPhase {
            name,
            calls: calls.clone(),
        })
    }

    #[test]
    fn serial_group_runs_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        struct OrderPhase {
            name: &'static str,
            order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        }
        impl Phase for OrderPhase {
            fn name(&self) -> &'static str {
                self.name
            }
            fn run(&self, _ctx: &SystemContext) -> Result<(), PipelineError> {
                self.order.lock().unwrap().push(self.name);
                Ok(())
            }
        }
        let group = SerialGroup::new(
            "g",
            vec![
                Box::new(OrderPhase { name: "a", order: order.clone() }),
                Box::new(OrderPhase { name: "b", order: order.clone() }),
            ],
        );
        let ctx = SystemContext {
            delta_ticks: 1,
            current_tick: 1,
            cancel: CancelToken::new(),
        };
        group.run(&ctx).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn cancellation_stops_remaining_serial_phases() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancelToken::new();
        cancel.cancel();
        let group = SerialGroup::new("g", vec![recording("a", &calls), recording("b", &calls)]);
        let ctx = SystemContext {
            delta_ticks: 1,
            current_tick: 1,
            cancel,
        };
        group.run(&ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pipeline_run_tick_advances_counter() {
        let calls = Arc::new(AtomicU32::new(0));
        let root = SerialGroup::new("tick", vec![recording("phase", &calls)]);
        let pipeline = Pipeline::new(SimConfig::default(), root);
        let report1 = pipeline.run_tick(1);
        let report2 = pipeline.run_tick(1);
        assert_eq!(report1.tick, 1);
        assert_eq!(report2.tick, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn parallel_group_runs_all_children() {
        let calls = Arc::new(AtomicU32::new(0));
        let group = ParallelGroup::new("p", vec![recording("a", &calls), recording("b", &calls)]);
        let ctx = SystemContext {
            delta_ticks: 1,
            current_tick: 1,
            cancel: CancelToken::new(),
        };
        group.run(&ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
