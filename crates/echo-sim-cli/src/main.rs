//! Headless demo runner for `echo-sim-core`.
//!
//! Spawns a handful of entities, wires the six canonical phases around a
//! shared [`EntityContextRegistry`], and drives the pipeline for a fixed
//! number of ticks so the crate's ordering and lifecycle guarantees can be
//! observed in logs rather than only in unit tests.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use echo_sim_core::category::IdentityOnlyRules;
use echo_sim_core::pipeline::{
    CleanupPhase, CollisionPhase, DecisionPhase, ExecutionPhase, MessagePhase, PipelineBuilder,
    ReconciliationPhase,
};
use echo_sim_core::{
    ActionDefinition, ActionExecutorHooks, AnyHandle, CategoryRules, CategorySet,
    EntityContextRegistry, ExecutableAction, FrameWindow, Phase, Pipeline, PipelineError,
    SimConfig, StartOutcome, SystemContext,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of ticks to run before exiting.
    #[arg(long, default_value_t = 20)]
    ticks: u64,

    /// Number of demo entities to spawn.
    #[arg(long, default_value_t = 3)]
    entities: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemoCat {
    Attack,
}

impl CategorySet for DemoCat {
    fn all() -> &'static [Self] {
        &[Self::Attack]
    }
}

/// Logs each lifecycle hook call; this crate owns no rendering or motion
/// layer of its own, so a demo's `Ctx` is just `()`.
struct LoggingHooks;

impl ActionExecutorHooks<DemoCat, ()> for LoggingHooks {
    fn on_enter(&mut self, action: &ExecutableAction<DemoCat>, _ctx: &mut ()) {
        info!(action = action.definition().action_id, "action entered");
    }

    fn on_update(&mut self, action: &ExecutableAction<DemoCat>, _ctx: &mut ()) {
        debug!(
            action = action.definition().action_id,
            elapsed = action.elapsed_frames(),
            "action advanced"
        );
    }

    fn on_exit(&mut self, action: &ExecutableAction<DemoCat>, _ctx: &mut ()) {
        info!(action = action.definition().action_id, "action exited");
    }
}

struct World {
    registry: EntityContextRegistry<(), DemoCat, ()>,
}

/// A phase with no work of its own, used to fill canonical slots this demo
/// does not exercise (collision, message delivery, reconciliation).
struct NoopPhase(&'static str);

impl Phase for NoopPhase {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(&self, _ctx: &SystemContext) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Starts `attack` on every demo entity not already occupying that category,
/// standing in for a real selector-driven Decision phase.
struct DecisionDemo {
    world: Arc<World>,
    entities: Vec<AnyHandle>,
    attack: ActionDefinition<DemoCat>,
}

impl Phase for DecisionDemo {
    fn name(&self) -> &'static str {
        "decision-demo"
    }

    fn run(&self, _ctx: &SystemContext) -> Result<(), PipelineError> {
        for &entity in &self.entities {
            self.world.registry.with_context(entity, |ec| {
                if !ec.state_machine.is_running(DemoCat::Attack) {
                    let outcome = ec.state_machine.start_action(
                        self.attack.clone(),
                        &mut LoggingHooks,
                        &mut (),
                    );
                    debug_assert_eq!(outcome, StartOutcome::StartedFromIdle);
                }
            })?;
        }
        Ok(())
    }
}

/// Advances every demo entity's state machine by `delta_ticks`.
struct ExecutionDemo {
    world: Arc<World>,
    entities: Vec<AnyHandle>,
}

impl Phase for ExecutionDemo {
    fn name(&self) -> &'static str {
        "execution-demo"
    }

    fn run(&self, ctx: &SystemContext) -> Result<(), PipelineError> {
        for &entity in &self.entities {
            self.world.registry.with_context(entity, |ec| {
                ec.state_machine.tick(ctx.delta_ticks, &mut LoggingHooks, &mut ());
            })?;
        }
        Ok(())
    }
}

/// Sweeps whatever this tick marked for deletion. No demo phase ever marks
/// an entity, so this only exercises the no-op path.
struct CleanupDemo {
    world: Arc<World>,
}

impl Phase for CleanupDemo {
    fn name(&self) -> &'static str {
        "cleanup-demo"
    }

    fn run(&self, _ctx: &SystemContext) -> Result<(), PipelineError> {
        let swept = self.world.registry.sweep_pending_deletions();
        if !swept.is_empty() {
            info!(count = swept.len(), "swept deleted entities");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let registry: EntityContextRegistry<(), DemoCat, ()> = EntityContextRegistry::new();
    let mut entities = Vec::with_capacity(args.entities);
    for _ in 0..args.entities {
        entities.push(registry.spawn()?);
    }
    info!(count = entities.len(), "spawned demo entities");

    // Unused directly by this demo (no two categories compete) but
    // constructed the way a real game would configure cross-category
    // exclusivity before wiring a selector in place of `DecisionDemo`.
    let _category_rules: Box<dyn CategoryRules<DemoCat> + Send + Sync> = Box::new(IdentityOnlyRules);

    let world = Arc::new(World { registry });

    let attack = ActionDefinition {
        action_id: "demo/attack",
        category: DemoCat::Attack,
        total_frames: 5,
        cancel_window: FrameWindow::new(3, 5),
        hitbox_window: None,
        invincible_window: None,
        motion_ref: None,
    };

    let root = PipelineBuilder::new(
        CollisionPhase::new(Box::new(NoopPhase("collision-demo"))),
        MessagePhase::new(Box::new(NoopPhase("message-demo"))),
        DecisionPhase::new(Box::new(DecisionDemo {
            world: Arc::clone(&world),
            entities: entities.clone(),
            attack,
        })),
        ExecutionPhase::new(Box::new(ExecutionDemo {
            world: Arc::clone(&world),
            entities: entities.clone(),
        })),
        ReconciliationPhase::new(Box::new(NoopPhase("reconciliation-demo"))),
        CleanupPhase::new(Box::new(CleanupDemo { world: Arc::clone(&world) })),
    )
    .build();

    let pipeline = Pipeline::new(SimConfig::default(), root);

    for _ in 0..args.ticks {
        let report = pipeline.run_tick(1);
        info!(tick = report.tick, canceled = report.canceled, "tick complete");
    }

    Ok(())
}
