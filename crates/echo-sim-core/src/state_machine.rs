//! Per-entity action execution: one running action per category, advanced
//! and retired through explicit lifecycle hooks.

use crate::action::{ActionDefinition, ExecutableAction};
use crate::category::CategorySet;

/// Lifecycle callbacks invoked as an action starts, advances, and finishes.
///
/// Hooks receive `ctx` so the embedding game can apply motion, trigger
/// effects, or mutate world state without the state machine itself knowing
/// anything about the game's types.
pub trait ActionExecutorHooks<Cat, Ctx> {
    /// Called once, synchronously, when an action begins running (including
    /// one that preempts a still-running action via cancel).
    fn on_enter(&mut self, action: &ExecutableAction<Cat>, ctx: &mut Ctx);

    /// Called once per tick with the action's state *after* `elapsed_frames`
    /// has advanced, for every tick the action is running — including the
    /// tick it completes on.
    fn on_update(&mut self, action: &ExecutableAction<Cat>, ctx: &mut Ctx);

    /// Called once, synchronously, when an action stops running, whether by
    /// natural completion or by being canceled into another action.
    fn on_exit(&mut self, action: &ExecutableAction<Cat>, ctx: &mut Ctx);
}

/// Why [`ActionStateMachine::start_action`] did or did not replace the
/// action currently running in the target category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// No action was running in that category; the new one started
    /// unconditionally.
    StartedFromIdle,
    /// An action was running in that category and in its cancel window; it
    /// was exited and the new one started.
    StartedByCancel,
    /// An action was running in that category and not cancelable; the
    /// request was rejected.
    RejectedNotCancelable,
}

/// Drives one [`ExecutableAction`] per category for a single entity.
///
/// # Determinism
/// Categories are tracked in exactly the order [`CategorySet::all`] lists
/// them; [`Self::tick`] always walks that same fixed order rather than
/// insertion order or a hash map's iteration order, so two entities with
/// the same categories running produce byte-identical hook call orders.
pub struct ActionStateMachine<Cat> {
    slots: Vec<(Cat, Option<ExecutableAction<Cat>>)>,
}

impl<Cat: CategorySet> ActionStateMachine<Cat> {
    /// Creates a state machine with no action running in any category.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Cat::all().iter().map(|cat| (*cat, None)).collect(),
        }
    }

    fn slot_index(&self, category: Cat) -> Option<usize> {
        self.slots.iter().position(|(cat, _)| *cat == category)
    }

    /// The currently running action in `category`, if any.
    #[must_use]
    pub fn current(&self, category: Cat) -> Option<&ExecutableAction<Cat>> {
        self.slot_index(category)
            .and_then(|index| self.slots[index].1.as_ref())
    }

    /// Whether an action is currently running in `category`.
    #[must_use]
    pub fn is_running(&self, category: Cat) -> bool {
        self.current(category).is_some()
    }

    /// Whether the action running in `category`, if any, is in its cancel
    /// window.
    #[must_use]
    pub fn can_cancel(&self, category: Cat) -> bool {
        self.current(category).is_some_and(ExecutableAction::can_cancel)
    }

    /// Every category with an action currently running, in declaration
    /// order.
    pub fn running_categories(&self) -> impl Iterator<Item = Cat> + '_ {
        self.slots.iter().filter(|(_, action)| action.is_some()).map(|(cat, _)| *cat)
    }

    /// Starts `def` in its own category, running `hooks.on_exit` on any
    /// action already running in that category first.
    ///
    /// Starting from idle always succeeds. Starting over a running action in
    /// the same category succeeds only if that action is currently in its
    /// cancel window; otherwise the request is rejected and the running
    /// action is left untouched. Actions in other categories are never
    /// affected by this call — that is what lets two non-exclusive
    /// categories run simultaneously.
    pub fn start_action<Ctx>(
        &mut self,
        def: ActionDefinition<Cat>,
        hooks: &mut impl ActionExecutorHooks<Cat, Ctx>,
        ctx: &mut Ctx,
    ) -> StartOutcome {
        let category = def.category;
        let index = self.slot_index(category).unwrap_or_else(|| {
            unreachable!(
                "action category not present in CategorySet::all(); this is a programmer error in the embedding game's category enumeration"
            )
        });

        let outcome = match &self.slots[index].1 {
            None => StartOutcome::StartedFromIdle,
            Some(running) if running.can_cancel() => StartOutcome::StartedByCancel,
            Some(_) => return StartOutcome::RejectedNotCancelable,
        };
        if let Some(exiting) = self.slots[index].1.take() {
            hooks.on_exit(&exiting, ctx);
        }
        let fresh = ExecutableAction::new(def);
        hooks.on_enter(&fresh, ctx);
        self.slots[index].1 = Some(fresh);
        outcome
    }

    /// Advances every running action by `delta_ticks`, walking categories in
    /// declaration order, in two passes per category:
    ///
    /// 1. Advance `elapsed_frames` and invoke `on_update` with the
    ///    post-advance state.
    /// 2. If the action is now complete, invoke `on_exit` and clear it.
    ///
    /// Splitting into two passes means `on_update` always sees a
    /// still-installed action (so hook code can query [`Self::current`]
    /// consistently) even on the tick the action finishes, and collecting
    /// completions before clearing avoids mutating `slots` while iterating
    /// it.
    pub fn tick<Ctx>(
        &mut self,
        delta_ticks: u32,
        hooks: &mut impl ActionExecutorHooks<Cat, Ctx>,
        ctx: &mut Ctx,
    ) {
        for (_, slot) in &mut self.slots {
            let Some(action) = slot else {
                continue;
            };
            action.advance(delta_ticks);
            hooks.on_update(action, ctx);
        }

        for (_, slot) in &mut self.slots {
            if slot.as_ref().is_some_and(ExecutableAction::is_complete) {
                if let Some(finished) = slot.take() {
                    hooks.on_exit(&finished, ctx);
                }
            }
        }
    }
}

impl<Cat: CategorySet> Default for ActionStateMachine<Cat> {
    fn default() -> Self {
        Self::new()
    }
}
