//! Entity context registry: owns each entity's action state machine and
//! tracks deterministic iteration order plus deferred deletion.

use std::sync::Mutex;

use thiserror::Error;

use crate::arena::{ArenaError, HandleArena};
use crate::category::CategorySet;
use crate::ident::{AnyHandle, Handle};
use crate::judgment::Judgment;
use crate::ports::CollisionVolume;
use crate::state_machine::ActionStateMachine;

/// Errors surfaced by [`EntityContextRegistry`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The underlying arena rejected the operation.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// `handle` does not currently name a live entity in this registry.
    #[error("entity {index} (generation {generation}) is not registered")]
    NotFound {
        /// Slot index named by the handle.
        index: u32,
        /// Generation carried by the handle.
        generation: u32,
    },
}

/// Per-entity bookkeeping owned by the registry: its action state machine,
/// its candidate judgments, and whatever collision/deletion bookkeeping the
/// other phases need.
///
/// `Input` and `Ctx` mirror [`Judgment`]'s own type parameters — they are
/// the embedding game's input-state and per-entity condition-context types,
/// threaded through so a context can hold the judgments the Decision phase
/// evaluates for this entity.
pub struct EntityContext<Input, Cat, Ctx> {
    /// This entity's own handle. `None` only in the brief window between
    /// slot allocation and [`EntityContextRegistry::spawn`] writing the
    /// handle back; no caller observes that state.
    pub handle: Option<AnyHandle>,
    /// This entity's action state machine.
    pub state_machine: ActionStateMachine<Cat>,
    /// Collision volumes currently overlapping this entity, populated by the
    /// Collision phase and consulted by Reconciliation. Empty outside a
    /// tick's Collision/Reconciliation window unless the embedding game
    /// chooses to retain them longer.
    pub collision_volumes: Vec<CollisionVolume>,
    /// Candidate actions the Decision phase evaluates for this entity. The
    /// registry never constructs or interprets these itself — the embedding
    /// game hands them in via [`EntityContextRegistry::set_judgments`], and
    /// they stay owned here (rather than behind a shared reference) because
    /// stateful triggers ([`crate::trigger::Hold`], [`crate::trigger::Charge`],
    /// [`crate::trigger::Mash`], [`crate::trigger::Command`]) need per-entity
    /// mutable state, not a definition shared byte-for-byte across entities.
    pub judgments: Vec<Judgment<Input, Cat, Ctx>>,
    /// Backref to whatever spawned this entity (its owning unit, or the
    /// effect/projectile that created it), if any.
    pub spawner: Option<AnyHandle>,
    /// Whether this entity currently participates in ticking. Distinct from
    /// registry membership: an entity can be registered but temporarily
    /// inactive without being marked for deletion.
    pub is_active: bool,
    /// Set by [`EntityContextRegistry::mark_for_deletion`]; the Cleanup
    /// phase's sweep consults the registry's own pending list rather than
    /// this flag, but embedding-game code that holds a context reference can
    /// check it directly without going back through the registry.
    pub is_marked_for_deletion: bool,
}

impl<Input, Cat: CategorySet, Ctx> EntityContext<Input, Cat, Ctx> {
    fn new() -> Self {
        Self {
            handle: None,
            state_machine: ActionStateMachine::new(),
            collision_volumes: Vec::new(),
            judgments: Vec::new(),
            spawner: None,
            is_active: true,
            is_marked_for_deletion: false,
        }
    }
}

/// Owns every live entity's [`EntityContext`] and exposes deterministic,
/// insertion-ordered iteration over active entities plus a deferred
/// deletion queue consumed by the Cleanup phase.
///
/// Mutation (spawn, mark-for-deletion, sweep) is serialized by a single
/// internal mutex over the ordering lists; per-entity context access goes
/// through the arena's own lock, matching the single-mutator model used
/// throughout this crate.
pub struct EntityContextRegistry<Input, Cat, Ctx> {
    arena: HandleArena<EntityContext<Input, Cat, Ctx>>,
    active_order: Mutex<Vec<AnyHandle>>,
    pending_deletion: Mutex<Vec<AnyHandle>>,
}

impl<Input, Cat: CategorySet, Ctx> EntityContextRegistry<Input, Cat, Ctx> {
    /// Creates an empty registry with no capacity ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: HandleArena::new(),
            active_order: Mutex::new(Vec::new()),
            pending_deletion: Mutex::new(Vec::new()),
        }
    }

    /// Registers a fresh entity, appending it to the end of the active
    /// iteration order.
    ///
    /// # Errors
    /// Returns [`ArenaError::ArenaFull`] (wrapped) if the registry was
    /// constructed with a capacity ceiling that has been reached.
    pub fn spawn(&self) -> Result<AnyHandle, RegistryError> {
        let handle = self.arena.allocate(EntityContext::new())?;
        let any = handle.erase();
        self.arena.with_mut(handle, |ctx| ctx.handle = Some(any))?;
        self.active_order.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(any);
        Ok(any)
    }

    /// Runs `f` with a mutable reference to `entity`'s context.
    ///
    /// # Errors
    /// Returns [`RegistryError::Arena`] if `entity` is stale or unknown.
    pub fn with_context<R>(
        &self,
        entity: AnyHandle,
        f: impl FnOnce(&mut EntityContext<Input, Cat, Ctx>) -> R,
    ) -> Result<R, RegistryError> {
        let typed = Handle::<EntityContext<Input, Cat, Ctx>>::new(entity.index(), entity.generation());
        Ok(self.arena.with_mut(typed, f)?)
    }

    /// Replaces `entity`'s judgment array, as handed in by the embedding
    /// game (typically once at spawn time, built from that entity's
    /// archetype).
    ///
    /// # Errors
    /// Returns [`RegistryError::Arena`] if `entity` is stale or unknown.
    pub fn set_judgments(
        &self,
        entity: AnyHandle,
        judgments: Vec<Judgment<Input, Cat, Ctx>>,
    ) -> Result<(), RegistryError> {
        self.with_context(entity, |ctx| ctx.judgments = judgments)
    }

    /// Entities currently registered, in stable insertion order. Entities
    /// marked for deletion remain in this list until
    /// [`Self::sweep_pending_deletions`] runs.
    #[must_use]
    pub fn active_entities(&self) -> Vec<AnyHandle> {
        self.active_order.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Marks `entity` for deletion at the next Cleanup sweep. Marking the
    /// same entity twice is a no-op past the first call; marking an
    /// already-freed or unknown entity is also a no-op.
    pub fn mark_for_deletion(&self, entity: AnyHandle) {
        let marked = self.with_context(entity, |ctx| {
            ctx.is_marked_for_deletion = true;
            ctx.is_active = false;
        });
        if marked.is_err() {
            return;
        }
        let mut pending = self.pending_deletion.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !pending.contains(&entity) {
            pending.push(entity);
        }
    }

    /// Entities currently marked for deletion, in the order they were
    /// marked.
    #[must_use]
    pub fn pending_deletions(&self) -> Vec<AnyHandle> {
        self.pending_deletion.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Frees every entity marked for deletion and removes it from the
    /// active order, in the order they were marked. Returns the entities
    /// actually swept (already-freed entries are skipped silently).
    pub fn sweep_pending_deletions(&self) -> Vec<AnyHandle> {
        let pending = std::mem::take(&mut *self.pending_deletion.lock().unwrap_or_else(std::sync::PoisonError::into_inner));
        let mut swept = Vec::with_capacity(pending.len());
        for entity in pending {
            let typed = Handle::<EntityContext<Input, Cat, Ctx>>::new(entity.index(), entity.generation());
            if self.arena.free(typed) {
                swept.push(entity);
            }
        }
        if !swept.is_empty() {
            let mut active = self.active_order.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            active.retain(|h| !swept.contains(h));
        }
        swept
    }

    /// Number of currently active (non-swept) entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the registry currently has no active entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl<Input, Cat: CategorySet, Ctx> Default for EntityContextRegistry<Input, Cat, Ctx> {
    fn default() -> Self {
        Self::new()
    }
}
