//! Port traits: the seams through which the runtime borrows game-owned
//! state without depending on any particular game's types.
//!
//! Every subsystem that needs to read or mutate world state outside its own
//! bookkeeping takes one of these traits as a generic bound rather than a
//! concrete type, so the same `echo-sim-core` crate serves any game that
//! implements the small surface each port asks for.

use crate::ident::AnyHandle;

/// Deterministic 3D vector used for positions and impulses.
///
/// Arithmetic is `f32`-exact and componentwise; the runtime never performs
/// trigonometry or normalization on these, leaving that to the embedding
/// game's own math layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec3 {
    data: [f32; 3],
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { data: [x, y, z] }
    }

    /// Returns the components as an array.
    #[must_use]
    pub fn to_array(self) -> [f32; 3] {
        self.data
    }

    /// Componentwise addition.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.data[0] + other.data[0],
            self.data[1] + other.data[1],
            self.data[2] + other.data[2],
        )
    }

    /// Componentwise subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.data[0] - other.data[0],
            self.data[1] - other.data[1],
            self.data[2] - other.data[2],
        )
    }

    /// Scales every component by `scalar`.
    #[must_use]
    pub fn scale(&self, scalar: f32) -> Self {
        Self::new(
            self.data[0] * scalar,
            self.data[1] * scalar,
            self.data[2] * scalar,
        )
    }
}

/// One collision shape currently active for an entity, recorded by the
/// Collision phase onto [`crate::registry::EntityContext::collision_volumes`]
/// and consulted by Reconciliation when resolving push-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionVolume {
    /// Center of the volume in world space.
    pub center: Vec3,
    /// Radius of the volume, treated as a sphere; the embedding game's own
    /// collision system is the source of truth for any finer shape detail.
    pub radius: f32,
}

/// One overlapping pair reported by a [`CollisionSource`] during the
/// Collision phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    /// First entity in the pair. Pair ordering has no semantic meaning; a
    /// source must not report both `(a, b)` and `(b, a)` for the same
    /// overlap.
    pub first: AnyHandle,
    /// Second entity in the pair.
    pub second: AnyHandle,
    /// Overlap depth along the contact normal, if the embedding collision
    /// system tracks it; used by reconciliation for push-out.
    pub penetration: f32,
    /// Contact normal pointing from `second` toward `first`.
    pub normal: Vec3,
}

/// Supplies the set of overlapping entity pairs for the current tick.
///
/// Implementations typically wrap a broad-phase + narrow-phase collision
/// system owned by the embedding game; the runtime treats the result as a
/// flat, unordered list and does not deduplicate it itself.
pub trait CollisionSource {
    /// Returns every overlapping pair detected this tick.
    fn collisions(&self) -> Vec<CollisionPair>;
}

/// Destination for messages emitted in response to collisions, consumed by
/// the Message phase's wave processor.
pub trait CollisionMessageEmitter<Msg> {
    /// Converts `pair` into zero or more messages enqueued for delivery.
    fn emit(&self, pair: &CollisionPair) -> Vec<Msg>;
}

/// Read-only access to an entity's current raw input state, consulted by
/// [`crate::trigger::Trigger`] implementations during Decision.
pub trait InputProvider<Input> {
    /// Returns the input state for `entity`, or `None` if it has no input
    /// source (e.g. an AI-controlled entity with no player binding).
    fn input_for(&self, entity: AnyHandle) -> Option<&Input>;
}

/// Read-only access to whatever per-entity state a game's action conditions
/// need to evaluate (stamina, cooldowns, facing, etc), opaque to the
/// runtime itself.
pub trait CharacterStateProvider<State> {
    /// Returns the character state for `entity`.
    fn state_for(&self, entity: AnyHandle) -> Option<&State>;
}

/// Read/write access to an entity's world-space position, consulted by
/// reconciliation for push-out resolution.
pub trait EntityPositionProvider {
    /// Current position of `entity`.
    fn position(&self, entity: AnyHandle) -> Option<Vec3>;
    /// Applies `delta` to `entity`'s position.
    fn translate(&mut self, entity: AnyHandle, delta: Vec3);
}

/// Read access to an entity's full transform, for systems that need more
/// than position (e.g. applying root motion along a facing direction).
pub trait TransformAccessor {
    /// Current position of `entity`.
    fn position(&self, entity: AnyHandle) -> Option<Vec3>;
    /// Current forward-facing direction of `entity`, assumed normalized.
    fn facing(&self, entity: AnyHandle) -> Option<Vec3>;
}

/// Produces fresh [`crate::action::ActionDefinition`] values by id, used by
/// message handlers that start actions reactively (e.g. a hit reaction
/// triggered by a collision message).
pub trait ActionFactory<Cat> {
    /// Looks up the action definition registered under `action_id`.
    fn create(&self, action_id: &'static str) -> Option<crate::action::ActionDefinition<Cat>>;
}

/// Creates new entities in response to simulation events (e.g. spawning a
/// projectile from an attack's hitbox window).
pub trait EntitySpawner<Spec> {
    /// Spawns a new entity from `spec`, returning its handle.
    fn spawn(&mut self, spec: Spec) -> AnyHandle;
}

/// Read access to an entity's coarse type/archetype, used by category and
/// condition logic that branches on what kind of entity it is.
pub trait EntityTypeAccessor<Kind> {
    /// The archetype of `entity`, if it still exists.
    fn kind_of(&self, entity: AnyHandle) -> Option<Kind>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_add_sub_are_inverse() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, -1.0, 2.0);
        let sum = a.add(&b);
        let back = sum.sub(&b);
        assert_eq!(back.to_array(), a.to_array());
    }

    #[test]
    fn vec3_scale_zero_yields_zero() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(a.scale(0.0).to_array(), Vec3::ZERO.to_array());
    }
}
